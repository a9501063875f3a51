use crate::engine::SimTime;

/// Lost packets and the loss ratio for one tx/rx counter pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loss {
    pub lost: u64,
    /// `lost / tx`, zero when nothing was transmitted.
    pub rate: f64,
}

/// More packets received than sent (duplicates, counter skew) counts as no loss.
pub fn loss(tx_packets: u64, rx_packets: u64) -> Loss {
    let lost = tx_packets.saturating_sub(rx_packets);
    let rate = if tx_packets > 0 {
        lost as f64 / tx_packets as f64
    } else {
        0.0
    };
    Loss { lost, rate }
}

/// Goodput in Mbps between the first transmission and the last reception.
pub fn throughput_mbps(rx_packets: u64, rx_bytes: u64, first_tx: SimTime, last_rx: SimTime) -> f64 {
    if rx_packets == 0 {
        return 0.0;
    }
    let duration = last_rx.as_secs_f64() - first_tx.as_secs_f64();
    if duration <= 0.0 {
        return 0.0;
    }
    rx_bytes as f64 * 8.0 / duration / 1e6
}

/// Mean of a cumulative sum over `count` samples, zero when there are none.
pub fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}
