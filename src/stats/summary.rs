use std::fmt;

use crate::stats::{FlowReport, metrics};

/// Aggregate view over all flows of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub flows: usize,
    /// Average of the per-flow mean delays, over flows that received anything.
    pub average_delay_ms: Option<f64>,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub loss_rate: f64,
    pub rx_megabytes: f64,
}

impl RunSummary {
    pub fn from_flows(flows: &[FlowReport]) -> Self {
        let delivering: Vec<f64> = flows
            .iter()
            .filter(|flow| flow.rx_packets > 0)
            .map(|flow| flow.mean_delay_ms)
            .collect();
        let average_delay_ms = if delivering.is_empty() {
            None
        } else {
            Some(delivering.iter().sum::<f64>() / delivering.len() as f64)
        };

        let tx_packets = flows.iter().map(|flow| flow.tx_packets).sum();
        let rx_packets = flows.iter().map(|flow| flow.rx_packets).sum();
        let rx_bytes: u64 = flows.iter().map(|flow| flow.rx_bytes).sum();

        Self {
            flows: flows.len(),
            average_delay_ms,
            tx_packets,
            rx_packets,
            loss_rate: metrics::loss(tx_packets, rx_packets).rate,
            rx_megabytes: rx_bytes as f64 / 1e6,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} flows", self.flows)?;
        if let Some(delay) = self.average_delay_ms {
            write!(f, ", average delay {delay:.2} ms")?;
        }
        write!(
            f,
            ", loss {:.2}% ({} of {} packets delivered), {:.2} MB received",
            self.loss_rate * 100.0,
            self.rx_packets,
            self.tx_packets,
            self.rx_megabytes
        )
    }
}
