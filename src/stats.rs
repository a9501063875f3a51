//! Link and flow statistics.
//!
//! Per-link counters are filled during the run through [`LinkCounters`]
//! handles the engine holds; everything else is derived after the run from
//! those counters and the engine's flow classifier.

pub mod metrics;
mod queue_monitor;
mod summary;

use serde::Serialize;
use std::cell::Cell;
use std::io::Write;
use std::net::SocketAddrV4;
use std::rc::Rc;

use crate::engine::{DeviceId, FlowId, LinkObserver, RawFlowStats};
use crate::network::Topology;

pub use self::queue_monitor::QueueSampler;
pub use self::summary::RunSummary;

/// Transmit/receive counters of one link in its configured direction.
#[derive(Debug, Default)]
pub struct LinkCounters {
    tx: Cell<u64>,
    rx: Cell<u64>,
}

impl LinkCounters {
    pub fn tx_packets(&self) -> u64 {
        self.tx.get()
    }

    pub fn rx_packets(&self) -> u64 {
        self.rx.get()
    }
}

impl LinkObserver for LinkCounters {
    fn on_transmit(&self) {
        self.tx.set(self.tx.get() + 1);
    }

    fn on_receive(&self) {
        self.rx.set(self.rx.get() + 1);
    }
}

#[derive(Debug)]
struct MonitoredLink {
    src_name: String,
    dst_name: String,
    counters: Rc<LinkCounters>,
}

/// One link direction whose device queue is sampled during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredQueue {
    pub src_name: String,
    pub dst_name: String,
    pub device: DeviceId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReport {
    pub src_name: String,
    pub dst_name: String,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub loss_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub flow_id: FlowId,
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
    pub src_name: String,
    pub dst_name: String,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub rx_bytes: u64,
    pub throughput_mbps: f64,
    pub mean_delay_ms: f64,
    pub mean_jitter_ms: f64,
    pub loss_rate: f64,
}

impl FlowReport {
    pub fn from_raw(raw: &RawFlowStats, src_name: &str, dst_name: &str) -> Self {
        let loss = metrics::loss(raw.tx_packets, raw.rx_packets);
        Self {
            flow_id: raw.flow_id,
            source: raw.source,
            destination: raw.destination,
            src_name: src_name.to_string(),
            dst_name: dst_name.to_string(),
            tx_packets: raw.tx_packets,
            rx_packets: raw.rx_packets,
            lost_packets: loss.lost,
            rx_bytes: raw.rx_bytes,
            throughput_mbps: metrics::throughput_mbps(
                raw.rx_packets,
                raw.rx_bytes,
                raw.first_tx,
                raw.last_rx,
            ),
            mean_delay_ms: metrics::mean(raw.delay_sum.as_secs_f64() * 1e3, raw.rx_packets),
            mean_jitter_ms: metrics::mean(raw.jitter_sum.as_secs_f64() * 1e3, raw.rx_packets),
            loss_rate: loss.rate,
        }
    }
}

#[derive(Debug, Default)]
pub struct StatisticsCollector {
    links: Vec<MonitoredLink>,
    queues: Vec<MonitoredQueue>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a link and returns the handle the engine reports to.
    pub fn register_link(&mut self, src_name: &str, dst_name: &str) -> Rc<LinkCounters> {
        let counters = Rc::new(LinkCounters::default());
        self.links.push(MonitoredLink {
            src_name: src_name.to_string(),
            dst_name: dst_name.to_string(),
            counters: Rc::clone(&counters),
        });
        counters
    }

    pub fn monitor_queue(&mut self, src_name: &str, dst_name: &str, device: DeviceId) {
        self.queues.push(MonitoredQueue {
            src_name: src_name.to_string(),
            dst_name: dst_name.to_string(),
            device,
        });
    }

    pub fn monitored_directions(&self) -> usize {
        self.queues.len()
    }

    /// Sampler over every monitored direction, writing rows to `writer`.
    pub fn queue_sampler<W: Write>(&self, writer: W) -> std::io::Result<QueueSampler<W>> {
        QueueSampler::new(self.queues.clone(), writer)
    }

    /// One report per registered link, in registration order.
    pub fn link_reports(&self) -> Vec<LinkReport> {
        self.links
            .iter()
            .map(|link| {
                let tx = link.counters.tx_packets();
                let rx = link.counters.rx_packets();
                let loss = metrics::loss(tx, rx);
                LinkReport {
                    src_name: link.src_name.clone(),
                    dst_name: link.dst_name.clone(),
                    tx_packets: tx,
                    rx_packets: rx,
                    lost_packets: loss.lost,
                    loss_rate: loss.rate,
                }
            })
            .collect()
    }

    /// Flow reports with endpoint names resolved through `topology`.
    pub fn flow_reports(&self, flows: &[RawFlowStats], topology: &Topology) -> Vec<FlowReport> {
        flows
            .iter()
            .map(|raw| {
                FlowReport::from_raw(
                    raw,
                    topology.name_for_address(*raw.source.ip()),
                    topology.name_for_address(*raw.destination.ip()),
                )
            })
            .collect()
    }
}
