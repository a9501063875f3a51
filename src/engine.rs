//! Boundary to the packet-level simulation engine.
//!
//! The routing core never moves packets itself. It describes links,
//! forwarding entries and traffic endpoints to an [`Engine`], lets it run,
//! and afterwards reads the engine's flow counters. [`des::DesEngine`] is
//! the bundled discrete-event implementation.

pub mod des;
#[cfg(test)]
pub(crate) mod testing;
mod time;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;

use crate::NodeId;
use crate::routing::HostRoute;

pub use self::time::SimTime;
pub(crate) use self::time::ScheduledEvent;

/// Engine-wide handle of one direction of a point-to-point link.
pub type DeviceId = usize;

/// Flow identifier assigned by the engine's classifier, 1-based.
pub type FlowId = u32;

/// Parameters of a point-to-point link between node `a` and node `b`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub a: NodeId,
    pub b: NodeId,
    pub a_address: Ipv4Addr,
    pub b_address: Ipv4Addr,
    pub data_rate_bps: u64,
    pub delay: Duration,
    /// Per-packet receive loss, only applied when strictly between 0 and 1.
    pub packet_loss_rate: f64,
    pub queue_packets: usize,
}

/// Where one end of a channel landed on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub device: DeviceId,
    pub if_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBinding {
    pub a: Attachment,
    pub b: Attachment,
}

/// Per-link packet notifications.
///
/// The engine calls `on_transmit` when the `a` side hands a packet to its
/// device and `on_receive` when the `b` side accepts one off the wire.
pub trait LinkObserver {
    fn on_transmit(&self);
    fn on_receive(&self);
}

/// Read-only view of device queues handed to periodic tasks.
pub trait QueueProbe {
    /// Packets currently buffered at `device`, zero for unknown devices.
    fn queue_depth(&self, device: DeviceId) -> usize;
}

pub type PeriodicTask = Box<dyn FnMut(SimTime, &dyn QueueProbe)>;

/// Rate-limited on/off sender, active within `[start, stop)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnOffSpec {
    pub destination: SocketAddrV4,
    pub data_rate_bps: u64,
    pub packet_size: u32,
    pub on_mean: Duration,
    pub off_mean: Duration,
    pub start: SimTime,
    pub stop: SimTime,
}

/// Raw counters of one classified flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFlowStats {
    pub flow_id: FlowId,
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub first_tx: SimTime,
    pub last_rx: SimTime,
    pub delay_sum: Duration,
    pub jitter_sum: Duration,
}

pub trait Engine {
    /// Creates nodes `0..count`.
    fn create_nodes(&mut self, count: usize);

    fn connect(
        &mut self,
        spec: &ChannelSpec,
        observer: Rc<dyn LinkObserver>,
    ) -> Result<ChannelBinding>;

    /// Installs or overwrites the host route for `route.destination` at `node`.
    fn add_host_route(&mut self, node: NodeId, route: &HostRoute) -> Result<()>;

    fn install_sink(
        &mut self,
        node: NodeId,
        port: u16,
        start: SimTime,
        stop: SimTime,
    ) -> Result<()>;

    fn install_on_off(&mut self, node: NodeId, spec: OnOffSpec) -> Result<()>;

    /// Runs `task` every `interval`, first at `interval`, until the run stops.
    fn schedule_periodic(&mut self, interval: Duration, task: PeriodicTask);

    fn run(&mut self, stop: SimTime);

    fn flow_stats(&self) -> Vec<RawFlowStats>;
}
