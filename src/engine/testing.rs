use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Result, bail};

use super::{
    Attachment, ChannelBinding, ChannelSpec, DeviceId, Engine, LinkObserver, OnOffSpec,
    PeriodicTask, QueueProbe, RawFlowStats, SimTime,
};
use crate::NodeId;
use crate::routing::HostRoute;

/// Engine double that records every request and replays canned flows.
#[derive(Default)]
pub(crate) struct RecordingEngine {
    pub nodes: usize,
    pub channels: Vec<ChannelSpec>,
    pub observers: Vec<Rc<dyn LinkObserver>>,
    pub routes: Vec<(NodeId, HostRoute)>,
    pub sinks: Vec<(NodeId, u16, SimTime, SimTime)>,
    pub sources: Vec<(NodeId, OnOffSpec)>,
    pub periodic: Vec<(Duration, PeriodicTask)>,
    pub queue_depths: HashMap<DeviceId, usize>,
    pub flows: Vec<RawFlowStats>,
    pub stopped_at: Option<SimTime>,
    devices_per_node: HashMap<NodeId, u32>,
    next_device: DeviceId,
}

impl RecordingEngine {
    fn attach(&mut self, node: NodeId) -> Attachment {
        let count = self.devices_per_node.entry(node).or_insert(0);
        *count += 1;
        let device = self.next_device;
        self.next_device += 1;
        Attachment {
            device,
            if_index: *count,
        }
    }

    /// Routes currently installed at `node`, in installation order.
    pub fn routes_at(&self, node: NodeId) -> Vec<HostRoute> {
        self.routes
            .iter()
            .filter(|(n, _)| *n == node)
            .map(|(_, route)| *route)
            .collect()
    }
}

impl QueueProbe for RecordingEngine {
    fn queue_depth(&self, device: DeviceId) -> usize {
        self.queue_depths.get(&device).copied().unwrap_or(0)
    }
}

impl Engine for RecordingEngine {
    fn create_nodes(&mut self, count: usize) {
        self.nodes = count;
    }

    fn connect(
        &mut self,
        spec: &ChannelSpec,
        observer: Rc<dyn LinkObserver>,
    ) -> Result<ChannelBinding> {
        if spec.a >= self.nodes || spec.b >= self.nodes {
            bail!("unknown node in channel {} -> {}", spec.a, spec.b);
        }
        let a = self.attach(spec.a);
        let b = self.attach(spec.b);
        self.channels.push(spec.clone());
        self.observers.push(observer);
        Ok(ChannelBinding { a, b })
    }

    fn add_host_route(&mut self, node: NodeId, route: &HostRoute) -> Result<()> {
        self.routes.push((node, *route));
        Ok(())
    }

    fn install_sink(
        &mut self,
        node: NodeId,
        port: u16,
        start: SimTime,
        stop: SimTime,
    ) -> Result<()> {
        self.sinks.push((node, port, start, stop));
        Ok(())
    }

    fn install_on_off(&mut self, node: NodeId, spec: OnOffSpec) -> Result<()> {
        self.sources.push((node, spec));
        Ok(())
    }

    fn schedule_periodic(&mut self, interval: Duration, task: PeriodicTask) {
        self.periodic.push((interval, task));
    }

    /// Fires every periodic task on its cadence up to `stop`.
    fn run(&mut self, stop: SimTime) {
        let mut periodic = std::mem::take(&mut self.periodic);
        for (interval, task) in periodic.iter_mut() {
            let mut now = SimTime::ZERO.saturating_add(*interval);
            while now < stop && !interval.is_zero() {
                task(now, &*self);
                now = now.saturating_add(*interval);
            }
        }
        self.periodic = periodic;
        self.stopped_at = Some(stop);
    }

    fn flow_stats(&self) -> Vec<RawFlowStats> {
        self.flows.clone()
    }
}
