//! Single-threaded discrete-event engine.
//!
//! Models just enough of a packet network for the routing core: full-duplex
//! point-to-point links with serialisation and propagation delay, drop-tail
//! device queues, receive-side random loss, host-route forwarding, on/off
//! UDP-style sources and a five-tuple flow monitor.

use anyhow::{Result, bail};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::time::Duration;

use super::{
    Attachment, ChannelBinding, ChannelSpec, DeviceId, Engine, FlowId, LinkObserver, OnOffSpec,
    PeriodicTask, QueueProbe, RawFlowStats, ScheduledEvent, SimTime,
};
use crate::NodeId;
use crate::routing::HostRoute;

/// IPv4 + UDP headers carried by every packet.
const IP_UDP_HEADER_BYTES: u32 = 28;
/// Point-to-point framing added on the wire only.
const PPP_HEADER_BYTES: u32 = 2;
const DEFAULT_TTL: u8 = 64;
const FIRST_EPHEMERAL_PORT: u16 = 49153;

#[derive(Debug, Clone)]
struct Packet {
    flow: FlowId,
    source: SocketAddrV4,
    destination: SocketAddrV4,
    /// IP-level size, headers included.
    size: u32,
    sent_at: SimTime,
    ttl: u8,
}

#[derive(Debug)]
enum Event {
    SourceStart(usize),
    SourceStop(usize),
    SourceOn { source: usize, generation: u64 },
    SourceOff { source: usize, generation: u64 },
    SourceSend { source: usize, generation: u64 },
    TransmitComplete(DeviceId),
    Arrival(DeviceId, Packet),
    Periodic(usize),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Transmit,
    Receive,
}

struct Device {
    node: NodeId,
    peer: DeviceId,
    address: Ipv4Addr,
    peer_address: Ipv4Addr,
    data_rate_bps: u64,
    delay: Duration,
    packet_loss_rate: f64,
    queue: VecDeque<Packet>,
    capacity: usize,
    busy: bool,
    observer: Rc<dyn LinkObserver>,
    role: Role,
}

impl Device {
    fn serialisation_time(&self, packet: &Packet) -> Duration {
        let bits = u64::from(packet.size + PPP_HEADER_BYTES) * 8;
        Duration::from_secs_f64(bits as f64 / self.data_rate_bps.max(1) as f64)
    }
}

struct DeviceTable(Vec<Device>);

impl QueueProbe for DeviceTable {
    fn queue_depth(&self, device: DeviceId) -> usize {
        self.0.get(device).map(|d| d.queue.len()).unwrap_or(0)
    }
}

#[derive(Default)]
struct NodeState {
    /// Interface `i + 1` is `devices[i]`; index 0 is the loopback.
    devices: Vec<DeviceId>,
    routes: HashMap<Ipv4Addr, HostRoute>,
    sinks: HashMap<u16, (SimTime, SimTime)>,
}

struct OnOffSource {
    node: NodeId,
    spec: OnOffSpec,
    port: u16,
    active: bool,
    generation: u64,
    last_start: SimTime,
    residual_bits: f64,
}

#[derive(Debug, Default)]
struct FlowRecord {
    tx_packets: u64,
    rx_packets: u64,
    tx_bytes: u64,
    rx_bytes: u64,
    first_tx: Option<SimTime>,
    last_rx: SimTime,
    delay_sum: Duration,
    jitter_sum: Duration,
    last_delay: Duration,
}

/// Classifies packets by `(source, destination)` socket pair.
#[derive(Default)]
struct FlowMonitor {
    ids: HashMap<(SocketAddrV4, SocketAddrV4), FlowId>,
    flows: Vec<(SocketAddrV4, SocketAddrV4, FlowRecord)>,
}

impl FlowMonitor {
    fn classify(&mut self, source: SocketAddrV4, destination: SocketAddrV4) -> FlowId {
        if let Some(id) = self.ids.get(&(source, destination)) {
            return *id;
        }
        self.flows.push((source, destination, FlowRecord::default()));
        let id = self.flows.len() as FlowId;
        self.ids.insert((source, destination), id);
        id
    }

    fn record(&mut self, flow: FlowId) -> Option<&mut FlowRecord> {
        let index = (flow as usize).checked_sub(1)?;
        self.flows.get_mut(index).map(|(_, _, record)| record)
    }

    fn transmitted(&mut self, flow: FlowId, size: u32, now: SimTime) {
        if let Some(record) = self.record(flow) {
            record.tx_packets += 1;
            record.tx_bytes += u64::from(size);
            record.first_tx.get_or_insert(now);
        }
    }

    fn delivered(&mut self, packet: &Packet, now: SimTime) {
        let Some(record) = self.record(packet.flow) else {
            return;
        };
        let delay = now.saturating_since(packet.sent_at);
        if record.rx_packets > 0 {
            record.jitter_sum += delay.abs_diff(record.last_delay);
        }
        record.last_delay = delay;
        record.delay_sum += delay;
        record.rx_packets += 1;
        record.rx_bytes += u64::from(packet.size);
        record.last_rx = now;
    }
}

pub struct DesEngine {
    now: SimTime,
    seq: u64,
    events: BinaryHeap<ScheduledEvent<Event>>,
    nodes: Vec<NodeState>,
    devices: DeviceTable,
    sources: Vec<OnOffSource>,
    periodic: Vec<(Duration, PeriodicTask)>,
    monitor: FlowMonitor,
    rng: StdRng,
    processed: u64,
}

impl DesEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            now: SimTime::ZERO,
            seq: 0,
            events: BinaryHeap::new(),
            nodes: Vec::new(),
            devices: DeviceTable(Vec::new()),
            sources: Vec::new(),
            periodic: Vec::new(),
            monitor: FlowMonitor::default(),
            rng: StdRng::seed_from_u64(seed),
            processed: 0,
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    fn schedule_at(&mut self, when: SimTime, payload: Event) {
        self.seq += 1;
        self.events.push(ScheduledEvent {
            when,
            seq: self.seq,
            payload,
        });
    }

    fn schedule_in(&mut self, delay: Duration, payload: Event) {
        let when = self.now.saturating_add(delay);
        self.schedule_at(when, payload);
    }

    fn sample(&mut self, mean: Duration) -> Duration {
        if mean.is_zero() {
            return Duration::ZERO;
        }
        match Exp::new(1.0 / mean.as_secs_f64()) {
            Ok(exp) => {
                Duration::try_from_secs_f64(exp.sample(&mut self.rng)).unwrap_or(Duration::ZERO)
            }
            Err(_) => Duration::ZERO,
        }
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::SourceStart(source) => {
                self.sources[source].active = true;
                self.schedule_source_on(source);
            }
            Event::SourceStop(source) => {
                let src = &mut self.sources[source];
                src.active = false;
                src.generation += 1;
            }
            Event::SourceOn { source, generation } => {
                if self.is_current(source, generation) {
                    self.source_on(source);
                }
            }
            Event::SourceOff { source, generation } => {
                if self.is_current(source, generation) {
                    self.source_off(source);
                }
            }
            Event::SourceSend { source, generation } => {
                if self.is_current(source, generation) {
                    self.source_send(source);
                }
            }
            Event::TransmitComplete(device) => {
                self.devices.0[device].busy = false;
                self.start_transmission(device);
            }
            Event::Arrival(device, packet) => self.arrival(device, packet),
            Event::Periodic(index) => {
                let now = self.now;
                let (interval, task) = &mut self.periodic[index];
                task(now, &self.devices);
                let interval = *interval;
                self.schedule_in(interval, Event::Periodic(index));
            }
        }
    }

    fn is_current(&self, source: usize, generation: u64) -> bool {
        let src = &self.sources[source];
        src.active && src.generation == generation
    }

    /// Waits an off period, then switches on.
    fn schedule_source_on(&mut self, source: usize) {
        let off_mean = self.sources[source].spec.off_mean;
        let off = self.sample(off_mean);
        let src = &mut self.sources[source];
        src.generation += 1;
        let generation = src.generation;
        self.schedule_in(off, Event::SourceOn { source, generation });
    }

    fn source_on(&mut self, source: usize) {
        let on_mean = self.sources[source].spec.on_mean;
        let generation = self.sources[source].generation;
        self.sources[source].last_start = self.now;
        self.schedule_next_send(source);

        // a zero mean on-time keeps the source on for its whole window
        if !on_mean.is_zero() {
            let on = self.sample(on_mean);
            self.schedule_in(on, Event::SourceOff { source, generation });
        }
    }

    fn source_off(&mut self, source: usize) {
        let now = self.now;
        let src = &mut self.sources[source];
        let elapsed = now.saturating_since(src.last_start).as_secs_f64();
        src.residual_bits += elapsed * src.spec.data_rate_bps as f64;
        self.schedule_source_on(source);
    }

    fn schedule_next_send(&mut self, source: usize) {
        let src = &self.sources[source];
        if src.spec.data_rate_bps == 0 {
            return;
        }
        let bits = (f64::from(src.spec.packet_size) * 8.0 - src.residual_bits).max(0.0);
        let wait = Duration::from_secs_f64(bits / src.spec.data_rate_bps as f64);
        let generation = src.generation;
        self.schedule_in(wait, Event::SourceSend { source, generation });
    }

    fn source_send(&mut self, source: usize) {
        let (node, destination, port, payload) = {
            let src = &mut self.sources[source];
            src.residual_bits = 0.0;
            src.last_start = self.now;
            (src.node, src.spec.destination, src.port, src.spec.packet_size)
        };
        self.originate(node, port, destination, payload);
        self.schedule_next_send(source);
    }

    fn originate(&mut self, node: NodeId, port: u16, destination: SocketAddrV4, payload: u32) {
        let Some(device) = self.lookup(node, *destination.ip()) else {
            debug!("Node {}: no route to {}, dropping", node, destination.ip());
            return;
        };

        let source = SocketAddrV4::new(self.devices.0[device].address, port);
        let flow = self.monitor.classify(source, destination);
        let size = payload + IP_UDP_HEADER_BYTES;
        self.monitor.transmitted(flow, size, self.now);

        let packet = Packet {
            flow,
            source,
            destination,
            size,
            sent_at: self.now,
            ttl: DEFAULT_TTL,
        };
        self.send(device, packet);
    }

    /// Host route first, then a directly attached peer.
    fn lookup(&self, node: NodeId, destination: Ipv4Addr) -> Option<DeviceId> {
        let state = self.nodes.get(node)?;
        if let Some(route) = state.routes.get(&destination) {
            let index = (route.if_index as usize).checked_sub(1)?;
            return state.devices.get(index).copied();
        }
        state
            .devices
            .iter()
            .copied()
            .find(|d| self.devices.0[*d].peer_address == destination)
    }

    fn send(&mut self, device: DeviceId, packet: Packet) {
        let dev = &mut self.devices.0[device];
        if dev.role == Role::Transmit {
            dev.observer.on_transmit();
        }
        if dev.queue.len() >= dev.capacity {
            debug!("Device {}: queue full, dropping packet of flow {}", device, packet.flow);
            return;
        }
        dev.queue.push_back(packet);
        if !dev.busy {
            self.start_transmission(device);
        }
    }

    fn start_transmission(&mut self, device: DeviceId) {
        let dev = &mut self.devices.0[device];
        let Some(packet) = dev.queue.pop_front() else {
            return;
        };
        dev.busy = true;
        let transmit = dev.serialisation_time(&packet);
        let arrive = transmit.saturating_add(dev.delay);
        let peer = dev.peer;

        self.schedule_in(transmit, Event::TransmitComplete(device));
        self.schedule_in(arrive, Event::Arrival(peer, packet));
    }

    fn arrival(&mut self, device: DeviceId, mut packet: Packet) {
        let (node, loss, role) = {
            let dev = &self.devices.0[device];
            (dev.node, dev.packet_loss_rate, dev.role)
        };
        if loss > 0.0 && loss < 1.0 && self.rng.gen_bool(loss) {
            debug!("Device {}: packet of flow {} lost on the wire", device, packet.flow);
            return;
        }
        if role == Role::Receive {
            self.devices.0[device].observer.on_receive();
        }

        let local = self.nodes[node]
            .devices
            .iter()
            .any(|d| self.devices.0[*d].address == *packet.destination.ip());
        if local {
            self.deliver(node, &packet);
            return;
        }

        packet.ttl = packet.ttl.saturating_sub(1);
        if packet.ttl == 0 {
            debug!("Node {}: ttl expired for flow {}", node, packet.flow);
            return;
        }
        match self.lookup(node, *packet.destination.ip()) {
            Some(next) => self.send(next, packet),
            None => debug!("Node {}: no route to {}, dropping", node, packet.destination.ip()),
        }
    }

    fn deliver(&mut self, node: NodeId, packet: &Packet) {
        self.monitor.delivered(packet, self.now);

        let port = packet.destination.port();
        let listening = self.nodes[node]
            .sinks
            .get(&port)
            .is_some_and(|(start, stop)| *start <= self.now && self.now < *stop);
        if !listening {
            debug!("Node {}: nothing listening on port {}", node, port);
        }
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if node >= self.nodes.len() {
            bail!("node {} does not exist ({} nodes)", node, self.nodes.len());
        }
        Ok(())
    }
}

impl QueueProbe for DesEngine {
    fn queue_depth(&self, device: DeviceId) -> usize {
        self.devices.queue_depth(device)
    }
}

impl Engine for DesEngine {
    fn create_nodes(&mut self, count: usize) {
        if count > self.nodes.len() {
            self.nodes.resize_with(count, NodeState::default);
        }
    }

    fn connect(
        &mut self,
        spec: &ChannelSpec,
        observer: Rc<dyn LinkObserver>,
    ) -> Result<ChannelBinding> {
        self.check_node(spec.a)?;
        self.check_node(spec.b)?;

        let a = self.devices.0.len();
        let b = a + 1;
        for (device, node, peer, address, peer_address, role) in [
            (a, spec.a, b, spec.a_address, spec.b_address, Role::Transmit),
            (b, spec.b, a, spec.b_address, spec.a_address, Role::Receive),
        ] {
            self.devices.0.push(Device {
                node,
                peer,
                address,
                peer_address,
                data_rate_bps: spec.data_rate_bps,
                delay: spec.delay,
                packet_loss_rate: spec.packet_loss_rate,
                queue: VecDeque::new(),
                capacity: spec.queue_packets,
                busy: false,
                observer: Rc::clone(&observer),
                role,
            });
            self.nodes[node].devices.push(device);
        }

        Ok(ChannelBinding {
            a: Attachment {
                device: a,
                if_index: if_index_of(&self.nodes[spec.a], a),
            },
            b: Attachment {
                device: b,
                if_index: if_index_of(&self.nodes[spec.b], b),
            },
        })
    }

    fn add_host_route(&mut self, node: NodeId, route: &HostRoute) -> Result<()> {
        self.check_node(node)?;
        let state = &mut self.nodes[node];
        if route.if_index == 0 || route.if_index as usize > state.devices.len() {
            bail!("node {} has no interface {}", node, route.if_index);
        }
        state.routes.insert(route.destination, *route);
        Ok(())
    }

    fn install_sink(
        &mut self,
        node: NodeId,
        port: u16,
        start: SimTime,
        stop: SimTime,
    ) -> Result<()> {
        self.check_node(node)?;
        self.nodes[node].sinks.insert(port, (start, stop));
        Ok(())
    }

    fn install_on_off(&mut self, node: NodeId, spec: OnOffSpec) -> Result<()> {
        self.check_node(node)?;
        let index = self.sources.len();
        let Some(port) = u16::try_from(index)
            .ok()
            .and_then(|i| FIRST_EPHEMERAL_PORT.checked_add(i))
        else {
            bail!("too many sources");
        };

        let (start, stop) = (spec.start, spec.stop);
        self.sources.push(OnOffSource {
            node,
            spec,
            port,
            active: false,
            generation: 0,
            last_start: SimTime::ZERO,
            residual_bits: 0.0,
        });
        // an empty or inverted window never starts
        if start < stop {
            self.schedule_at(start, Event::SourceStart(index));
            self.schedule_at(stop, Event::SourceStop(index));
        } else {
            debug!("Source {} on node {}: empty window, never started", index, node);
        }
        Ok(())
    }

    fn schedule_periodic(&mut self, interval: Duration, task: PeriodicTask) {
        if interval.is_zero() {
            return;
        }
        let index = self.periodic.len();
        self.periodic.push((interval, task));
        self.schedule_in(interval, Event::Periodic(index));
    }

    fn run(&mut self, stop: SimTime) {
        info!("Running until {}s", stop);
        while let Some(next) = self.events.peek() {
            if next.when >= stop {
                break;
            }
            let Some(ScheduledEvent { when, payload, .. }) = self.events.pop() else {
                break;
            };
            self.now = when;
            self.processed += 1;
            self.dispatch(payload);
        }
        self.now = stop;
        info!("Simulation stopped at {}s after {} events", stop, self.processed);
    }

    fn flow_stats(&self) -> Vec<RawFlowStats> {
        self.monitor
            .flows
            .iter()
            .enumerate()
            .map(|(index, (source, destination, record))| RawFlowStats {
                flow_id: index as FlowId + 1,
                source: *source,
                destination: *destination,
                tx_packets: record.tx_packets,
                rx_packets: record.rx_packets,
                tx_bytes: record.tx_bytes,
                rx_bytes: record.rx_bytes,
                first_tx: record.first_tx.unwrap_or(SimTime::ZERO),
                last_rx: record.last_rx,
                delay_sum: record.delay_sum,
                jitter_sum: record.jitter_sum,
            })
            .collect()
    }
}

fn if_index_of(node: &NodeState, device: DeviceId) -> u32 {
    node.devices
        .iter()
        .position(|d| *d == device)
        .map(|i| i as u32 + 1)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::LinkCounters;
    use std::cell::RefCell;

    fn channel(a: NodeId, b: NodeId, subnet: u8) -> ChannelSpec {
        ChannelSpec {
            a,
            b,
            a_address: Ipv4Addr::new(10, 0, subnet, 1),
            b_address: Ipv4Addr::new(10, 0, subnet, 2),
            data_rate_bps: 10_000_000,
            delay: Duration::from_millis(2),
            packet_loss_rate: 0.0,
            queue_packets: 500,
        }
    }

    fn source(destination: SocketAddrV4, rate: u64) -> OnOffSpec {
        OnOffSpec {
            destination,
            data_rate_bps: rate,
            packet_size: 1024,
            // always on
            on_mean: Duration::ZERO,
            off_mean: Duration::ZERO,
            start: SimTime::ZERO,
            stop: SimTime::from_secs_f64(1.0),
        }
    }

    /// 0 - 1 - 2 chain with host routes toward node 2's address.
    fn chain(engine: &mut DesEngine) -> (Rc<LinkCounters>, Rc<LinkCounters>) {
        engine.create_nodes(3);
        let first = Rc::new(LinkCounters::default());
        let second = Rc::new(LinkCounters::default());
        let ab = engine.connect(&channel(0, 1, 0), first.clone()).unwrap();
        let bc = engine.connect(&channel(1, 2, 1), second.clone()).unwrap();

        let destination = Ipv4Addr::new(10, 0, 1, 2);
        engine
            .add_host_route(
                0,
                &HostRoute {
                    destination,
                    next_hop: Ipv4Addr::new(10, 0, 0, 2),
                    if_index: ab.a.if_index,
                },
            )
            .unwrap();
        engine
            .add_host_route(
                1,
                &HostRoute {
                    destination,
                    next_hop: destination,
                    if_index: bc.a.if_index,
                },
            )
            .unwrap();
        (first, second)
    }

    #[test]
    fn interface_indices_skip_loopback() {
        let mut engine = DesEngine::new(1);
        engine.create_nodes(3);
        let observer: Rc<dyn LinkObserver> = Rc::new(LinkCounters::default());

        let first = engine.connect(&channel(0, 1, 0), observer.clone()).unwrap();
        let second = engine.connect(&channel(1, 2, 1), observer).unwrap();

        assert_eq!(first.a.if_index, 1);
        assert_eq!(first.b.if_index, 1);
        assert_eq!(second.a.if_index, 2);
        assert_eq!(second.b.if_index, 1);
        assert_ne!(first.a.device, second.a.device);
    }

    #[test]
    fn rejects_unknown_nodes_and_interfaces() {
        let mut engine = DesEngine::new(1);
        engine.create_nodes(2);
        let observer: Rc<dyn LinkObserver> = Rc::new(LinkCounters::default());

        assert!(engine.connect(&channel(0, 5, 0), observer).is_err());
        let route = HostRoute {
            destination: Ipv4Addr::new(10, 0, 0, 2),
            next_hop: Ipv4Addr::new(10, 0, 0, 2),
            if_index: 1,
        };
        assert!(engine.add_host_route(0, &route).is_err());
    }

    #[test]
    fn constant_rate_flow_is_delivered_over_two_hops() {
        let mut engine = DesEngine::new(1);
        let (first, second) = chain(&mut engine);
        let destination = SocketAddrV4::new(Ipv4Addr::new(10, 0, 1, 2), 9000);
        engine
            .install_sink(2, 9000, SimTime::ZERO, SimTime::from_secs_f64(2.0))
            .unwrap();
        // one 1024 byte packet every 8.192 ms
        engine.install_on_off(0, source(destination, 1_000_000)).unwrap();

        engine.run(SimTime::from_secs_f64(2.0));

        let flows = engine.flow_stats();
        assert_eq!(flows.len(), 1);
        let flow = &flows[0];
        assert_eq!(flow.flow_id, 1);
        assert_eq!(flow.source, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 49153));
        assert_eq!(flow.destination, destination);
        assert_eq!(flow.tx_packets, 122);
        assert_eq!(flow.rx_packets, flow.tx_packets);
        assert_eq!(flow.rx_bytes, flow.rx_packets * 1052);
        assert!(flow.last_rx > flow.first_tx);

        // two propagation delays plus two serialisations of 1054 bytes
        let per_packet = flow.delay_sum.as_secs_f64() / flow.rx_packets as f64;
        assert!((per_packet - 0.0056864).abs() < 1e-6, "{per_packet}");
        assert!(flow.jitter_sum < Duration::from_micros(1));

        assert_eq!(first.tx_packets(), 122);
        assert_eq!(first.rx_packets(), 122);
        assert_eq!(second.tx_packets(), 122);
    }

    #[test]
    fn full_queue_drops_after_counting_transmission() {
        let mut engine = DesEngine::new(1);
        engine.create_nodes(2);
        let counters = Rc::new(LinkCounters::default());
        let spec = ChannelSpec {
            data_rate_bps: 100_000,
            queue_packets: 2,
            ..channel(0, 1, 0)
        };
        engine.connect(&spec, counters.clone()).unwrap();

        // offered 10x the link rate
        let destination = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 9000);
        engine.install_on_off(0, source(destination, 1_000_000)).unwrap();
        engine.run(SimTime::from_secs_f64(1.0));

        assert!(counters.tx_packets() > counters.rx_packets());
        let flow = &engine.flow_stats()[0];
        assert!(flow.rx_packets < flow.tx_packets);
    }

    #[test]
    fn certain_loss_is_not_applied() {
        let mut engine = DesEngine::new(1);
        engine.create_nodes(2);
        let counters = Rc::new(LinkCounters::default());
        let spec = ChannelSpec {
            packet_loss_rate: 1.0,
            ..channel(0, 1, 0)
        };
        engine.connect(&spec, counters.clone()).unwrap();

        let destination = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 9000);
        engine.install_on_off(0, source(destination, 1_000_000)).unwrap();
        engine.run(SimTime::from_secs_f64(1.0));

        assert!(counters.rx_packets() > 0);
    }

    #[test]
    fn source_without_route_sends_nothing() {
        let mut engine = DesEngine::new(1);
        engine.create_nodes(3);
        let destination = SocketAddrV4::new(Ipv4Addr::new(10, 9, 9, 9), 9000);
        engine.install_on_off(0, source(destination, 1_000_000)).unwrap();

        engine.run(SimTime::from_secs_f64(1.0));
        assert!(engine.flow_stats().is_empty());
    }

    #[test]
    fn on_off_source_respects_its_window() {
        let mut engine = DesEngine::new(3);
        let _counters = chain(&mut engine);
        let destination = SocketAddrV4::new(Ipv4Addr::new(10, 0, 1, 2), 9000);
        let spec = OnOffSpec {
            on_mean: Duration::from_secs(1),
            off_mean: Duration::from_millis(500),
            start: SimTime::from_secs_f64(1.0),
            stop: SimTime::from_secs_f64(3.0),
            ..source(destination, 1_000_000)
        };
        engine.install_on_off(0, spec).unwrap();
        engine.run(SimTime::from_secs_f64(5.0));

        let flows = engine.flow_stats();
        if let Some(flow) = flows.first() {
            assert!(flow.first_tx >= SimTime::from_secs_f64(1.0));
            // 2 s window at 1 Mbps with 1024 byte payloads
            assert!(flow.tx_packets <= 245);
            assert!(flow.last_rx < SimTime::from_secs_f64(3.1));
        }
    }

    #[test]
    fn inverted_window_sends_nothing() {
        let mut engine = DesEngine::new(1);
        let _counters = chain(&mut engine);
        let destination = SocketAddrV4::new(Ipv4Addr::new(10, 0, 1, 2), 9000);
        let spec = OnOffSpec {
            start: SimTime::from_secs_f64(2.0),
            stop: SimTime::from_secs_f64(1.0),
            ..source(destination, 1_000_000)
        };
        engine.install_on_off(0, spec).unwrap();
        engine.run(SimTime::from_secs_f64(10.0));

        assert!(engine.flow_stats().is_empty());
    }

    #[test]
    fn periodic_task_sees_queues_on_cadence() {
        let mut engine = DesEngine::new(1);
        engine.create_nodes(2);
        let observer: Rc<dyn LinkObserver> = Rc::new(LinkCounters::default());
        let binding = engine.connect(&channel(0, 1, 0), observer).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let device = binding.a.device;
        engine.schedule_periodic(
            Duration::from_millis(100),
            Box::new(move |now: SimTime, probe: &dyn QueueProbe| {
                sink.borrow_mut().push((now, probe.queue_depth(device)));
            }),
        );
        engine.run(SimTime::from_secs_f64(1.0));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen[0], (SimTime::from_secs_f64(0.1), 0));
        assert_eq!(seen[8].0, SimTime::from_secs_f64(0.9));
    }
}
