use anyhow::{Context, Result, anyhow};
use ipnet::Ipv4Net;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::NodeId;
use crate::engine::{ChannelSpec, Engine};
use crate::network::{LinkInterface, Topology};
use crate::stats::StatisticsCollector;

/// Per-device settings applied to every bound link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub queue_packets: usize,
}

/// Hands out consecutive point-to-point /30 subnets `10.x.y.0/30`.
///
/// Wraps after 65536 subnets.
#[derive(Debug, Clone, Default)]
pub struct SubnetAllocator {
    next: u32,
}

impl SubnetAllocator {
    pub fn allocate(&mut self) -> Result<Ipv4Net> {
        let n = self.next;
        self.next = self.next.wrapping_add(1);

        let base = Ipv4Addr::new(10, ((n / 256) % 256) as u8, (n % 256) as u8, 0);
        Ok(Ipv4Net::new(base, 30)?)
    }
}

/// The two usable host addresses of a point-to-point subnet.
fn endpoints(subnet: &Ipv4Net) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let mut hosts = subnet.hosts();
    match (hosts.next(), hosts.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(anyhow!("subnet {subnet} has fewer than two host addresses")),
    }
}

impl Topology {
    /// Realizes every link in `engine` and records what routing and
    /// reporting need afterwards: the per-direction interface records,
    /// node addresses, the link's counter handle and both monitored queues.
    pub fn bind<E: Engine>(
        &mut self,
        engine: &mut E,
        collector: &mut StatisticsCollector,
        config: &ChannelConfig,
    ) -> Result<()> {
        engine.create_nodes(self.node_count());

        let mut subnets = SubnetAllocator::default();
        let links = self.links().to_vec();
        // delay of the link currently holding each node pair's interfaces
        let mut routed: HashMap<(NodeId, NodeId), f64> = HashMap::new();

        for (index, link) in links.iter().enumerate() {
            let subnet = subnets.allocate()?;
            let (a_address, b_address) = endpoints(&subnet)?;

            let spec = ChannelSpec {
                a: link.src_id,
                b: link.dst_id,
                a_address,
                b_address,
                data_rate_bps: link.data_rate_bps,
                delay: link.delay(),
                packet_loss_rate: link.packet_loss_rate,
                queue_packets: config.queue_packets,
            };

            let counters = collector.register_link(&link.src_name, &link.dst_name);
            let binding = engine.connect(&spec, counters).with_context(|| {
                format!("failed to create link {} -> {}", link.src_name, link.dst_name)
            })?;

            collector.monitor_queue(&link.src_name, &link.dst_name, binding.a.device);
            collector.monitor_queue(&link.dst_name, &link.src_name, binding.b.device);

            let pair = (link.src_id.min(link.dst_id), link.src_id.max(link.dst_id));
            match routed.get(&pair) {
                Some(delay) if *delay <= link.delay_ms => warn!(
                    "Parallel link {} <-> {} ({} ms) not used for forwarding",
                    link.src_name, link.dst_name, link.delay_ms
                ),
                _ => {
                    if routed.insert(pair, link.delay_ms).is_some() {
                        warn!(
                            "Parallel link {} <-> {} ({} ms) replaces a slower one",
                            link.src_name, link.dst_name, link.delay_ms
                        );
                    }
                    self.set_interface(
                        link.src_id,
                        link.dst_id,
                        LinkInterface::new(binding.a.if_index, b_address),
                    );
                    self.set_interface(
                        link.dst_id,
                        link.src_id,
                        LinkInterface::new(binding.b.if_index, a_address),
                    );
                }
            }
            self.assign_address(link.src_id, a_address, &link.src_name);
            self.assign_address(link.dst_id, b_address, &link.dst_name);

            debug!(
                "Link {} {} <-> {} on {}",
                index, link.src_name, link.dst_name, subnet
            );
        }

        info!(
            "Bound {} links across {} nodes",
            links.len(),
            self.node_count()
        );
        Ok(())
    }
}
