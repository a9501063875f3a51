use std::borrow::Cow;
use std::collections::HashMap;
use std::net::Ipv4Addr;

use log::warn;

use crate::NodeId;
use crate::error::TopologyError;
use crate::network::{LinkInterface, LinkParam};

/// Static graph of the constellation.
///
/// Nodes are implicit: every id referenced by a link exists, and the node
/// count is one past the largest id seen. Links are undirected for routing
/// and contribute one weighted edge per direction, the weight being the
/// one-way delay in milliseconds.
/// Largest node count a topology accepts; ids are dense indices.
pub const MAX_NODES: usize = 1 << 20;

#[derive(Debug, Clone, Default)]
pub struct Topology {
    links: Vec<LinkParam>,
    adjacency: Vec<Vec<(NodeId, f64)>>,
    names: HashMap<NodeId, String>,
    interfaces: HashMap<(NodeId, NodeId), LinkInterface>,
    first_address: HashMap<NodeId, Ipv4Addr>,
    address_names: HashMap<Ipv4Addr, String>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a topology, skipping links that `add_link` rejects.
    pub fn from_links(links: impl IntoIterator<Item = LinkParam>) -> Self {
        let mut topology = Self::new();
        for link in links {
            let (src, dst) = (link.src_name.clone(), link.dst_name.clone());
            if let Err(e) = topology.add_link(link) {
                warn!("Skipping link {} -> {}: {}", src, dst, e);
            }
        }
        topology
    }

    pub fn add_link(&mut self, link: LinkParam) -> Result<(), TopologyError> {
        let link = link.normalized();

        let highest = link.src_id.max(link.dst_id);
        let required = highest
            .checked_add(1)
            .filter(|count| *count <= MAX_NODES)
            .ok_or(TopologyError::NodeIdOutOfRange(highest))?;
        if required > self.adjacency.len() {
            self.adjacency.resize_with(required, Vec::new);
        }

        self.names.insert(link.src_id, link.src_name.clone());
        self.names.insert(link.dst_id, link.dst_name.clone());

        self.adjacency[link.src_id].push((link.dst_id, link.delay_ms));
        self.adjacency[link.dst_id].push((link.src_id, link.delay_ms));
        self.links.push(link);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn links(&self) -> &[LinkParam] {
        &self.links
    }

    /// Outgoing `(neighbor, delay_ms)` edges of `node`.
    pub fn neighbors(&self, node: NodeId) -> &[(NodeId, f64)] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.neighbors(from).iter().any(|(n, _)| *n == to)
    }

    pub fn node_name(&self, node: NodeId) -> Cow<'_, str> {
        match self.names.get(&node) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Node_{node}")),
        }
    }

    pub(crate) fn set_interface(&mut self, from: NodeId, to: NodeId, interface: LinkInterface) {
        self.interfaces.insert((from, to), interface);
    }

    pub fn interface_for(&self, from: NodeId, to: NodeId) -> Result<LinkInterface, TopologyError> {
        self.interfaces
            .get(&(from, to))
            .copied()
            .ok_or(TopologyError::MissingInterface { from, to })
    }

    /// Records an address owned by `node`; the first one stays the node's
    /// reachable address.
    pub(crate) fn assign_address(&mut self, node: NodeId, address: Ipv4Addr, name: &str) {
        self.first_address.entry(node).or_insert(address);
        self.address_names.insert(address, name.to_string());
    }

    pub fn address_of(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.first_address.get(&node).copied()
    }

    pub fn name_for_address(&self, address: Ipv4Addr) -> &str {
        self.address_names
            .get(&address)
            .map(String::as_str)
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn link(src: NodeId, dst: NodeId, delay_ms: f64) -> LinkParam {
        LinkParam {
            src_id: src,
            dst_id: dst,
            src_name: format!("N{src}"),
            dst_name: format!("N{dst}"),
            delay_ms,
            data_rate_bps: 10_000_000,
            packet_loss_rate: 0.0,
            distance_km: 0.0,
        }
    }

    #[test]
    fn node_count_grows_to_max_id() {
        let mut topology = Topology::new();
        topology.add_link(link(0, 1, 2.0)).unwrap();
        assert_eq!(topology.node_count(), 2);

        topology.add_link(link(5, 1, 2.0)).unwrap();
        assert_eq!(topology.node_count(), 6);
        assert!(topology.neighbors(3).is_empty());
        assert_eq!(topology.node_name(3), "Node_3");
        assert_eq!(topology.node_name(5), "N5");
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut topology = Topology::new();
        assert_eq!(
            topology.add_link(link(0, usize::MAX, 2.0)),
            Err(TopologyError::NodeIdOutOfRange(usize::MAX))
        );
        assert_eq!(
            topology.add_link(link(MAX_NODES, 1, 2.0)),
            Err(TopologyError::NodeIdOutOfRange(MAX_NODES))
        );
        assert_eq!(topology.node_count(), 0);

        topology.add_link(link(MAX_NODES - 1, 0, 2.0)).unwrap();
        assert_eq!(topology.node_count(), MAX_NODES);
    }

    #[test]
    fn from_links_skips_rejected_links() {
        let huge: LinkParam = format!("0,{},A,B,1.0,1000000", usize::MAX).parse().unwrap();
        let topology = Topology::from_links([huge, link(0, 1, 2.0)]);

        assert_eq!(topology.links().len(), 1);
        assert_eq!(topology.node_count(), 2);
    }

    #[test]
    fn adds_both_directions_with_coerced_weight() {
        let topology = Topology::from_links([link(0, 1, -5.0)]);

        assert_eq!(topology.neighbors(0), &[(1, 1.0)]);
        assert_eq!(topology.neighbors(1), &[(0, 1.0)]);
        assert_eq!(topology.links()[0].delay_ms, 1.0);
        assert!(topology.has_edge(1, 0));
        assert!(!topology.has_edge(0, 0));
    }

    #[test]
    fn missing_interface_is_an_error() {
        let mut topology = Topology::from_links([link(0, 1, 2.0)]);
        assert_eq!(
            topology.interface_for(0, 1),
            Err(TopologyError::MissingInterface { from: 0, to: 1 })
        );

        let iface = LinkInterface::new(1, Ipv4Addr::new(10, 0, 0, 2));
        topology.set_interface(0, 1, iface);
        assert_eq!(topology.interface_for(0, 1), Ok(iface));
        assert!(topology.interface_for(1, 0).is_err());
    }

    #[test]
    fn first_address_wins() {
        let mut topology = Topology::from_links([link(0, 1, 2.0)]);
        let first = Ipv4Addr::new(10, 0, 0, 1);
        let second = Ipv4Addr::new(10, 0, 1, 1);

        topology.assign_address(0, first, "N0");
        topology.assign_address(0, second, "N0");

        assert_eq!(topology.address_of(0), Some(first));
        assert_eq!(topology.address_of(1), None);
        assert_eq!(topology.name_for_address(second), "N0");
        assert_eq!(topology.name_for_address(Ipv4Addr::new(10, 9, 9, 9)), "Unknown");
    }
}
