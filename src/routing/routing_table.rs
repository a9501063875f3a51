use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::NodeId;

/// Forwarding entry matching exactly one destination address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostRoute {
    pub destination: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub if_index: u32,
}

/// Host routes of every node, keyed by `(node, destination)`.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: HashMap<(NodeId, Ipv4Addr), HostRoute>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the route, returns whether anything changed.
    pub fn add_route(&mut self, node: NodeId, route: HostRoute) -> bool {
        match self.entries.insert((node, route.destination), route) {
            Some(previous) => previous != route,
            None => true,
        }
    }

    pub fn get_route(&self, node: NodeId, destination: Ipv4Addr) -> Option<&HostRoute> {
        self.entries.get(&(node, destination))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &HostRoute)> {
        self.entries.iter().map(|((node, _), route)| (*node, route))
    }
}
