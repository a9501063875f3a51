use anyhow::Result;
use log::debug;
use std::net::Ipv4Addr;

use crate::NodeId;
use crate::engine::Engine;
use crate::error::TopologyError;
use crate::network::Topology;
use crate::routing::{HostRoute, RoutingTable};

/// Turns computed paths into per-hop host routes.
///
/// A path is installed all-or-nothing: every hop's interface is resolved
/// before the first entry is written, so a topology hole never leaves a
/// half-built route behind.
#[derive(Debug, Default)]
pub struct RouteInstaller {
    table: RoutingTable,
}

impl RouteInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Host routes for every hop of `path` except the last, in path order.
    pub fn plan(
        topology: &Topology,
        path: &[NodeId],
        destination: Ipv4Addr,
    ) -> Result<Vec<(NodeId, HostRoute)>, TopologyError> {
        path.windows(2)
            .map(|hop| {
                let (current, next) = (hop[0], hop[1]);
                let interface = topology.interface_for(current, next)?;
                Ok((
                    current,
                    HostRoute {
                        destination,
                        next_hop: interface.next_hop,
                        if_index: interface.if_index,
                    },
                ))
            })
            .collect()
    }

    /// Writes planned routes to the table and the engine. Entries already
    /// present with identical parameters are skipped; returns how many
    /// entries were written.
    pub fn apply<E: Engine>(
        &mut self,
        engine: &mut E,
        routes: &[(NodeId, HostRoute)],
    ) -> Result<usize> {
        let mut written = 0;
        for (node, route) in routes {
            if !self.table.add_route(*node, *route) {
                continue;
            }
            engine.add_host_route(*node, route)?;
            debug!(
                "Node {}: host route {} via {} on if {}",
                node, route.destination, route.next_hop, route.if_index
            );
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingEngine;
    use crate::network::topology::tests::link;
    use crate::network::{ChannelConfig, LinkInterface};
    use crate::stats::StatisticsCollector;

    fn bound_line() -> (Topology, RecordingEngine) {
        let mut topology =
            Topology::from_links([link(0, 1, 2.0), link(1, 2, 2.0), link(2, 3, 2.0)]);
        let mut engine = RecordingEngine::default();
        topology
            .bind(
                &mut engine,
                &mut StatisticsCollector::new(),
                &ChannelConfig { queue_packets: 500 },
            )
            .unwrap();
        (topology, engine)
    }

    #[test]
    fn plans_one_route_per_hop_toward_next_node() {
        let (topology, _) = bound_line();
        let destination = topology.address_of(3).unwrap();

        let routes = RouteInstaller::plan(&topology, &[0, 1, 2, 3], destination).unwrap();

        let nodes: Vec<_> = routes.iter().map(|(n, _)| *n).collect();
        assert_eq!(nodes, vec![0, 1, 2]);
        for (node, route) in &routes {
            let expected = topology.interface_for(*node, node + 1).unwrap();
            assert_eq!(route.next_hop, expected.next_hop);
            assert_eq!(route.if_index, expected.if_index);
            assert_eq!(route.destination, destination);
        }
    }

    #[test]
    fn missing_hop_fails_the_whole_plan() {
        let mut topology = Topology::from_links([link(0, 1, 2.0), link(1, 2, 2.0)]);
        topology.set_interface(0, 1, LinkInterface::new(1, Ipv4Addr::new(10, 0, 0, 2)));

        let err = RouteInstaller::plan(&topology, &[0, 1, 2], Ipv4Addr::new(10, 0, 1, 2))
            .unwrap_err();
        assert_eq!(err, TopologyError::MissingInterface { from: 1, to: 2 });
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let (topology, mut engine) = bound_line();
        let destination = topology.address_of(3).unwrap();
        let routes = RouteInstaller::plan(&topology, &[0, 1, 2, 3], destination).unwrap();

        let mut installer = RouteInstaller::new();
        assert_eq!(installer.apply(&mut engine, &routes).unwrap(), 3);
        let table_before = installer.table().len();

        assert_eq!(installer.apply(&mut engine, &routes).unwrap(), 0);
        assert_eq!(installer.table().len(), table_before);
        assert_eq!(engine.routes.len(), 3);
    }

    #[test]
    fn single_node_path_installs_nothing() {
        let (topology, _) = bound_line();
        let routes = RouteInstaller::plan(&topology, &[2], Ipv4Addr::new(10, 0, 1, 2)).unwrap();
        assert!(routes.is_empty());
    }
}
