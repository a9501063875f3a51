use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::NodeId;
use crate::error::TopologyError;
use crate::network::Topology;

/// Single-source result: minimum delay sum and predecessor for every node.
///
/// Unreachable nodes keep an infinite distance and no predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPaths {
    source: NodeId,
    distance: Vec<f64>,
    predecessor: Vec<Option<NodeId>>,
}

#[derive(Debug)]
struct State {
    cost: f64,
    node: NodeId,
}

impl Eq for State {}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other.cost.total_cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn calculate_shortest_paths(
    topology: &Topology,
    source: NodeId,
) -> Result<ShortestPaths, TopologyError> {
    let node_count = topology.node_count();
    if source >= node_count {
        return Err(TopologyError::UnknownNode(source));
    }

    let mut distance = vec![f64::INFINITY; node_count];
    let mut predecessor = vec![None; node_count];
    let mut heap = BinaryHeap::new();

    distance[source] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've already found a better path
        if cost > distance[node] {
            continue;
        }

        for &(neighbor, weight) in topology.neighbors(node) {
            let candidate = cost + weight;
            if candidate < distance[neighbor] {
                distance[neighbor] = candidate;
                predecessor[neighbor] = Some(node);
                heap.push(State {
                    cost: candidate,
                    node: neighbor,
                });
            }
        }
    }

    Ok(ShortestPaths {
        source,
        distance,
        predecessor,
    })
}

impl ShortestPaths {
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Infinite for unreachable nodes and for ids outside the topology.
    pub fn distance(&self, node: NodeId) -> f64 {
        self.distance.get(node).copied().unwrap_or(f64::INFINITY)
    }

    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.predecessor.get(node).copied().flatten()
    }

    /// Node sequence from the source to `destination`, empty when
    /// `destination` is unreachable.
    pub fn path_to(&self, destination: NodeId) -> Vec<NodeId> {
        if self.distance(destination).is_infinite() {
            return Vec::new();
        }

        let mut path = Vec::new();
        let mut current = Some(destination);
        while let Some(node) = current {
            path.push(node);
            current = self.predecessor(node);
        }

        path.reverse();
        path
    }
}

/// Shortest-path results memoised per source node.
///
/// Only valid while the topology it was filled from stays unchanged.
#[derive(Debug, Default)]
pub struct PathCache {
    results: HashMap<NodeId, ShortestPaths>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shortest_paths(
        &mut self,
        topology: &Topology,
        source: NodeId,
    ) -> Result<&ShortestPaths, TopologyError> {
        if !self.results.contains_key(&source) {
            let computed = calculate_shortest_paths(topology, source)?;
            self.results.insert(source, computed);
        }
        self.results
            .get(&source)
            .ok_or(TopologyError::UnknownNode(source))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
