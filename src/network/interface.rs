use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Local side of a directed edge once the link is bound to the engine:
/// packets leave through `if_index` toward the peer at `next_hop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInterface {
    pub if_index: u32,
    pub next_hop: Ipv4Addr,
}

impl LinkInterface {
    pub fn new(if_index: u32, next_hop: Ipv4Addr) -> Self {
        Self { if_index, next_hop }
    }
}
