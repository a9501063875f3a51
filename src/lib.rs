pub mod algorithms;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod network;
pub mod report;
pub mod routing;
pub mod scheduler;
pub mod simulation;
pub mod stats;

/// Dense, zero-based node identifier as it appears in the link input.
pub type NodeId = usize;

pub use config::SimConfig;
pub use error::{RecordError, TopologyError};
pub use network::{LinkParam, Topology};
pub use scheduler::{TrafficDemand, TrafficScheduler};
pub use simulation::Simulation;
pub use stats::StatisticsCollector;
