mod demand;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde::Serialize;
use std::net::SocketAddrV4;
use std::time::Duration;

use crate::NodeId;
use crate::algorithms::PathCache;
use crate::engine::{Engine, OnOffSpec, SimTime};
use crate::network::Topology;
use crate::routing::RouteInstaller;

pub use self::demand::TrafficDemand;

/// Shape of the traffic every on/off source generates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProfile {
    pub packet_size: u32,
    pub on_mean: Duration,
    pub off_mean: Duration,
}

/// Path chosen for a satisfied demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRecord {
    pub flow_id: u64,
    pub src_name: String,
    pub dst_name: String,
    pub path: Vec<NodeId>,
    pub path_names: Vec<String>,
}

impl RouteRecord {
    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn path_string(&self) -> String {
        self.path_names.join("->")
    }
}

/// Routes demands one at a time and asks the engine for their endpoints.
///
/// Every demand is independent: one that cannot be routed is logged and
/// skipped without affecting the others.
pub struct TrafficScheduler {
    profile: SourceProfile,
    run_until: SimTime,
    next_port: u16,
    cache: PathCache,
    installer: RouteInstaller,
}

impl TrafficScheduler {
    pub fn new(profile: SourceProfile, run_until: SimTime, base_port: u16) -> Self {
        Self {
            profile,
            run_until,
            next_port: base_port,
            cache: PathCache::new(),
            installer: RouteInstaller::new(),
        }
    }

    pub fn installer(&self) -> &RouteInstaller {
        &self.installer
    }

    /// Schedules `demands` in input order and returns the routes of those
    /// that were satisfied.
    pub fn schedule_all<E: Engine>(
        &mut self,
        topology: &Topology,
        engine: &mut E,
        demands: &[TrafficDemand],
    ) -> Result<Vec<RouteRecord>> {
        let mut records = Vec::new();
        for demand in demands {
            if let Some(record) = self.schedule(topology, engine, demand)? {
                records.push(record);
            }
        }
        info!(
            "Scheduled {} of {} demands ({} source trees computed)",
            records.len(),
            demands.len(),
            self.cache.len()
        );
        Ok(records)
    }

    /// `Ok(None)` means the demand was skipped; errors are engine failures.
    pub fn schedule<E: Engine>(
        &mut self,
        topology: &Topology,
        engine: &mut E,
        demand: &TrafficDemand,
    ) -> Result<Option<RouteRecord>> {
        if !(demand.duration_sec.is_finite() && demand.duration_sec >= 0.0)
            || !demand.start_time_sec.is_finite()
        {
            warn!(
                "Demand {}: invalid window (start {}s, duration {}s), skipping",
                demand.demand_id, demand.start_time_sec, demand.duration_sec
            );
            return Ok(None);
        }

        let Some(destination) = topology.address_of(demand.dst_id) else {
            warn!(
                "Demand {}: destination {} ({}) has no address, skipping",
                demand.demand_id, demand.dst_name, demand.dst_id
            );
            return Ok(None);
        };

        let path = match self.cache.shortest_paths(topology, demand.src_id) {
            Ok(paths) => paths.path_to(demand.dst_id),
            Err(e) => {
                warn!("Demand {}: {}, skipping", demand.demand_id, e);
                return Ok(None);
            }
        };
        if path.len() < 2 {
            warn!(
                "Demand {}: no path from {} to {}, skipping",
                demand.demand_id, demand.src_name, demand.dst_name
            );
            return Ok(None);
        }

        let routes = match RouteInstaller::plan(topology, &path, destination) {
            Ok(routes) => routes,
            Err(e) => {
                warn!("Demand {}: {}, skipping", demand.demand_id, e);
                return Ok(None);
            }
        };
        self.installer.apply(engine, &routes)?;

        let port = self.next_port;
        self.next_port = self
            .next_port
            .checked_add(1)
            .ok_or_else(|| anyhow!("ran out of ports at demand {}", demand.demand_id))?;

        engine
            .install_sink(demand.dst_id, port, SimTime::ZERO, self.run_until)
            .with_context(|| format!("failed to install sink for demand {}", demand.demand_id))?;
        engine
            .install_on_off(
                demand.src_id,
                OnOffSpec {
                    destination: SocketAddrV4::new(destination, port),
                    data_rate_bps: demand.data_rate_bps(),
                    packet_size: self.profile.packet_size,
                    on_mean: self.profile.on_mean,
                    off_mean: self.profile.off_mean,
                    start: demand.start(),
                    stop: demand.stop(),
                },
            )
            .with_context(|| format!("failed to install source for demand {}", demand.demand_id))?;

        let record = RouteRecord {
            flow_id: demand.flow_number(),
            src_name: demand.src_name.clone(),
            dst_name: demand.dst_name.clone(),
            path_names: path
                .iter()
                .map(|node| topology.node_name(*node).into_owned())
                .collect(),
            path,
        };
        info!("  Flow {}: {}", demand.demand_id, record.path_string());

        Ok(Some(record))
    }
}
