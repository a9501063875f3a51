use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::SimTime;
use crate::network::ChannelConfig;
use crate::scheduler::SourceProfile;

/// Run parameters. Every field has a default so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub link_params: PathBuf,
    pub demands: PathBuf,
    /// Per-flow results.
    pub output: PathBuf,
    pub route_paths: PathBuf,
    pub link_stats: PathBuf,
    pub link_monitor: PathBuf,
    pub sim_time_sec: f64,
    pub monitor_interval_sec: f64,
    pub packet_size_bytes: u32,
    pub queue_size_packets: usize,
    pub on_time_mean_sec: f64,
    pub off_time_mean_sec: f64,
    pub start_port: u16,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            link_params: PathBuf::from("data/input/link_params.csv"),
            demands: PathBuf::from("data/input/traffic_demands.csv"),
            output: PathBuf::from("data/output/flow_results.csv"),
            route_paths: PathBuf::from("data/output/route_paths.csv"),
            link_stats: PathBuf::from("data/output/link_stats.csv"),
            link_monitor: PathBuf::from("data/output/link_monitor.csv"),
            sim_time_sec: 10.0,
            monitor_interval_sec: 0.1,
            packet_size_bytes: 1024,
            queue_size_packets: 500,
            on_time_mean_sec: 1.0,
            off_time_mean_sec: 0.5,
            start_port: 9000,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn stop_time(&self) -> SimTime {
        SimTime::from_secs_f64(self.sim_time_sec)
    }

    /// Zero or negative intervals fall back to the default cadence.
    pub fn monitor_interval(&self) -> Duration {
        if self.monitor_interval_sec.is_finite() && self.monitor_interval_sec > 0.0 {
            Duration::from_secs_f64(self.monitor_interval_sec)
        } else {
            Duration::from_millis(100)
        }
    }

    pub fn channel(&self) -> ChannelConfig {
        ChannelConfig {
            queue_packets: self.queue_size_packets,
        }
    }

    pub fn source_profile(&self) -> SourceProfile {
        SourceProfile {
            packet_size: self.packet_size_bytes,
            on_mean: secs_or_zero(self.on_time_mean_sec),
            off_mean: secs_or_zero(self.off_time_mean_sec),
        }
    }
}

fn secs_or_zero(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
