use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use satnet_routing::{SimConfig, Simulation};

#[derive(Parser)]
#[command(name = "satnet-routing")]
#[command(about = "Routes traffic demands over a satellite topology and simulates them")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    link_params: Option<PathBuf>,

    #[arg(long)]
    demands: Option<PathBuf>,

    /// Flow results CSV
    #[arg(long)]
    output: Option<PathBuf>,

    /// Simulated duration in seconds
    #[arg(long)]
    sim_time: Option<f64>,
}

impl Cli {
    fn into_config(self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(path) = self.link_params {
            config.link_params = path;
        }
        if let Some(path) = self.demands {
            config.demands = path;
        }
        if let Some(path) = self.output {
            config.output = path;
        }
        if let Some(secs) = self.sim_time {
            config.sim_time_sec = secs;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;
    info!(
        "Links: {}, demands: {}, duration: {}s",
        config.link_params.display(),
        config.demands.display(),
        config.sim_time_sec
    );

    Simulation::new(config).run()?;
    Ok(())
}
