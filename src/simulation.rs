use anyhow::{Context, Result, bail};
use log::info;

use crate::config::SimConfig;
use crate::engine::Engine;
use crate::engine::des::DesEngine;
use crate::input;
use crate::network::Topology;
use crate::report;
use crate::scheduler::TrafficScheduler;
use crate::stats::{RunSummary, StatisticsCollector};

/// One complete run: load inputs, build and bind the topology, route every
/// demand, run the engine and write the reports.
pub struct Simulation {
    config: SimConfig,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs on the bundled discrete-event engine seeded from the config.
    pub fn run(&self) -> Result<RunSummary> {
        let mut engine = DesEngine::new(self.config.seed);
        self.run_on(&mut engine)
    }

    pub fn run_on<E: Engine>(&self, engine: &mut E) -> Result<RunSummary> {
        let config = &self.config;

        let links = input::load_links(&config.link_params)?;
        if links.is_empty() {
            bail!("no links loaded from {}", config.link_params.display());
        }
        let demands = input::load_demands(&config.demands)?;
        if demands.is_empty() {
            bail!("no demands loaded from {}", config.demands.display());
        }

        let mut topology = Topology::from_links(links);
        if topology.links().is_empty() {
            bail!("no usable links in {}", config.link_params.display());
        }
        info!(
            "Topology: {} nodes, {} links",
            topology.node_count(),
            topology.links().len()
        );

        let mut collector = StatisticsCollector::new();
        topology.bind(engine, &mut collector, &config.channel())?;

        let stop = config.stop_time();
        let mut scheduler =
            TrafficScheduler::new(config.source_profile(), stop, config.start_port);
        let routes = scheduler.schedule_all(&topology, engine, &demands)?;
        report::write_routes(report::create(&config.route_paths)?, &routes)
            .with_context(|| format!("cannot write {}", config.route_paths.display()))?;

        let sampler = collector
            .queue_sampler(report::create(&config.link_monitor)?)
            .with_context(|| format!("cannot write {}", config.link_monitor.display()))?;
        engine.schedule_periodic(config.monitor_interval(), sampler.into_task());

        info!("Starting simulation for {}s", stop);
        engine.run(stop);

        let flows = collector.flow_reports(&engine.flow_stats(), &topology);
        report::write_flows(report::create(&config.output)?, &flows)
            .with_context(|| format!("cannot write {}", config.output.display()))?;
        report::write_links(report::create(&config.link_stats)?, &collector.link_reports())
            .with_context(|| format!("cannot write {}", config.link_stats.display()))?;

        let summary = RunSummary::from_flows(&flows);
        info!("Run complete: {}", summary);
        Ok(summary)
    }
}
