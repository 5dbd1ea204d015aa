//! Simulator entry point: configuration layering and server start-up.

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use meter_light_sim::api::forward::DeviceForwarder;
use meter_light_sim::api::{self, AppState};
use meter_light_sim::cli;
use meter_light_sim::config::SimulatorConfig;
use meter_light_sim::sim::clock::SystemClock;
use meter_light_sim::sim::context::SimContext;
use meter_light_sim::sim::random::SimRng;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// File, then environment, then command line.
fn load_config(opts: &cli::CliOptions) -> anyhow::Result<SimulatorConfig> {
    let mut cfg = match &opts.config {
        Some(path) => SimulatorConfig::from_toml_file(path)?,
        None => SimulatorConfig::default(),
    };
    cfg.apply_env(|key| std::env::var(key).ok())?;
    opts.apply(&mut cfg);

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let opts = cli::parse_args().map_err(|e| {
        cli::print_usage();
        anyhow::anyhow!(e)
    })?;
    let cfg = load_config(&opts)?;

    let options = cfg.sim_options()?;
    info!(
        scenario = %options.scenario,
        lights = options.light_ids.len(),
        seed = ?cfg.simulation.seed,
        "starting simulation"
    );
    let sim = SimContext::new(
        options,
        Box::new(SimRng::new(cfg.simulation.seed)),
        Box::new(SystemClock),
    );

    let forwarder = match &cfg.device.forward_url {
        Some(url) => {
            info!(%url, "forwarding light requests to device");
            Some(DeviceForwarder::new(url).context("building device client")?)
        }
        None => None,
    };

    let addr = cfg.socket_addr()?;
    api::serve(Arc::new(AppState::new(sim, forwarder)), addr)
        .await
        .with_context(|| format!("serving on {addr}"))
}
