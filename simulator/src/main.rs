use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use store::{shared, BackendState, ReceiverRegistry};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SimulatorConfig;
use workflow::runner::ScanRunner;

mod generator;
mod server;
mod store;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Development backend serving synthetic BLE scans")]
struct Args {
    /// Load the simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "127.0.0.1:5050")]
    bind: SocketAddr,
    /// JSON file holding the placed receivers
    #[arg(long, default_value = "data/receivers.json")]
    receivers_file: PathBuf,
    #[arg(long, default_value_t = 8)]
    senders: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Generator tick, overriding the config file when given
    #[arg(long)]
    tick_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config {
        SimulatorConfig::load(path)?
    } else {
        SimulatorConfig::from_args(args.bind, args.receivers_file, args.senders, args.seed)
    };
    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms;
    }

    let registry = ReceiverRegistry::load(&config.receivers_file)?;
    let state = shared(BackendState::new(registry, config.locator));
    let runner = ScanRunner::new(&config, state.clone());
    let seeded = runner.seed_receivers(config.seed_receivers)?;
    if seeded > 0 {
        warn!(
            "no saved receivers in {}, placed {} on the default layout",
            config.receivers_file.display(),
            seeded
        );
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating simulator runtime")?;
    runtime.block_on(async move {
        let (addr, server) = server::bind(state, config.bind)?;
        info!(
            "serving dashboard API on http://{} with {} synthetic senders",
            addr, config.generator.senders
        );
        tokio::select! {
            _ = server => {}
            _ = runner.run() => {}
            result = signal::ctrl_c() => {
                result.context("awaiting Ctrl+C to exit")?;
                info!("shutting down");
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
