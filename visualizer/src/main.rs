use anyhow::Context;
use clap::Parser;
use config::DashboardConfig;
use std::path::PathBuf;
use trackcore::client::BackendClient;

mod app;
mod canvas;
mod config;
mod headless;

#[derive(Parser)]
#[command(author, version, about = "BLE tracking dashboard")]
struct Args {
    /// Load the dashboard config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "http://127.0.0.1:5050")]
    backend: String,
    /// Poll period for every backend feed, in milliseconds
    #[arg(long, default_value_t = 500)]
    period_ms: u64,
    /// Poll and log view refreshes without opening a window
    #[arg(long, default_value_t = false)]
    headless: bool,
    /// With --headless, run a single poll cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        DashboardConfig::load(path)?
    } else {
        DashboardConfig::from_args(args.backend, args.period_ms)
    };
    let client = BackendClient::new(config.backend_url.clone(), config.request_timeout())
        .with_context(|| format!("creating HTTP client for {}", config.backend_url))?;

    if args.headless {
        return headless::run(config, client, args.once);
    }

    app::run(config, client).map_err(|err| anyhow::anyhow!("running dashboard window: {err}"))?;
    Ok(())
}
