use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use ris2bmp::bridge::{Dispatcher, Forwarder};
use ris2bmp::config::{self, Config};
use ris2bmp::ris::{open_stream, LineSource};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Opt {
    /// TOML configuration file
    #[arg(short, long, value_parser)]
    config: Option<PathBuf>,

    /// RIS Live stream URL
    #[arg(long)]
    stream: Option<String>,

    /// IP or DNS address and port of the BMP collector
    #[arg(long)]
    bmp_server: Option<String>,

    /// BGP ID to use in BMP messages
    #[arg(long)]
    bgp_id: Option<String>,

    #[arg(long)]
    max_in_flight: Option<usize>,

    #[arg(long)]
    queue_depth: Option<usize>,
}

impl Opt {
    fn overrides(&self) -> Config {
        Config {
            stream: self.stream.clone(),
            bmp_server: self.bmp_server.clone(),
            bgp_id: self.bgp_id.clone(),
            max_in_flight: self.max_in_flight,
            queue_depth: self.queue_depth,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let file = match &opt.config {
        Some(path) => config::read_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let settings = file
        .merge(opt.overrides())
        .settings()
        .context("Invalid configuration")?;
    log::debug!("settings: {:?}", settings);

    let url = settings.stream.clone();
    let body = tokio::task::spawn_blocking(move || open_stream(&url))
        .await?
        .context("Failed to connect to RIS source")?;

    let forwarder = Forwarder::connect(&settings.bmp_server, settings.queue_depth)
        .await
        .context("Failed to connect to destination")?;

    let mut source = LineSource::spawn(body, settings.queue_depth)?;
    let mut dispatcher = Dispatcher::new(settings.bgp_id, settings.max_in_flight);
    let e = dispatcher.run(&mut source, forwarder).await;

    let stats = dispatcher.stats();
    log::error!(
        "bridge stopped after {} updates forwarded, {} records skipped",
        stats.forwarded,
        stats.skipped
    );
    Err(e).context("Bridge stopped")
}
