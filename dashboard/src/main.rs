use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::DashboardConfig;
use log::info;
use lookout::LookoutClient;
use roadlenscore::{Category, Endpoints, LookoutAction, Synchronizer};
use std::path::PathBuf;
use std::time::Duration;
use summary::{offline_line, summary_line};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod config;
mod lookout;
mod summary;

#[derive(Parser)]
#[command(author, version, about = "Console view of the RoadLens detection stream")]
struct Cli {
    /// Load dashboard settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend host and port, without scheme
    #[arg(long, env = "ROADLENS_SERVER_DOMAIN")]
    server_domain: Option<String>,
    /// Use wss/https
    #[arg(long, default_value_t = false)]
    secure: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the event channel and print a line per snapshot change
    Watch,
    /// Add or remove a lookout vehicle or person
    Lookout {
        #[arg(value_enum)]
        action: LookoutArg,
        value: String,
    },
    /// Print the live video address for a detection category
    StreamUrl { category: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum LookoutArg {
    AddVehicle,
    RemoveVehicle,
    AddPerson,
    RemovePerson,
}

impl From<LookoutArg> for LookoutAction {
    fn from(arg: LookoutArg) -> Self {
        match arg {
            LookoutArg::AddVehicle => LookoutAction::AddVehicle,
            LookoutArg::RemoveVehicle => LookoutAction::RemoveVehicle,
            LookoutArg::AddPerson => LookoutAction::AddPerson,
            LookoutArg::RemovePerson => LookoutAction::RemovePerson,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    }
    .with_overrides(cli.server_domain.clone(), cli.secure);

    match cli.command {
        Command::StreamUrl { category } => {
            let category: Category = category.parse()?;
            let endpoints = Endpoints::from_config(&config.sync)?;
            println!("{}", endpoints.stream_video_url(category));
            Ok(())
        }
        Command::Lookout { action, value } => {
            let runtime = runtime()?;
            runtime.block_on(send_lookout(&config, action.into(), &value))
        }
        Command::Watch => {
            let runtime = runtime()?;
            runtime.block_on(watch(&config))
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating dashboard runtime")
}

async fn send_lookout(
    config: &DashboardConfig,
    action: LookoutAction,
    value: &str,
) -> anyhow::Result<()> {
    let endpoints = Endpoints::from_config(&config.sync)?;
    let client = LookoutClient::new(endpoints, config.request_timeout())?;
    let message = client
        .send(action, value)
        .await
        .with_context(|| format!("calling {}", action.path()))?;
    println!("{}", message);
    Ok(())
}

async fn watch(config: &DashboardConfig) -> anyhow::Result<()> {
    let sync = Synchronizer::from_config(&config.sync).context("building synchronizer")?;
    let _printer = sync.subscribe(|snapshot| println!("{}", summary_line(snapshot)));
    sync.connect().context("opening event channel")?;
    info!("watching {} (Ctrl+C to stop)", config.sync.server_domain);

    let retry_delay = sync.retry_delay();
    let mut offline_ticker = tokio::time::interval(retry_delay.max(Duration::from_secs(1)));
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("awaiting Ctrl+C")?;
                break;
            }
            _ = offline_ticker.tick() => {
                if !sync.phase().is_connected() {
                    println!("{}", offline_line(retry_delay));
                }
            }
        }
    }

    sync.disconnect();
    let metrics = sync.metrics();
    info!(
        "stopped after {} connection attempt(s): applied={} ignored={} dropped={}",
        metrics.attempts, metrics.applied, metrics.ignored, metrics.dropped
    );
    Ok(())
}
