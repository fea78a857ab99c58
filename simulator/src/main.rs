use anyhow::Context;
use bridge::hub::{self, EventHub};
use bridge::model::LookoutRegistry;
use clap::Parser;
use log::{error, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SimulatorConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic RoadLens backend for dashboard development")]
struct Args {
    /// Generate a batch of envelopes offline and append them to --output
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a simulator config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long)]
    bind: Option<SocketAddr>,
    #[arg(long)]
    interval_ms: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Events generated by --offline
    #[arg(long, default_value_t = 50)]
    count: usize,
    #[arg(long, default_value = "tools/data/offline_events.log")]
    output: PathBuf,
    /// Serve the websocket hub and stream events until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.workflow {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    }
    .with_overrides(args.bind, args.interval_ms, args.seed);
    let runner = Runner::new(config.clone());

    if args.offline {
        let report = runner.offline(args.count)?;
        let breakdown: Vec<String> = report
            .per_category
            .iter()
            .map(|(category, count)| format!("{}={}", category, count))
            .collect();
        println!(
            "Offline run -> envelopes {}, potholes held {}, traffic ticks {} [{}]",
            report.envelopes.len(),
            report.store.pothole.len(),
            report.store.traffic_control.len(),
            breakdown.join(", ")
        );

        if let Some(parent) = args.output.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.output)
            .with_context(|| format!("opening {}", args.output.display()))?;
        for envelope in &report.envelopes {
            writeln!(file, "{}", envelope)?;
        }
    }

    if args.serve {
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the event hub")?;
        runtime.block_on(async {
            let event_hub = Arc::new(EventHub::new(LookoutRegistry::new(config.lookout.clone())));
            let shutdown = async {
                if let Err(err) = signal::ctrl_c().await {
                    error!("awaiting Ctrl+C failed: {}", err);
                }
            };
            let (addr, server) = hub::bind(event_hub.clone(), config.bind, shutdown)?;
            info!("event hub listening on ws://{}/ws (Ctrl+C to stop)", addr);

            tokio::select! {
                _ = server => {}
                _ = runner.run(event_hub) => {}
            }
            info!("event hub stopped");
            Ok::<(), anyhow::Error>(())
        })?;
    }

    if !args.offline && !args.serve {
        println!("Nothing to do: pass --serve and/or --offline");
    }

    Ok(())
}
