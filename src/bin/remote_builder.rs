//! Remote builder replay tool
//!
//! Loads a trigger configuration, feeds message bodies through a
//! `RemoteBuildListener` as if they had arrived on a queue, and prints every
//! scheduled build as one JSON line.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use remote_builder::{
    ApplicationMessageListener, BuildScheduler, BuildTrigger, ChannelScheduler, DispatchOutcome,
    RemoteBuildListener, RemoteBuilderConfig, CONTENT_TYPE_JSON,
};

#[derive(Parser)]
#[command(name = "remote-builder")]
#[command(version, about = "Replay remote build messages against a trigger configuration.")]
struct Args {
    /// Trigger configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Queue name reported to the triggers
    #[arg(short, long, default_value = "remote-build")]
    queue: String,

    /// Content type attached to every message
    #[arg(long, default_value = CONTENT_TYPE_JSON)]
    content_type: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Message body files; reads one body from stdin when none are given
    messages: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = RemoteBuilderConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let channel = Arc::new(ChannelScheduler::new(config.schedule_queue_capacity));
    let scheduler: Arc<dyn BuildScheduler> = channel.clone();

    let listener = RemoteBuildListener::new();
    for trigger in config.build_triggers(&scheduler) {
        listener.add_trigger(trigger as Arc<dyn BuildTrigger>);
    }
    info!(triggers = listener.triggers().len(), "loaded trigger configuration");

    let bodies = read_bodies(&args.messages)?;

    listener.on_bind(&args.queue);
    let mut scheduled = 0;
    for (source, body) in &bodies {
        let outcome = listener.dispatch(&args.queue, &args.content_type, body);
        if let DispatchOutcome::Rejected(err) = &outcome {
            info!(source = %source, error = %err, "message dropped");
        }
        scheduled += outcome.scheduled();
    }
    listener.on_unbind(&args.queue);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for build in channel.drain() {
        serde_json::to_writer(&mut out, &build)?;
        writeln!(out)?;
    }

    info!(
        messages = bodies.len(),
        scheduled,
        dropped = channel.dropped_builds(),
        "replay finished"
    );
    Ok(())
}

fn read_bodies(paths: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>> {
    if paths.is_empty() {
        let mut body = Vec::new();
        io::stdin().read_to_end(&mut body).context("reading message from stdin")?;
        return Ok(vec![("<stdin>".to_string(), body)]);
    }

    paths
        .iter()
        .map(|path| {
            let body = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok((path.display().to_string(), body))
        })
        .collect()
}
