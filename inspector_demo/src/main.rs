use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use inspector_ui::capture::{DirectorySink, ExportFormat, ExportOutcome, ExportSink, SharedCapture};
use inspector_ui::hooks::{acquire_modules, list_modules, EventCapture, HookSet};
use inspector_ui::viewer::{ExpansionPath, Value, Viewer};
use inspector_ui::{logging, InspectorConfig, Panel};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

mod host;

use host::SimulatedHost;

#[derive(Parser)]
#[command(name = "inspector-demo")]
#[command(about = "Drive the inspector against a simulated client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal panel while the client runs
    Panel {
        /// Milliseconds between simulated traffic rounds
        #[arg(short, long, default_value_t = 500)]
        interval: u64,
    },
    /// Run a number of rounds, print a summary and optionally export
    Headless {
        #[arg(short, long, default_value_t = 10)]
        rounds: u32,

        /// Export format (json, txt, csv)
        #[arg(short, long)]
        export: Option<String>,

        /// Export directory, overriding the configuration
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => InspectorConfig::from_file(path)?,
        None => InspectorConfig::default(),
    };
    let logs = SharedCapture::new(config.log_buffer()?);
    let events = SharedCapture::new(config.event_buffer()?);

    let headless = matches!(cli.command, Commands::Headless { .. });
    logging::init_tracing(Some(logs.clone()), headless)
        .map_err(|e| anyhow!("failed to set up tracing: {}", e))?;

    let mut host = SimulatedHost::new();

    // The host hands its module system over asynchronously, as a bundler callback would
    let (handover, receiver) = oneshot::channel();
    let modules = host.modules();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = handover.send(modules);
    });
    let modules = acquire_modules(None, Some(receiver))
        .await
        .context("host exposed no module system")?;

    let mut hooks = HookSet::install_standard(modules.as_ref(), logs.clone());
    let mode = EventCapture::install(Some(&host.bus), None, events.clone());
    tracing::info!(hooks = ?hooks.installed(), ?mode, "inspector attached");

    match cli.command {
        Commands::Panel { interval } => {
            let panel = Panel::new(logs.clone(), events.clone(), &config).with_modules(modules.clone());
            let shutdown = Arc::new(AtomicBool::new(false));
            let mut ui = tokio::task::spawn_blocking(move || panel.run(shutdown));
            let mut ticker = tokio::time::interval(Duration::from_millis(interval));

            loop {
                tokio::select! {
                    result = &mut ui => {
                        result??;
                        break;
                    }
                    _ = ticker.tick() => host.step(),
                }
            }
        }
        Commands::Headless { rounds, export, out } => {
            for _ in 0..rounds {
                host.step();
            }
            for entry in list_modules(modules.as_ref()) {
                println!("module {}: {}", entry.id, entry.exports.join(", "));
            }
            print_summary(&logs, &events, &config)?;

            if let Some(format) = export {
                let format: ExportFormat = format.parse()?;
                let sink = DirectorySink::new(out.unwrap_or_else(|| config.capture.export_dir.clone()));
                for capture in [&logs, &events] {
                    match capture.export(format)? {
                        ExportOutcome::Empty => println!("nothing to export"),
                        ExportOutcome::Ready(artifact) => {
                            println!("exported {}", sink.deliver(&artifact)?.display())
                        }
                    }
                }
            }
        }
    }

    hooks.stop();
    Ok(())
}

fn print_summary(logs: &SharedCapture, events: &SharedCapture, config: &InspectorConfig) -> Result<()> {
    println!("logs:   {}", serde_json::to_string(&logs.stats())?);
    println!("events: {}", serde_json::to_string(&events.stats())?);
    println!("status: {}", serde_json::to_string_pretty(&logs.status())?);

    let Some(latest) = events.list().into_iter().find(|r| r.label.as_deref() == Some("chat.active_chat")) else {
        return Ok(());
    };
    println!("\nlatest chat.active_chat event:");
    let viewer = Viewer::new(Value::array(latest.payload), config.render_options())
        .with_drill_step(config.viewer.drill_step)
        .toggle(&ExpansionPath::parse("0"))
        .toggle(&ExpansionPath::parse("0.collection"));
    for row in viewer.tree().rows() {
        println!("{}", row.display());
    }
    Ok(())
}
