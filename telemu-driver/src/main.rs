mod commands;
mod report;
mod runner;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use telemu_engine::{EmulatorConfig, GraphDocument, GraphSource, SharedEmulator, build_emulator};
use thiserror::Error;

use report::OutputTarget;
use runner::{RunOptions, run, stdin_lines};

#[derive(Debug, Parser)]
#[command(name = "telemu-driver", version)]
#[command(about = "Drives an emulated vehicle over a road graph and streams its telemetry")]
struct Args {
    /// Road graph JSON document
    #[arg(long, env = "TELEMU_MAP", default_value = "assets/map.json")]
    map: PathBuf,

    /// Optional emulator configuration JSON file
    #[arg(long, env = "TELEMU_CONFIG")]
    config: Option<PathBuf>,

    /// Seed overriding the configuration file
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long, default_value_t = 400)]
    interval_ms: u64,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Emit a stats record every N ticks
    #[arg(long)]
    report_every: Option<u64>,

    /// Directory holding `wiper` and `intensity` override files
    #[arg(long, env = "TELEMU_PARAMS_DIR")]
    params_dir: Option<PathBuf>,

    #[arg(long, env = "DRIVER_UUID", default_value = "NoDriverUUID")]
    driver_uuid: String,

    #[arg(long, env = "VEHICLE_VIN", default_value = "")]
    vin: String,

    /// Write stats records to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not read commands from stdin
    #[arg(long)]
    no_stdin: bool,
}

#[derive(Debug, Error)]
enum MapError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Road graph read from a JSON file on disk.
struct FileGraphSource {
    path: PathBuf,
}

impl GraphSource for FileGraphSource {
    type Error = MapError;

    fn load_document(&self) -> Result<GraphDocument, Self::Error> {
        let path = self.path.display().to_string();
        let text = fs::read_to_string(&self.path).map_err(|source| MapError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| MapError::Parse { path, source })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.interval_ms == 0 {
        bail!("--interval-ms must be positive");
    }

    announce_banner();

    let config = load_config(&args)?;
    let source = FileGraphSource {
        path: args.map.clone(),
    };
    let mut emulator = build_emulator(&source, &config)
        .map_err(|err| anyhow::anyhow!(err))
        .context("failed to build emulator")?;
    if let Some(dir) = &args.params_dir {
        emulator.watch_overrides(dir);
    }

    let location = emulator.location();
    eprintln!(
        "{} {} vertices, starting at {:.6}, {:.6}",
        "🗺️  Map loaded:".bright_green(),
        emulator.graph().len(),
        location.latitude,
        location.longitude
    );

    let shared = SharedEmulator::new(emulator);
    let commands = if args.no_stdin {
        None
    } else {
        Some(stdin_lines()?)
    };
    let output = OutputTarget::new(args.output.clone())?;
    let options = RunOptions {
        interval: Duration::from_millis(args.interval_ms),
        ticks: args.ticks,
        report_every: args.report_every,
        driver: args.driver_uuid,
        vin: args.vin,
    };

    let summary = run(shared, options, commands, output).await?;
    eprintln!(
        "{} {} ticks, {} records",
        "🏁 Finished:".bright_cyan(),
        summary.ticks,
        summary.records
    );
    Ok(())
}

fn announce_banner() {
    eprintln!("{}", "🚗 Telemetry Emulator".bright_cyan().bold());
    eprintln!("{}", "=====================".cyan());
}

fn load_config(args: &Args) -> Result<EmulatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EmulatorConfig::from_json(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => EmulatorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate().context("invalid emulator configuration")?;
    Ok(config)
}
