//! ada-pointer - replay hand landmark traces through the gesture pointer.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use ada_pointer::geometry::Viewport;
use ada_pointer::hand::mapper::{SmoothingMode, LERP_FACTOR};
use ada_pointer::headless::{self, HeadlessConfig, HeadlessSession};
use anyhow::Context;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ada-pointer", about = "Gesture-driven virtual pointer (headless replay)")]
struct Cli {
    /// Trace file with one s-expression message per line (default: stdin)
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Viewport size as WxH
    #[arg(long, default_value = "1920x1080")]
    viewport: String,

    /// Initial sensitivity (1.0 - 5.0)
    #[arg(long, default_value_t = 2.0)]
    sensitivity: f32,

    /// Start with layout edit mode enabled
    #[arg(long)]
    layout_edit: bool,

    /// Cursor smoothing: per-frame or time-scaled
    #[arg(long, default_value = "per-frame")]
    smoothing: String,

    /// Time constant for time-scaled smoothing, in milliseconds
    #[arg(long, default_value_t = 50.0)]
    tau_ms: f64,

    /// Log all IPC messages
    #[arg(long)]
    ipc_trace: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("ada-pointer {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries responses and events.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ada_pointer=info".into()),
        )
        .init();

    info!("ada-pointer v{} starting", env!("CARGO_PKG_VERSION"));

    let viewport = Viewport::parse(&cli.viewport)
        .with_context(|| format!("invalid --viewport {:?}, expected WxH", cli.viewport))?;

    let smoothing = match cli.smoothing.as_str() {
        "per-frame" => SmoothingMode::PerFrame {
            factor: LERP_FACTOR,
        },
        "time-scaled" => {
            anyhow::ensure!(cli.tau_ms > 0.0, "--tau-ms must be positive");
            SmoothingMode::TimeScaled { tau_ms: cli.tau_ms }
        }
        other => anyhow::bail!("unknown smoothing mode: {other}. Use: per-frame or time-scaled"),
    };

    let mut config = HeadlessConfig {
        viewport,
        sensitivity: cli.sensitivity,
        layout_edit: cli.layout_edit,
        ..HeadlessConfig::default()
    };
    config.engine.mapper.smoothing = smoothing;

    let mut session = HeadlessSession::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let stats = match &cli.trace {
        Some(path) => {
            info!("replaying {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("opening trace {}", path.display()))?;
            headless::run(&mut session, BufReader::new(file), &mut out, cli.ipc_trace)?
        }
        None => {
            info!("reading messages from stdin");
            headless::run(&mut session, io::stdin().lock(), &mut out, cli.ipc_trace)?
        }
    };

    if stats.errors > 0 {
        info!("{} message(s) were rejected", stats.errors);
    }
    Ok(())
}
