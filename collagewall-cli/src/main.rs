use clap::{Parser, Subcommand};
use collagewall_common::{
    parse_duration, ApplyReport, CommandSetter, ConfiguredMonitors, Engine, ErrorReporting,
    FitMode, SelectionMode,
};
use collagewall_config::Config;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::interval;

#[derive(Parser)]
#[command(name = "collagewall")]
#[command(about = "collagewall (multi-image collage wallpaper changer)")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose and apply a collage once
    Apply {
        /// Selection mode: random or sequential
        #[arg(long)]
        selection: Option<SelectionMode>,

        /// Number of images per collage (1-8)
        #[arg(long)]
        collage_count: Option<usize>,

        /// Fit mode: fill, fit, stretch, center or span
        #[arg(long)]
        fit_mode: Option<FitMode>,

        /// Use the same collage on every monitor
        #[arg(long)]
        same_for_all: bool,

        /// Crossfade from the previous collage
        #[arg(long)]
        fade: bool,
    },

    /// Apply on a timer until interrupted
    Watch {
        /// Override the configured interval (e.g. "90s", "10m")
        #[arg(long)]
        interval: Option<String>,
    },
}

type CliEngine = Engine<ConfiguredMonitors, CommandSetter>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e.user_friendly_message()))?;

    match cli.command {
        Commands::Apply {
            selection,
            collage_count,
            fit_mode,
            same_for_all,
            fade,
        } => {
            let engine = build_engine(
                &config,
                selection,
                collage_count,
                fit_mode,
                same_for_all,
                fade,
            )?;

            let report = tokio::task::spawn_blocking(move || engine.apply())
                .await?
                .map_err(|e| anyhow::anyhow!("{}", e.user_friendly_message()))?;

            print_report(&report);
            if report.nothing_applied() {
                std::process::exit(1);
            }
        }

        Commands::Watch { interval } => {
            let every = match interval {
                Some(s) => parse_duration(&s)?,
                None => config.general.interval,
            };
            let engine = build_engine(&config, None, None, None, false, false)?;
            watch_loop(engine, every).await;
        }
    }

    Ok(())
}

fn build_engine(
    config: &Config,
    selection: Option<SelectionMode>,
    collage_count: Option<usize>,
    fit_mode: Option<FitMode>,
    same_for_all: bool,
    fade: bool,
) -> anyhow::Result<CliEngine> {
    let mut options = config
        .apply_options()
        .map_err(|e| anyhow::anyhow!("{}", e.user_friendly_message()))?;

    if let Some(mode) = selection {
        options.selection = mode;
    }
    if let Some(count) = collage_count {
        if !(1..=8).contains(&count) {
            anyhow::bail!("collage-count must be between 1 and 8 (got {})", count);
        }
        options.collage.count = count;
    }
    if let Some(mode) = fit_mode {
        options.collage.fit_mode = mode;
    }
    if same_for_all {
        options.collage.same_for_all = true;
    }
    if fade {
        options.fade_in = true;
    }

    Ok(Engine::new(
        config.monitor_source(),
        config.command_setter(),
        options,
    ))
}

/// Applies once immediately, then reapplies every `every` until Ctrl-C.
/// A slow apply never stacks: cycles that find the engine busy are
/// skipped.
async fn watch_loop(engine: CliEngine, every: Duration) {
    log::info!("Watching: applying every {:?}", every);

    let engine = Arc::new(Mutex::new(engine));
    let mut ticker = interval(Duration::from_secs(1));
    let mut last_apply = Instant::now();

    run_apply(&engine).await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if last_apply.elapsed() >= every {
                    last_apply = Instant::now();
                    run_apply(&engine).await;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }
}

async fn run_apply(engine: &Arc<Mutex<CliEngine>>) {
    let engine = Arc::clone(engine);
    let result = tokio::task::spawn_blocking(move || {
        let guard = match engine.try_lock() {
            Ok(guard) => guard,
            Err(_) => return None,
        };
        Some(guard.apply())
    })
    .await;

    match result {
        Ok(Some(Ok(report))) => print_report(&report),
        Ok(Some(Err(e))) => eprintln!("✗ {}", e.user_friendly_message()),
        Ok(None) => log::warn!("Previous apply still running, skipping this cycle"),
        Err(e) => log::error!("Apply task panicked: {}", e),
    }
}

fn print_report(report: &ApplyReport) {
    for (monitor, path) in &report.applied {
        println!("✓ {}: {}", monitor, path.display());
    }
    for failure in &report.failures {
        eprintln!("✗ {}", failure);
    }
    if report.blank_cells > 0 {
        println!(
            "! {} collage cell(s) left blank (not enough images)",
            report.blank_cells
        );
    }
}
