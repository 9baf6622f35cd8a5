mod logging;
mod terminal;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use tminus_core::project::{
    parse_offset, parse_target, resolve_target, EventManifest, MANIFEST_FILE_NAME,
};
use tminus_core::runtime::TokioTimers;
use tminus_core::system::{Clock, SystemClock};
use tminus_core::{time_difference, Countdown};

use crate::terminal::TerminalBoard;

#[derive(Parser)]
#[command(name = "tminus", about = "Event countdowns in the terminal")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the time remaining until a target instant.
    Delta {
        /// Target instant, e.g. 2025-10-07T08:00:00-03:00.
        #[arg(long)]
        target: String,
        /// Reference instant (defaults to the current time).
        #[arg(long)]
        now: Option<String>,
        /// Offset applied to target/now strings without one, e.g. -03:00.
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<String>,
        /// Print JSON instead of DD:HH:MM:SS.
        #[arg(long)]
        json: bool,
    },
    /// Run a live countdown until the target is reached.
    Run {
        /// Event manifest (defaults to ./tminus.json, then the user config dir).
        #[arg(long, conflicts_with = "target")]
        manifest: Option<PathBuf>,
        /// Ad-hoc target instant instead of a manifest.
        #[arg(long)]
        target: Option<String>,
        /// Offset for a naive --target.
        #[arg(long, allow_hyphen_values = true, requires = "target")]
        utc_offset: Option<String>,
        /// Override the tick period in milliseconds.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        period_ms: Option<u64>,
    },
    /// Write a starter manifest.
    Init {
        /// Where to write it.
        #[arg(long, default_value = MANIFEST_FILE_NAME)]
        path: PathBuf,
        /// Event name.
        #[arg(long, default_value = "Launch event")]
        name: String,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Delta {
            target,
            now,
            utc_offset,
            json,
        } => cmd_delta(&target, now.as_deref(), utc_offset.as_deref(), json),
        Command::Run {
            manifest,
            target,
            utc_offset,
            period_ms,
        } => {
            let mut manifest = match target {
                Some(target) => {
                    let mut m = EventManifest::new("ad-hoc", target);
                    m.utc_offset = utc_offset;
                    m
                }
                None => load_manifest(manifest.as_deref())?,
            };
            if let Some(period_ms) = period_ms {
                manifest.period_ms = period_ms;
            }
            cmd_run(manifest)
        }
        Command::Init { path, name, force } => cmd_init(&path, name, force),
    }
}

fn cmd_delta(target: &str, now: Option<&str>, utc_offset: Option<&str>, json: bool) -> Result<()> {
    let offset = parse_offset(utc_offset.unwrap_or("Z"))?;
    let target = resolve_target(target, offset);
    let now = match now {
        Some(s) => parse_target(s, offset).with_context(|| format!("invalid --now instant {s:?}"))?,
        None => SystemClock.now(),
    };

    let delta = time_difference(target, now);
    if json {
        println!("{}", serde_json::to_string_pretty(&delta)?);
    } else {
        println!("{delta}");
    }
    Ok(())
}

fn cmd_run(manifest: EventManifest) -> Result<()> {
    let target = manifest
        .target_instant()
        .with_context(|| format!("resolving target of {:?}", manifest.name))?;
    let options = manifest.countdown_options();
    let period = options.period;
    tracing::info!(event = %manifest.name, target_at = %format_instant(target), "starting countdown");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async move {
        let timers = Rc::new(TokioTimers::new());
        let mut countdown = Countdown::start_with(
            Rc::new(timers.clock()),
            timers.clone(),
            target,
            Box::new(TerminalBoard::new(manifest.slots.clone())),
            options,
        );

        let finished = async {
            while countdown.is_running() {
                tokio::time::sleep(period).await;
            }
        };
        tokio::select! {
            _ = finished => {
                tracing::info!(event = %manifest.name, "target reached");
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                tracing::info!(ticks = countdown.ticks(), "interrupted");
            }
        }
        countdown.stop();
        Ok::<(), anyhow::Error>(())
    })
}

fn cmd_init(path: &Path, name: String, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let target = SystemClock.now() + chrono::Duration::days(7);
    let manifest = EventManifest::new(name, format_instant(target));
    manifest
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote manifest");
    Ok(())
}

/// `--manifest`, else `./tminus.json`, else `<config_dir>/tminus/event.json`.
fn load_manifest(explicit: Option<&Path>) -> Result<EventManifest> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_manifest().context(
            "no manifest found (pass --manifest or --target, or run `tminus init`)",
        )?,
    };
    tracing::debug!(path = %path.display(), "loading manifest");
    EventManifest::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn find_manifest() -> Option<PathBuf> {
    let local = PathBuf::from(MANIFEST_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("tminus").join("event.json");
    user.is_file().then_some(user)
}

fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
