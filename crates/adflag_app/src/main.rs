//! adflag - command-line advert break flagger.
//!
//! Thin wrapper around `adflag_core`: parses arguments, loads configuration,
//! sets up logging, wires the store and notification channel, and runs one
//! flagging job. Exit code 0 on success, 1 on any fatal error.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use adflag_core::config::ConfigManager;
use adflag_core::models::parse_start_time;
use adflag_core::notify::TcpChannel;
use adflag_core::runner::{self, RunIdentity, RunRequest};
use adflag_core::store::JsonStore;

/// Flag advert breaks in a recording from audio silence.
#[derive(Parser, Debug)]
#[command(name = "adflag", version, about = "Flag advert breaks from audio silence")]
struct Cli {
    /// Job id (omit for manual operation via --chanid/--starttime)
    jobid: Option<u64>,

    /// Channel id for manual operation
    #[arg(long, value_name = "ID")]
    chanid: Option<u32>,

    /// Recording start time for manual operation
    #[arg(long, value_name = "TIME")]
    starttime: Option<String>,

    /// Preset values as "Threshold,MinQuiet,MinDetect,MinLength,MaxSep,Pad"
    #[arg(long, value_name = "VALUES")]
    preset: Option<String>,

    /// File containing preset values
    #[arg(long, value_name = "PATH")]
    preset_file: Option<PathBuf>,

    /// Log the full error chain on failure
    #[arg(long)]
    dump: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", default_value = "adflag.toml")]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let dump = cli.dump;

    if let Err(e) = try_main(cli) {
        if dump {
            eprintln!("adflag failed: {:?}", e);
        } else {
            eprintln!("adflag failed: {:#}", e);
        }
        process::exit(1);
    }
}

fn try_main(cli: Cli) -> Result<()> {
    let identity = resolve_identity(&cli)?;

    if cli.preset.is_some() && cli.preset_file.is_some() {
        bail!("--preset and --preset-file are mutually exclusive");
    }

    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    config.ensure_dirs_exist().context("creating directories")?;

    let _guard = init_logging(&config.logs_folder());
    tracing::info!("adflag {} starting", adflag_core::version());

    let settings = config.settings().clone();
    let mut store = JsonStore::open(&settings.paths.store_file)
        .with_context(|| format!("opening store {}", settings.paths.store_file))?;
    let mut channel = TcpChannel::new(settings.backend.addr());

    let request = RunRequest {
        identity,
        preset: cli.preset,
        preset_file: cli.preset_file,
    };

    match runner::run(&request, &settings, &mut store, &mut channel) {
        Ok(outcome) => {
            tracing::info!(
                "finished {}: {} breaks flagged",
                outcome.recording,
                outcome.breaks
            );
            Ok(())
        }
        Err(e) => {
            let err = anyhow::Error::new(e);
            tracing::error!("Failed due to: \"{:#}\"", err);
            if cli.dump {
                tracing::error!("{:?}", err);
            }
            Err(err)
        }
    }
}

/// Validate the two identity input modes: a job id, or an explicit
/// chanid + starttime pair. Anything else is a usage error.
fn resolve_identity(cli: &Cli) -> Result<RunIdentity> {
    match (cli.jobid, cli.chanid, cli.starttime.as_deref()) {
        (Some(job_id), None, None) => Ok(RunIdentity::Job(job_id)),
        (None, Some(chan_id), Some(raw)) => Ok(RunIdentity::Manual {
            chan_id,
            start_time: parse_start_time(raw)?,
        }),
        (Some(_), _, _) => bail!("a job id cannot be combined with --chanid/--starttime"),
        _ => bail!("either a job id or both --chanid and --starttime must be specified"),
    }
}

/// Install the tracing subscriber: env-filtered stderr output plus a
/// non-blocking log file in the configured logs folder.
fn init_logging(logs_folder: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(logs_folder, "adflag.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("adflag").chain(args.iter().copied()))
    }

    #[test]
    fn job_id_alone_is_valid() {
        let cli = parse(&["1234"]);
        assert!(matches!(
            resolve_identity(&cli).unwrap(),
            RunIdentity::Job(1234)
        ));
    }

    #[test]
    fn chanid_and_starttime_are_valid() {
        let cli = parse(&["--chanid", "1021", "--starttime", "2024-05-01 20:00:00"]);
        match resolve_identity(&cli).unwrap() {
            RunIdentity::Manual { chan_id, .. } => assert_eq!(chan_id, 1021),
            other => panic!("expected Manual, got {:?}", other),
        }
    }

    #[test]
    fn missing_identity_is_usage_error() {
        let cli = parse(&[]);
        assert!(resolve_identity(&cli).is_err());
    }

    #[test]
    fn partial_manual_identity_is_usage_error() {
        let cli = parse(&["--chanid", "1021"]);
        assert!(resolve_identity(&cli).is_err());
    }

    #[test]
    fn job_id_plus_manual_identity_is_usage_error() {
        let cli = parse(&["1234", "--chanid", "1021", "--starttime", "20240501200000"]);
        assert!(resolve_identity(&cli).is_err());
    }

    #[test]
    fn bad_starttime_is_rejected() {
        let cli = parse(&["--chanid", "1021", "--starttime", "teatime"]);
        assert!(resolve_identity(&cli).is_err());
    }
}
