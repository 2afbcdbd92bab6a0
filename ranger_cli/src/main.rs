//! Rangefinder CLI entry point: config loading, logging setup, signal
//! handling, and command dispatch.

mod cli;
mod error_fmt;
mod scan;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::Relaxed);
        })
        .wrap_err("installing Ctrl-C handler")?;
    }

    match cli.cmd {
        Commands::Scan {
            duration_ms,
            max_readings,
        } => scan::run_scan(&cfg, cli.json, duration_ms, max_readings, cancel),
        Commands::Measure {
            points,
            interval_ms,
        } => scan::run_measure(&cfg, cli.json, points, interval_ms, cancel),
        Commands::SelfCheck => scan::run_self_check(cli.json),
    }
}

fn load_config(path: &Path) -> eyre::Result<ranger_config::Config> {
    if !path.exists() {
        // A missing file is normal: defaults cover the common device.
        return Ok(ranger_config::Config::default());
    }
    let text =
        std::fs::read_to_string(path).wrap_err_with(|| format!("reading config {path:?}"))?;
    let cfg = ranger_config::load_toml(&text)
        .wrap_err_with(|| format!("parsing config {path:?}"))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &ranger_config::Logging) -> eyre::Result<()> {
    let level = logging
        .level
        .clone()
        .unwrap_or_else(|| cli.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let dir = dir.unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("creating log directory {dir:?}"))?;

            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    if cli.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).boxed())
            .with(file_layer)
            .try_init()
            .wrap_err("initializing logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).boxed())
            .with(file_layer)
            .try_init()
            .wrap_err("initializing logging")?;
    }
    Ok(())
}
