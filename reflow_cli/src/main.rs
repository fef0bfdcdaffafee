use clap::Parser;
use eyre::{Result, WrapErr};
use reflow_core::CycleOutcome;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod cli;
mod display;
mod error_fmt;
mod run;
mod trace;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;

    let mut cfg = match &cli.config {
        Some(path) => reflow_config::load_file(path)?,
        None => reflow_config::Config::default(),
    };
    run::apply_sim_env(&mut cfg.simulation)?;
    cfg.validate()?;

    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;

    match cli.cmd {
        Commands::Run {
            profile,
            realtime,
            max_run_s,
            trace,
        } => {
            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = Arc::clone(&stop);
                ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let req = run::RunRequest {
                profile: profile.map(Into::into),
                realtime,
                max_run_s,
                trace,
            };
            let summary = run::run(&cfg, &req, stop)?;
            print_run(&summary, req.trace.as_deref(), cli.json);
        }
        Commands::Profile { action } => {
            let p = run::profile(&cfg, action)?;
            if cli.json {
                println!(
                    "{}",
                    json!({ "profile": p.to_string(), "label": p.short_label() })
                );
            } else {
                println!("profile: {p} ({})", p.short_label());
            }
        }
        Commands::SelfCheck => {
            let check = run::self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "ok": true,
                        "temperature_c": check.temperature_c,
                        "profile": check.profile.to_string(),
                    })
                );
            } else {
                println!(
                    "self-check ok: plate {:.1} °C, profile {}",
                    check.temperature_c, check.profile
                );
            }
        }
    }
    Ok(())
}

fn print_run(summary: &run::RunSummary, trace: Option<&Path>, json_out: bool) {
    let (outcome, duration_ms, peak_c, stopped_at) = match &summary.outcome {
        CycleOutcome::Completed {
            duration_ms,
            peak_c,
        } => ("completed", *duration_ms, Some(*peak_c), None),
        CycleOutcome::Stopped { at, duration_ms } => {
            ("stopped", *duration_ms, None, Some(at.to_string()))
        }
    };

    if json_out {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        println!(
            "{}",
            json!({
                "timestamp": ts,
                "profile": summary.profile.to_string(),
                "outcome": outcome,
                "duration_ms": duration_ms,
                "peak_c": peak_c,
                "stopped_at": stopped_at,
                "trace_rows": summary.trace_rows,
            })
        );
        return;
    }

    let secs = reflow_core::util::ms_to_s(duration_ms);
    match (peak_c, stopped_at) {
        (Some(peak), _) => println!(
            "reflow complete: {} profile, peak {peak:.1} °C, {secs:.0} s",
            summary.profile
        ),
        (None, Some(at)) => println!("reflow stopped by operator during {at} after {secs:.0} s"),
        (None, None) => {}
    }
    if let (Some(rows), Some(path)) = (summary.trace_rows, trace) {
        println!("trace: {rows} rows written to {}", path.display());
    }
}

/// Console logs go to stderr so stdout only carries results.
fn init_tracing(
    json_logs: bool,
    level: Option<&str>,
    logging: &reflow_config::Logging,
) -> Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    // --log-level beats RUST_LOG, which beats [logging].level.
    let filter = match (level, std::env::var("RUST_LOG")) {
        (Some(l), _) => EnvFilter::try_new(l)?,
        (None, Ok(env)) if !env.is_empty() => EnvFilter::try_new(env)?,
        _ => EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))?,
    };

    let console = if json_logs {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install log subscriber")?;
    Ok(())
}
