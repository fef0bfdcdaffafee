//! Drives a `Station` through one complete reflow cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ReflowError, Result};
use crate::machine::Commands;
use crate::state::Stage;
use crate::station::{Station, TickReport};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Hard cap on cycle duration; the cycle is stopped when exceeded.
    pub max_run_ms: Option<u64>,
    /// Raised by a signal handler to request an operator stop.
    pub stop_flag: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Cooled down and sounded the final chime.
    Completed { duration_ms: u64, peak_c: f32 },
    /// Operator stop before completion.
    Stopped { at: Stage, duration_ms: u64 },
}

/// Start a cycle and poll until it completes, faults, is stopped or runs out
/// of time. `observe` sees every tick.
///
/// The heater is commanded off on every exit path.
pub fn run_cycle(
    station: &mut Station,
    opts: &RunOptions,
    observe: impl FnMut(&Station, &TickReport),
) -> Result<CycleOutcome> {
    let result = drive(station, opts, observe);
    if let Err(e) = station.heater_off() {
        tracing::warn!(error = %e, "failed to switch heater off after cycle");
    }
    result
}

fn drive(
    station: &mut Station,
    opts: &RunOptions,
    mut observe: impl FnMut(&Station, &TickReport),
) -> Result<CycleOutcome> {
    let start_cmd = if station.state().stage() == Stage::Idle {
        Commands::START_STOP
    } else {
        Commands::NONE
    };
    let report = station.poll(start_cmd)?;
    observe(station, &report);
    if !station.state().running() {
        return Err(not_started(station));
    }

    let started_ms = report.now_ms;
    let mut peak_c = station.state().last_reading().unwrap_or(f32::MIN);

    loop {
        station.idle_wait();

        let stop = opts
            .stop_flag
            .as_ref()
            .is_some_and(|f| f.swap(false, Ordering::SeqCst));
        let report = station.poll(if stop {
            Commands::START_STOP
        } else {
            Commands::NONE
        })?;
        observe(station, &report);

        if let Some(Ok(t)) = &report.sample {
            peak_c = peak_c.max(*t);
        }
        let duration_ms = report.now_ms.saturating_sub(started_ms);

        if let Some(kind) = report.actions.fault {
            return Err(eyre::Report::new(ReflowError::Fault(kind)));
        }
        if let Some(t) = report.actions.transition {
            if stop && t.to == Stage::Idle {
                tracing::info!(at = %t.from, duration_ms, "cycle stopped by operator");
                return Ok(CycleOutcome::Stopped {
                    at: t.from,
                    duration_ms,
                });
            }
            if t.from == Stage::Complete && t.to == Stage::TooHot {
                tracing::info!(duration_ms, peak_c, "cycle complete");
                return Ok(CycleOutcome::Completed {
                    duration_ms,
                    peak_c,
                });
            }
        }

        if let Some(max) = opts.max_run_ms
            && duration_ms > max
        {
            let stage = station.state().stage();
            if station.state().running() {
                let report = station.poll(Commands::START_STOP)?;
                observe(station, &report);
            }
            return Err(eyre::Report::new(ReflowError::MaxRuntime { max_ms: max, stage }));
        }
    }
}

fn not_started(station: &Station) -> eyre::Report {
    let state = station.state();
    let err = match (state.stage(), state.fault(), state.last_reading()) {
        (Stage::Error, Some(kind), _) => ReflowError::Fault(kind),
        (Stage::TooHot, _, Some(t)) => ReflowError::TooHot {
            reading_c: t,
            limit_c: state.config().safety.room_temp_c,
        },
        (_, _, None) => ReflowError::NoReading,
        (stage, _, _) => ReflowError::State(format!("cycle did not start (stage {stage})")),
    };
    eyre::Report::new(err)
}
