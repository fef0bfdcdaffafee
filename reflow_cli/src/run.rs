//! Hardware assembly and command execution against the simulated hotplate.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use reflow_config::{Config, Simulation};
use reflow_core::error::Result as CoreResult;
use reflow_core::mocks::NullDisplay;
use reflow_core::{
    Commands, CycleOutcome, DisplaySink, FaultKind, Profile, ReflowError, RunOptions, Station,
    run_cycle,
};
use reflow_hardware::{FileProfileStore, PlateParams, SimFaults, SimPlate};
use reflow_traits::{Clock, ManualClock, MonotonicClock};

use crate::cli::{CliLimits, LAST_LIMITS, ProfileAction};
use crate::display::LcdDisplay;
use crate::trace::TraceWriter;

/// Test hooks: override `[simulation]` fault injection from the environment.
pub fn apply_sim_env(sim: &mut Simulation) -> eyre::Result<()> {
    if let Ok(v) = std::env::var("REFLOW_SIM_OPEN_SENSOR") {
        sim.open_sensor = matches!(v.trim(), "1" | "true" | "yes");
    }
    if let Ok(v) = std::env::var("REFLOW_SIM_STUCK_AFTER_S") {
        let secs = v
            .trim()
            .parse::<u64>()
            .wrap_err_with(|| format!("REFLOW_SIM_STUCK_AFTER_S={v:?} is not a number of seconds"))?;
        sim.stuck_after_s = Some(secs);
    }
    if let Ok(v) = std::env::var("REFLOW_SIM_START_C") {
        let c = v
            .trim()
            .parse::<f32>()
            .wrap_err_with(|| format!("REFLOW_SIM_START_C={v:?} is not a temperature"))?;
        sim.start_c = Some(c);
    }
    Ok(())
}

fn plate_params(sim: &Simulation) -> PlateParams {
    PlateParams {
        ambient_c: sim.ambient_c,
        start_c: sim.start_c.unwrap_or(sim.ambient_c),
        heater_c_per_s: sim.heater_c_per_s,
        coupling_per_s: sim.coupling_per_s,
        loss_per_s: sim.loss_per_s,
        fan_loss_per_s: sim.fan_loss_per_s,
    }
}

fn sim_faults(sim: &Simulation) -> SimFaults {
    SimFaults {
        open_sensor: sim.open_sensor,
        stuck_after_s: sim.stuck_after_s,
    }
}

/// A station wired to a simulated plate.
pub struct Rig {
    pub station: Station,
    pub plate: SimPlate,
}

pub fn assemble(
    cfg: &Config,
    realtime: bool,
    display: impl DisplaySink + 'static,
) -> CoreResult<Rig> {
    // The plate model and the scheduler must agree on time.
    let plate_clock: Arc<dyn Clock + Send + Sync>;
    let station_clock: Box<dyn Clock + Send + Sync>;
    if realtime {
        plate_clock = Arc::new(MonotonicClock::new());
        station_clock = Box::new(MonotonicClock::new());
    } else {
        let clock = ManualClock::new();
        plate_clock = Arc::new(clock.clone());
        station_clock = Box::new(clock);
    }
    let plate = SimPlate::new(
        plate_params(&cfg.simulation),
        sim_faults(&cfg.simulation),
        plate_clock,
    );

    let builder = Station::builder()
        .with_sensor(plate.sensor())
        .with_heater(plate.heater())
        .with_indicators(plate.indicators())
        .with_display(display)
        .with_clock(station_clock)
        .apply_config(cfg);
    let builder = match cfg.profile.store.as_deref() {
        Some(path) => builder.with_store(FileProfileStore::new(path)),
        None => builder,
    };
    let station = builder.build()?;
    Ok(Rig { station, plate })
}

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub profile: Option<Profile>,
    pub realtime: bool,
    pub max_run_s: Option<u64>,
    pub trace: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub profile: Profile,
    pub outcome: CycleOutcome,
    pub trace_rows: Option<u64>,
}

pub fn run(cfg: &Config, req: &RunRequest, stop: Arc<AtomicBool>) -> CoreResult<RunSummary> {
    let Rig { mut station, plate } = assemble(cfg, req.realtime, LcdDisplay::new(req.realtime))?;

    let max_run_ms = req.max_run_s.map(|s| s.saturating_mul(1000));
    let control = station.state().config();
    let _ = LAST_LIMITS.set(CliLimits {
        max_run_ms,
        stall_timeout_ms: control.safety.stall_timeout_ms,
        room_temp_c: control.safety.room_temp_c,
    });

    station.startup()?;
    if let Some(p) = req.profile
        && p != station.state().profile()
    {
        station.poll(Commands::PROFILE_TOGGLE)?;
    }
    let profile = station.state().profile();
    tracing::info!(%profile, plate_c = plate.temperature(), "starting cycle");

    let mut trace = req
        .trace
        .as_deref()
        .map(TraceWriter::create)
        .transpose()?;
    let opts = RunOptions {
        max_run_ms,
        stop_flag: Some(stop),
    };
    let outcome = run_cycle(&mut station, &opts, |st, report| {
        if let Some(t) = trace.as_mut() {
            t.observe(st, report);
        }
    });
    // Flush whatever was recorded even when the cycle failed.
    let trace_rows = trace.map(TraceWriter::finish).transpose();
    let outcome = outcome?;

    Ok(RunSummary {
        profile,
        outcome,
        trace_rows: trace_rows?,
    })
}

pub fn profile(cfg: &Config, action: ProfileAction) -> CoreResult<Profile> {
    let Rig { mut station, .. } = assemble(cfg, false, NullDisplay)?;
    if matches!(action, ProfileAction::Toggle) {
        station.poll(Commands::PROFILE_TOGGLE)?;
    }
    Ok(station.state().profile())
}

#[derive(Debug, Clone, Copy)]
pub struct SelfCheck {
    pub temperature_c: f32,
    pub profile: Profile,
}

pub fn self_check(cfg: &Config) -> CoreResult<SelfCheck> {
    let Rig { mut station, .. } = assemble(cfg, false, NullDisplay)?;
    let report = station.startup()?;
    match report.sample {
        Some(Ok(t)) => Ok(SelfCheck {
            temperature_c: t,
            profile: station.state().profile(),
        }),
        _ => Err(eyre::Report::new(ReflowError::Fault(FaultKind::Sensor))),
    }
}
