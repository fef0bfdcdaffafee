//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::LAST_LIMITS;
use reflow_core::error::{BuildError, FaultKind, ReflowError};

/// Stable name for the error class, used in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<ReflowError>() {
        Some(ReflowError::Fault(FaultKind::Sensor)) => "SensorFault",
        Some(ReflowError::Fault(FaultKind::Stall)) => "StallFault",
        Some(ReflowError::MaxRuntime { .. }) => "MaxRuntime",
        Some(ReflowError::TooHot { .. }) => "TooHot",
        Some(ReflowError::NoReading) => "NoReading",
        Some(ReflowError::State(_)) => "State",
        Some(ReflowError::Hardware(_)) => "Hardware",
        Some(ReflowError::Io(_)) => "Io",
        Some(ReflowError::Config(_)) => "Config",
        None if err.downcast_ref::<BuildError>().is_some() => "Config",
        None => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No temperature sensor was provided to the controller.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingHeater => {
                "What happened: No heater was provided to the controller.\nLikely causes: The relay driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the heater is created successfully and passed via with_heater(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<ReflowError>() {
        return match re {
            ReflowError::Fault(FaultKind::Sensor) => "What happened: The temperature sensor could not be read; heating was stopped.\nLikely causes: Thermocouple disconnected or open circuit, or a loose amplifier connection.\nHow to fix: Check the thermocouple wiring, then run `reflow self-check`.".to_string(),
            ReflowError::Fault(FaultKind::Stall) => {
                let ms = LAST_LIMITS.get().map(|l| l.stall_timeout_ms);
                let window = ms.map_or_else(|| "the stall timeout".to_string(), |ms| format!("{ms} ms"));
                format!(
                    "What happened: Temperature stopped moving in the expected direction for longer than {window}; heating was stopped.\nLikely causes: Heater relay or element failure, thermocouple detached from the plate, or a reading stuck at one value.\nHow to fix: Power down, check the relay, element and thermocouple mounting. Raise safety.stall_timeout_ms only if the plate is known to be slow."
                )
            }
            ReflowError::MaxRuntime { .. } => format!("What happened: {re}.\nLikely causes: The plate heats too slowly for the profile, or the limit is too tight.\nHow to fix: Raise --max-run-s or check the heater."),
            ReflowError::TooHot { .. } => format!("What happened: {re}.\nLikely causes: The plate has not cooled down since the last cycle.\nHow to fix: Wait for the plate to cool, then start again."),
            ReflowError::NoReading => "What happened: No temperature reading was available, so the cycle could not start.\nLikely causes: The sensor has not been sampled yet or is failing.\nHow to fix: Run `reflow self-check`.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path and try again."
        );
    }

    if lower.contains("parse config") || lower.contains(" must ") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo in a key or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("reflow_sim_") {
        return format!("What happened: {msg}.\nHow to fix: Unset the variable or give it a valid value.");
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per fault class; other errors return 1 (clap usage errors use 2).
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "SensorFault" => 3,
        "StallFault" => 4,
        "MaxRuntime" => 5,
        "TooHot" => 6,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let msg = humanize(err);
    let limits = LAST_LIMITS.get();
    let details = match reason {
        "StallFault" => limits.map(|l| json!({ "stall_timeout_ms": l.stall_timeout_ms })),
        "MaxRuntime" => limits.map(|l| json!({ "max_run_ms": l.max_run_ms })),
        "TooHot" => limits.map(|l| json!({ "room_temp_c": l.room_temp_c })),
        _ => None,
    };
    match details {
        Some(d) => json!({ "reason": reason, "details": d, "message": msg }),
        None => json!({ "reason": reason, "message": msg }),
    }
    .to_string()
}
