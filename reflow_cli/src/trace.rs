//! Per-sample CSV trace of a running cycle.

use std::fs::File;
use std::path::Path;

use eyre::WrapErr;
use reflow_core::{Station, TickReport};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceRow {
    pub time_s: u64,
    pub setpoint: f32,
    pub temperature: f32,
    pub output: f32,
}

impl TraceRow {
    /// A row for sampling ticks with a good reading while the cycle runs.
    pub fn from_tick(station: &Station, report: &TickReport) -> Option<Self> {
        let state = station.state();
        match &report.sample {
            Some(Ok(t)) if state.running() => Some(Self {
                time_s: state.elapsed_s(report.now_ms),
                setpoint: state.setpoint(),
                temperature: *t,
                output: report.actions.output,
            }),
            _ => None,
        }
    }
}

pub struct TraceWriter {
    out: csv::Writer<File>,
    rows: u64,
    // First write failure; reported once the cycle is over.
    error: Option<csv::Error>,
}

impl TraceWriter {
    pub fn create(path: &Path) -> eyre::Result<Self> {
        let out = csv::Writer::from_path(path)
            .wrap_err_with(|| format!("create trace file {}", path.display()))?;
        Ok(Self {
            out,
            rows: 0,
            error: None,
        })
    }

    pub fn observe(&mut self, station: &Station, report: &TickReport) {
        if self.error.is_some() {
            return;
        }
        if let Some(row) = TraceRow::from_tick(station, report) {
            match self.out.serialize(row) {
                Ok(()) => self.rows += 1,
                Err(e) => self.error = Some(e),
            }
        }
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> eyre::Result<u64> {
        if let Some(e) = self.error.take() {
            return Err(e).wrap_err("write trace row");
        }
        self.out.flush().wrap_err("flush trace file")?;
        Ok(self.rows)
    }
}
