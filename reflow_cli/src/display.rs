//! 16x2 character LCD rendering of the controller snapshot.
//!
//! Layout:
//! ```text
//! T: 183   Soak
//! SP: 185  Prof LF
//! ```
//! In the Error stage the whole screen is replaced by a runaway warning.

use reflow_core::{DisplaySink, Snapshot, Stage};

pub const COLS: usize = 16;

/// Two padded lines of exactly `COLS` characters.
pub type Frame = [String; 2];

pub fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "Ready",
        Stage::Preheat => "PreHt",
        Stage::Soak => "Soak",
        Stage::Reflow => "Reflow",
        Stage::Cool => "CoolDn",
        Stage::Complete => "Done!",
        Stage::TooHot => "Hot!",
        Stage::Error => "Error",
    }
}

// Whole degrees, right-aligned in four columns; blank when there is no value.
fn degrees(v: Option<f32>) -> String {
    match v {
        Some(t) if t.is_finite() => format!("{:>4}", t.trunc() as i32),
        _ => "   -".to_string(),
    }
}

fn pad(s: String) -> String {
    let mut s: String = s.chars().take(COLS).collect();
    let len = s.chars().count();
    s.extend(std::iter::repeat_n(' ', COLS - len));
    s
}

pub fn render(s: &Snapshot) -> Frame {
    if s.stage == Stage::Error {
        return [
            pad("RUNAWAY ERROR".to_string()),
            pad(format!("TEMP:{}", degrees(s.reading))),
        ];
    }
    let top = format!("T:{:<7}{}", degrees(s.reading), stage_label(s.stage));
    let setpoint = if s.running {
        format!("SP:{}", degrees(s.setpoint))
    } else {
        String::new()
    };
    let bottom = format!("{setpoint:<9}Prof {}", s.profile.short_label());
    [pad(top), pad(bottom)]
}

/// Display sink that renders every refresh and logs the frame when it changes.
#[derive(Debug, Default)]
pub struct LcdDisplay {
    last: Option<Frame>,
    echo: bool,
}

impl LcdDisplay {
    /// `echo` also writes changed frames to stderr.
    pub fn new(echo: bool) -> Self {
        Self { last: None, echo }
    }
}

impl DisplaySink for LcdDisplay {
    fn show(&mut self, snapshot: &Snapshot) {
        let frame = render(snapshot);
        if self.last.as_ref() == Some(&frame) {
            return;
        }
        tracing::trace!(line1 = %frame[0], line2 = %frame[1], "lcd");
        if self.echo {
            eprintln!("|{}|\n|{}|", frame[0], frame[1]);
        }
        self.last = Some(frame);
    }
}
