#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use reflow_core::{Commands, ControlCfg, ProcessState, Profile, SensorFault, tick};

#[derive(Debug, Arbitrary)]
struct Step {
    dt_ms: u16,
    reading: Option<f32>,
    sensor_ok: bool,
    buttons: u8,
}

fuzz_target!(|steps: Vec<Step>| {
    let cfg = ControlCfg::default();
    let window = cfg.pid.window_ms as f32;
    let mut state = ProcessState::new(cfg, Profile::LeadFree);
    let mut now = 0u64;
    for s in steps {
        now += u64::from(s.dt_ms);
        let sample = s.reading.map(|t| {
            if s.sensor_ok {
                Ok(t)
            } else {
                Err(SensorFault("fuzz".into()))
            }
        });
        let cmds = Commands {
            start_stop: s.buttons & 1 != 0,
            profile_toggle: s.buttons & 2 != 0,
            setpoint_up: s.buttons & 4 != 0,
            setpoint_down: s.buttons & 8 != 0,
        };
        let actions = tick(&mut state, now, sample, cmds);
        assert!(!actions.heater_on || state.running());
        assert!((0.0..=window).contains(&actions.output) || actions.output.is_nan());
    }
});
