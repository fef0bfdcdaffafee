#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    if let Ok(cfg) = reflow_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // Anything the file validator accepts must also pass the runtime check.
        let control = reflow_core::ControlCfg::from(&cfg);
        assert!(control.validate().is_ok(), "{:?}", control.validate());
    }
});
