use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reflow_hardware::{PlateParams, SimFaults, SimPlate};
use reflow_traits::{Heater, Indicators, ManualClock, TempSensor};
use rstest::rstest;

fn plate(faults: SimFaults) -> (SimPlate, ManualClock) {
    let clock = ManualClock::new();
    let plate = SimPlate::new(PlateParams::default(), faults, Arc::new(clock.clone()));
    (plate, clock)
}

#[test]
fn cold_plate_stays_at_ambient() {
    let (plate, clock) = plate(SimFaults::default());
    clock.advance(Duration::from_secs(60));
    assert!((plate.temperature() - 25.0).abs() < 1e-3);
}

#[test]
fn heating_raises_and_lags_after_relay_opens() {
    let (plate, clock) = plate(SimFaults::default());
    let mut heater = plate.heater();
    let mut sensor = plate.sensor();

    heater.set(true).unwrap();
    clock.advance(Duration::from_secs(30));
    let hot = sensor.read().unwrap();
    assert!(hot > 40.0, "hot={hot}");

    heater.set(false).unwrap();
    clock.advance(Duration::from_secs(3));
    // Stored element heat keeps the plate rising briefly.
    let after = sensor.read().unwrap();
    assert!(after > hot, "after={after} hot={hot}");

    clock.advance(Duration::from_secs(600));
    let cooled = sensor.read().unwrap();
    assert!(cooled < after);
}

#[test]
fn fan_speeds_up_cooling() {
    let run = |fan: bool| {
        let (plate, clock) = plate(SimFaults::default());
        plate.heater().set(true).unwrap();
        clock.advance(Duration::from_secs(120));
        plate.heater().set(false).unwrap();
        plate.indicators().set_fan(fan).unwrap();
        clock.advance(Duration::from_secs(300));
        plate.temperature()
    };
    assert!(run(true) < run(false));
}

#[test]
fn open_sensor_reports_an_error() {
    let (plate, _clock) = plate(SimFaults {
        open_sensor: true,
        ..SimFaults::default()
    });
    let err = plate.sensor().read().unwrap_err();
    assert!(err.to_string().contains("open circuit"));
}

#[rstest]
#[case(0)]
#[case(5)]
fn stuck_sensor_freezes_after_delay(#[case] after_s: u64) {
    let (plate, clock) = plate(SimFaults {
        open_sensor: false,
        stuck_after_s: Some(after_s),
    });
    let mut sensor = plate.sensor();
    plate.heater().set(true).unwrap();
    clock.advance(Duration::from_secs(after_s));
    let frozen = sensor.read().unwrap();
    clock.advance(Duration::from_secs(20));
    assert_eq!(sensor.read().unwrap(), frozen);
    assert!(plate.temperature() > frozen);
}

#[test]
fn buzzer_is_accepted() {
    let (plate, _clock) = plate(SimFaults::default());
    plate
        .indicators()
        .sound(1800, Duration::from_millis(200))
        .unwrap();
    assert!(!plate.fan_on());
    assert!(!plate.heater_on());
}

/// Collects formatted log lines for inspection.
#[derive(Clone, Default)]
struct LogBuf(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn fan_logs_only_when_it_changes() {
    let (plate, clock) = plate(SimFaults::default());
    let logs = LogBuf::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let mut ind = plate.indicators();
        for _ in 0..100 {
            clock.advance(Duration::from_millis(10));
            ind.set_fan(true).unwrap();
        }
        ind.set_fan(false).unwrap();
    });
    let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert_eq!(out.lines().filter(|l| l.contains(" fan ")).count(), 2, "{out}");
    assert!(!plate.fan_on());
}
