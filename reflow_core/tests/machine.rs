use reflow_core::{
    Commands, ControlCfg, FaultKind, GainSchedule, GainStage, PidGains, ProcessState, Profile,
    SensorFault, Stage, Tone, tick,
};
use rstest::rstest;

fn fresh(profile: Profile) -> ProcessState {
    ProcessState::new(ControlCfg::default(), profile)
}

/// Idealised plate: follows the profile closely enough that no stall fires.
fn plate_step(stage: Stage, reading: f32) -> f32 {
    match stage {
        Stage::Preheat | Stage::Reflow => reading + 1.0,
        Stage::Soak => reading + 0.5,
        Stage::Cool | Stage::Complete | Stage::TooHot => reading - 2.0,
        Stage::Idle | Stage::Error => reading,
    }
}

/// Start a cycle at 30 °C and sample once per second until `target` is
/// reached. Returns `(now_ms, reading)` at that tick.
fn run_until(s: &mut ProcessState, target: Stage) -> (u64, f32) {
    let mut now = 0;
    let mut reading = 30.0;
    tick(s, now, Some(Ok(reading)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Preheat);
    for _ in 0..2000 {
        if s.stage() == target {
            return (now, reading);
        }
        now += 1000;
        reading = plate_step(s.stage(), reading);
        tick(s, now, Some(Ok(reading)), Commands::NONE);
    }
    panic!("never reached {target:?}; stuck in {:?}", s.stage());
}

#[rstest]
#[case(Profile::LeadFree)]
#[case(Profile::Leaded)]
fn start_below_room_enters_preheat(#[case] profile: Profile) {
    let mut s = fresh(profile);
    let a = tick(&mut s, 0, Some(Ok(49.0)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Preheat);
    assert!(s.running());
    assert_eq!(s.setpoint(), profile.params().soak_temp_min);
    assert_eq!(s.gain_stage(), GainStage::Preheat);
    assert_eq!(s.window_start_ms(), 0);
    // Cold plate, full demand: heater on from the first tick.
    assert!(a.heater_on);
    let t = a.transition.unwrap();
    assert_eq!((t.from, t.to), (Stage::Idle, Stage::Preheat));
}

#[test]
fn hot_plate_goes_too_hot_instead_of_starting() {
    let mut s = fresh(Profile::LeadFree);
    let a = tick(&mut s, 0, Some(Ok(50.0)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::TooHot);
    assert!(!s.running());
    assert!(!a.heater_on);

    // Returns to Idle only once strictly below room temperature.
    tick(&mut s, 1000, Some(Ok(50.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::TooHot);
    let a = tick(&mut s, 2000, Some(Ok(49.9)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Idle);
    assert_eq!(a.fan, Some(false));
}

#[test]
fn start_without_any_reading_is_ignored() {
    let mut s = fresh(Profile::LeadFree);
    let a = tick(&mut s, 0, None, Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Idle);
    assert!(!s.running());
    assert!(a.transition.is_none());
}

#[test]
fn rising_one_degree_per_tick_from_49() {
    let mut s = fresh(Profile::LeadFree);
    tick(&mut s, 0, Some(Ok(49.0)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Preheat);

    let mut visited = vec![Stage::Idle, Stage::Preheat];
    for i in 1..=101u16 {
        let reading = 49.0 + f32::from(i);
        let a = tick(&mut s, u64::from(i) * 1000, Some(Ok(reading)), Commands::NONE);
        if let Some(t) = a.transition {
            visited.push(t.to);
        }
        if reading < 150.0 {
            assert_eq!(s.stage(), Stage::Preheat, "at {reading}");
        }
    }
    assert_eq!(visited, [Stage::Idle, Stage::Preheat, Stage::Soak]);
    assert_eq!(s.setpoint(), 155.0);
    assert_eq!(s.gain_stage(), GainStage::Soak);
    assert_eq!(s.soak_sub_deadline_ms(), 101_000 + 9000);
}

#[rstest]
#[case(Profile::LeadFree)]
#[case(Profile::Leaded)]
fn soak_ramps_by_step_each_period_then_snaps_to_peak(#[case] profile: Profile) {
    let p = profile.params();
    let mut s = fresh(profile);
    let (mut now, mut reading) = run_until(&mut s, Stage::Soak);
    let entered = now;

    let mut setpoints = vec![s.setpoint()];
    let mut step_times = vec![];
    while s.stage() == Stage::Soak {
        now += 1000;
        reading += 0.05;
        let before = s.setpoint();
        tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
        if s.stage() == Stage::Soak && s.setpoint() != before {
            setpoints.push(s.setpoint());
            step_times.push(now);
        }
    }

    let mut expected = vec![];
    let mut sp = p.soak_temp_min + 5.0;
    while sp <= p.soak_temp_max {
        expected.push(sp);
        sp += 5.0;
    }
    assert_eq!(setpoints, expected);
    for w in step_times.windows(2) {
        assert_eq!(w[1] - w[0], p.soak_micro_period_ms);
    }
    assert!(step_times[0] > entered + p.soak_micro_period_ms);
    assert_eq!(s.stage(), Stage::Reflow);
    assert_eq!(s.setpoint(), p.reflow_temp_max);
    assert_eq!(s.gain_stage(), GainStage::Reflow);
}

#[test]
fn soak_step_waits_for_strictly_after_deadline() {
    let mut s = fresh(Profile::LeadFree);
    let (now, reading) = run_until(&mut s, Stage::Soak);
    let deadline = s.soak_sub_deadline_ms();
    assert_eq!(deadline, now + 9000);
    tick(&mut s, deadline, Some(Ok(reading + 0.1)), Commands::NONE);
    assert_eq!(s.setpoint(), 155.0);
    tick(&mut s, deadline + 1, None, Commands::NONE);
    assert_eq!(s.setpoint(), 160.0);
    assert_eq!(s.soak_sub_deadline_ms(), deadline + 9000);
}

#[test]
fn reflow_drops_setpoint_early_once_and_cools_only_at_peak() {
    let mut s = fresh(Profile::LeadFree);
    let (mut now, _) = run_until(&mut s, Stage::Reflow);
    assert_eq!(s.setpoint(), 250.0);

    let mut feed = |s: &mut ProcessState, t: f32, cmds: Commands| {
        now += 1000;
        tick(s, now, Some(Ok(t)), cmds)
    };

    feed(&mut s, 239.0, Commands::NONE);
    assert_eq!(s.setpoint(), 250.0);
    feed(&mut s, 240.0, Commands::NONE);
    assert_eq!(s.setpoint(), 100.0);
    assert_eq!(s.stage(), Stage::Reflow);

    // A nudge after the drop is not overwritten by the same rule again.
    feed(&mut s, 241.0, Commands::SETPOINT_UP);
    assert_eq!(s.setpoint(), 101.0);
    feed(&mut s, 249.9, Commands::NONE);
    assert_eq!(s.setpoint(), 101.0);
    assert_eq!(s.stage(), Stage::Reflow);

    let a = feed(&mut s, 250.0, Commands::NONE);
    assert_eq!(s.stage(), Stage::Cool);
    assert!(s.running());
    assert!(a.fan.is_none());
}

#[test]
fn jump_straight_to_peak_drops_setpoint_and_cools_in_one_tick() {
    let mut s = fresh(Profile::Leaded);
    let (now, _) = run_until(&mut s, Stage::Reflow);
    tick(&mut s, now + 1000, Some(Ok(230.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Cool);
    assert_eq!(s.setpoint(), 100.0);
}

#[test]
fn cool_completes_at_cool_min_and_chimes_one_second_later() {
    let mut s = fresh(Profile::LeadFree);
    let (mut now, _) = run_until(&mut s, Stage::Cool);

    now += 1000;
    tick(&mut s, now, Some(Ok(100.5)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Cool);

    now += 1000;
    let a = tick(&mut s, now, Some(Ok(100.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Complete);
    assert!(!s.running());
    assert!(!a.heater_on);
    assert_eq!(a.fan, Some(true));
    assert_eq!(
        a.tones,
        vec![Tone {
            hz: 1800,
            duration_ms: 1000
        }]
    );

    // Temperature is irrelevant in Complete; only the delay matters.
    let a = tick(&mut s, now + 999, Some(Ok(20.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Complete);
    assert!(a.tones.is_empty());
    let a = tick(&mut s, now + 1000, None, Commands::NONE);
    assert_eq!(s.stage(), Stage::TooHot);
    assert_eq!(
        a.tones,
        vec![Tone {
            hz: 1800,
            duration_ms: 200
        }]
    );

    let a = tick(&mut s, now + 2000, Some(Ok(19.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Idle);
    assert_eq!(a.fan, Some(false));
    assert!(!s.fan_on());
}

#[rstest]
#[case(Stage::Preheat)]
#[case(Stage::Soak)]
#[case(Stage::Reflow)]
#[case(Stage::Cool)]
#[case(Stage::Complete)]
#[case(Stage::TooHot)]
fn stop_returns_to_idle_within_the_tick(#[case] at: Stage) {
    let mut s = fresh(Profile::LeadFree);
    let (now, reading) = run_until(&mut s, at);
    let a = tick(&mut s, now + 1000, Some(Ok(reading)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Idle);
    assert!(!s.running());
    assert!(!a.heater_on);
    assert_eq!(a.transition.map(|t| (t.from, t.to)), Some((at, Stage::Idle)));
}

#[test]
fn stop_forces_heater_off_even_with_full_demand() {
    let mut s = fresh(Profile::LeadFree);
    let (now, _) = run_until(&mut s, Stage::Reflow);
    let a = tick(&mut s, now + 1000, Some(Ok(200.0)), Commands::START_STOP);
    assert!(a.output > 0.0);
    assert!(!a.heater_on);
    // Next tick: plate still hot, so Idle hands over to TooHot.
    tick(&mut s, now + 2000, Some(Ok(199.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::TooHot);
}

#[test]
fn frozen_reading_in_soak_faults_after_timeout() {
    let mut s = fresh(Profile::LeadFree);
    let (mut now, mut reading) = run_until(&mut s, Stage::Soak);
    while reading < 160.0 {
        now += 1000;
        reading += 0.5;
        tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
    }
    assert_eq!(s.stage(), Stage::Soak);
    let moved_at = s.last_change_ms();
    assert_eq!(moved_at, now);

    for _ in 0..5 {
        now += 1000;
        tick(&mut s, now, Some(Ok(160.0)), Commands::NONE);
        assert_eq!(s.stage(), Stage::Soak);
    }
    now += 1000;
    let a = tick(&mut s, now, Some(Ok(160.0)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Error);
    assert!(!s.running());
    assert!(!a.heater_on);
    assert_eq!(a.fan, Some(true));
    assert_eq!(a.fault, Some(FaultKind::Stall));
    assert_eq!(s.fault(), Some(FaultKind::Stall));
    assert_eq!(a.tones.len(), 1);

    // Error holds the fan on every tick until an explicit stop.
    let a = tick(&mut s, now + 10, None, Commands::NONE);
    assert_eq!(s.stage(), Stage::Error);
    assert_eq!(a.fan, Some(true));
    assert!(!a.heater_on);
}

#[test]
fn frozen_reading_across_the_last_soak_step_keeps_its_stall_window() {
    let mut s = fresh(Profile::LeadFree);
    let (mut now, mut reading) = run_until(&mut s, Stage::Soak);
    let max = s.params().soak_temp_max;
    while s.setpoint() < max || s.soak_sub_deadline_ms() - now > 3000 {
        now += 1000;
        reading += 0.5;
        tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
        assert_eq!(s.stage(), Stage::Soak);
    }
    let moved_at = s.last_change_ms();
    assert_eq!(moved_at, now);

    // The last soak step lands while the reading is frozen.
    for _ in 0..3 {
        now += 1000;
        tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
        assert_eq!(s.stage(), Stage::Soak);
    }
    now += 1000;
    let a = tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
    let t = a.transition.unwrap();
    assert_eq!((t.from, t.to), (Stage::Soak, Stage::Reflow));
    assert_eq!(s.last_change_ms(), moved_at);

    now += 1000;
    tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Reflow);
    now += 1000;
    let a = tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
    assert_eq!(now - moved_at, 6000);
    assert_eq!(s.stage(), Stage::Error);
    assert_eq!(a.fault, Some(FaultKind::Stall));
}

#[test]
fn cooling_that_rises_instead_of_falling_is_a_stall() {
    let mut s = fresh(Profile::LeadFree);
    let (mut now, mut reading) = run_until(&mut s, Stage::Cool);
    for _ in 0..6 {
        now += 1000;
        reading += 0.25;
        tick(&mut s, now, Some(Ok(reading)), Commands::NONE);
    }
    assert_eq!(s.stage(), Stage::Error);
    assert_eq!(s.fault(), Some(FaultKind::Stall));
}

#[test]
fn stall_is_only_evaluated_on_sampling_ticks() {
    let mut s = fresh(Profile::LeadFree);
    let (now, _) = run_until(&mut s, Stage::Preheat);
    // Without samples nothing can stall, however long it has been.
    tick(&mut s, now + 60_000, None, Commands::NONE);
    assert_eq!(s.stage(), Stage::Preheat);
}

#[test]
fn sensor_fault_while_running_enters_error() {
    let mut s = fresh(Profile::LeadFree);
    let (now, _) = run_until(&mut s, Stage::Preheat);
    let a = tick(
        &mut s,
        now + 1000,
        Some(Err(SensorFault("open circuit".into()))),
        Commands::NONE,
    );
    assert_eq!(s.stage(), Stage::Error);
    assert_eq!(a.fault, Some(FaultKind::Sensor));
    assert!(!a.heater_on);
    assert_eq!(a.fan, Some(true));
}

#[test]
fn non_finite_sample_counts_as_sensor_fault() {
    let mut s = fresh(Profile::LeadFree);
    tick(&mut s, 0, Some(Ok(f32::NAN)), Commands::NONE);
    assert_eq!(s.stage(), Stage::Error);
    assert_eq!(s.fault(), Some(FaultKind::Sensor));
    assert_eq!(s.last_reading(), None);
}

#[test]
fn sensor_fault_wins_over_stop_in_the_same_tick() {
    let mut s = fresh(Profile::LeadFree);
    let (now, _) = run_until(&mut s, Stage::Soak);
    tick(
        &mut s,
        now + 1000,
        Some(Err(SensorFault("gone".into()))),
        Commands::START_STOP,
    );
    assert_eq!(s.stage(), Stage::Error);
}

#[test]
fn stop_clears_error_and_idle_switches_fan_off_when_cool() {
    let mut s = fresh(Profile::LeadFree);
    tick(&mut s, 0, Some(Err(SensorFault("gone".into()))), Commands::NONE);
    assert_eq!(s.stage(), Stage::Error);
    assert!(s.fan_on());

    let a = tick(&mut s, 1000, Some(Ok(25.0)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Idle);
    assert_eq!(s.fault(), None);
    // The stop consumed the press: no restart in the same tick.
    assert!(!s.running());
    assert!(a.fan.is_none());

    let a = tick(&mut s, 2000, Some(Ok(25.0)), Commands::NONE);
    assert_eq!(a.fan, Some(false));
    assert!(!s.fan_on());
}

#[test]
fn profile_toggle_only_in_idle_and_persists() {
    let mut s = fresh(Profile::LeadFree);
    let a = tick(&mut s, 0, Some(Ok(25.0)), Commands::PROFILE_TOGGLE);
    assert_eq!(s.profile(), Profile::Leaded);
    assert_eq!(a.save_profile, Some(Profile::Leaded));

    tick(&mut s, 1000, Some(Ok(25.0)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Preheat);
    assert_eq!(s.params().reflow_temp_max, 224.0);
    let a = tick(&mut s, 2000, Some(Ok(26.0)), Commands::PROFILE_TOGGLE);
    assert_eq!(s.profile(), Profile::Leaded);
    assert!(a.save_profile.is_none());
}

#[test]
fn setpoint_nudges_only_while_running() {
    let mut s = fresh(Profile::LeadFree);
    tick(&mut s, 0, Some(Ok(25.0)), Commands::SETPOINT_UP);
    assert_eq!(s.setpoint(), 0.0);

    tick(&mut s, 1000, Some(Ok(26.0)), Commands::START_STOP);
    tick(&mut s, 1500, None, Commands::SETPOINT_UP);
    tick(&mut s, 1600, None, Commands::SETPOINT_UP);
    tick(&mut s, 1700, None, Commands::SETPOINT_DOWN);
    assert_eq!(s.setpoint(), 151.0);
}

#[test]
fn stage_transitions_swap_gain_sets() {
    let mut s = fresh(Profile::LeadFree);
    run_until(&mut s, Stage::Soak);
    assert_eq!(s.gain_stage(), GainStage::Soak);
    let mut s = fresh(Profile::LeadFree);
    run_until(&mut s, Stage::Reflow);
    assert_eq!(s.gain_stage(), GainStage::Reflow);
    assert_eq!(PidGains::REFLOW.kd, 350.0);
}

#[test]
fn configured_gain_schedule_is_applied_per_stage() {
    let cfg = ControlCfg {
        gains: GainSchedule {
            preheat: PidGains {
                kp: 1.0,
                ki: 0.0,
                kd: 0.0,
            },
            soak: PidGains {
                kp: 2.0,
                ki: 0.0,
                kd: 0.0,
            },
            reflow: PidGains {
                kp: 3.0,
                ki: 0.0,
                kd: 0.0,
            },
        },
        ..ControlCfg::default()
    };
    for (stage, gains) in [
        (Stage::Preheat, cfg.gains.preheat),
        (Stage::Soak, cfg.gains.soak),
        (Stage::Reflow, cfg.gains.reflow),
    ] {
        let mut s = ProcessState::new(cfg.clone(), Profile::Leaded);
        run_until(&mut s, stage);
        assert_eq!(s.gains(), gains, "{stage:?}");
    }
}

#[test]
fn restart_after_stop_resets_the_cycle() {
    let mut s = fresh(Profile::LeadFree);
    let (now, _) = run_until(&mut s, Stage::Preheat);
    tick(&mut s, now + 1000, Some(Ok(40.0)), Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Idle);
    tick(&mut s, now + 2000, Some(Ok(40.0)), Commands::NONE);
    tick(&mut s, now + 2500, None, Commands::START_STOP);
    assert_eq!(s.stage(), Stage::Preheat);
    assert_eq!(s.window_start_ms(), now + 2500);
    assert_eq!(s.last_change_ms(), now + 2500);
    assert_eq!(s.elapsed_s(now + 4500), 2);
}

#[test]
fn snapshot_hides_setpoint_when_not_running() {
    let mut s = fresh(Profile::Leaded);
    tick(&mut s, 0, Some(Ok(25.0)), Commands::NONE);
    let snap = s.snapshot(0);
    assert_eq!(snap.stage, Stage::Idle);
    assert_eq!(snap.setpoint, None);
    assert_eq!(snap.reading, Some(25.0));
    assert_eq!(snap.profile, Profile::Leaded);

    tick(&mut s, 1000, Some(Ok(25.0)), Commands::START_STOP);
    let snap = s.snapshot(4000);
    assert_eq!(snap.setpoint, Some(150.0));
    assert_eq!(snap.elapsed_s, 3);
}
