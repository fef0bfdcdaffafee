use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use reflow_core::{Commands, ControlCfg, ProcessState, Profile, Stage, tick};

// A plate trace that walks a lead-free cycle: 1 °C/s preheat, 0.5 °C/s soak,
// 1 °C/s to a small overshoot, then 2 °C/s cooling.
fn cycle_trace() -> Vec<f32> {
    let mut v = Vec::with_capacity(400);
    let mut t = 30.0f32;
    while t < 150.0 {
        v.push(t);
        t += 1.0;
    }
    for _ in 0..100 {
        v.push(t);
        t += 0.5;
    }
    while t < 252.0 {
        v.push(t);
        t += 1.0;
    }
    while t > 20.0 {
        v.push(t);
        t -= 2.0;
    }
    v
}

fn bench_tick(c: &mut Criterion) {
    let trace = cycle_trace();

    c.bench_function("tick_idle_no_sample", |b| {
        let mut s = ProcessState::new(ControlCfg::default(), Profile::LeadFree);
        tick(&mut s, 0, Some(Ok(25.0)), Commands::NONE);
        let mut now = 0u64;
        b.iter(|| {
            now += 10;
            black_box(tick(&mut s, now, None, Commands::NONE));
        });
    });

    c.bench_function("full_cycle_1hz_samples_100hz_ticks", |b| {
        b.iter_batched(
            || ProcessState::new(ControlCfg::default(), Profile::LeadFree),
            |mut s| {
                tick(&mut s, 0, Some(Ok(trace[0])), Commands::START_STOP);
                let mut now = 0u64;
                for t in &trace[1..] {
                    for _ in 0..99 {
                        now += 10;
                        tick(&mut s, now, None, Commands::NONE);
                    }
                    now += 10;
                    tick(&mut s, now, Some(Ok(*t)), Commands::NONE);
                    if s.stage() == Stage::TooHot {
                        break;
                    }
                }
                black_box(s.stage())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
