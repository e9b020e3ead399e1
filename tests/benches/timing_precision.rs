use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use din_sync_core::hal::mock::{MockLine, MockPulseTimer};
use din_sync_core::{ButtonDebouncer, Irq, MidiMessage, SyncConfig, SyncCore, SyncState};
use din_sync_tests::scenarios::follow_midi_clock;

/// Interrupt path for one timing clock byte while running
fn bench_clock_interrupt(c: &mut Criterion) {
    let state = SyncState::new();
    let mut core = SyncCore::new(
        &state,
        MockPulseTimer::started(),
        MockLine::new(),
        MockLine::new(),
        SyncConfig::default(),
    )
    .unwrap();
    core.service(Irq::SerialRx(MidiMessage::START)).ok();

    c.bench_function("clock_byte_to_pulse", |b| {
        b.iter(|| {
            core.engine_mut().timer_mut().advance(20_833);
            core.service(black_box(Irq::SerialRx(MidiMessage::TIMING_CLOCK))).ok();
            core.service(Irq::CompareMatch).ok();
        })
    });
}

/// Tick interrupt in internal mode, including the phase accumulator
fn bench_tick_interrupt(c: &mut Criterion) {
    let state = SyncState::new();
    let mut core = SyncCore::new(
        &state,
        MockPulseTimer::started(),
        MockLine::new(),
        MockLine::new(),
        SyncConfig::default(),
    )
    .unwrap();
    core.handle_button(din_sync_core::ButtonEvent::LongPress).ok();
    core.handle_button(din_sync_core::ButtonEvent::ShortPress).ok();

    c.bench_function("internal_tick", |b| {
        b.iter(|| core.service(black_box(Irq::Tick)).ok())
    });
}

fn bench_debouncer(c: &mut Criterion) {
    let mut debouncer = ButtonDebouncer::new(&SyncConfig::default());
    let mut pressed = false;
    let mut n = 0u32;

    c.bench_function("debounce_sample", |b| {
        b.iter(|| {
            n = n.wrapping_add(1);
            if n % 300 == 0 {
                pressed = !pressed;
            }
            black_box(debouncer.sample(pressed))
        })
    });
}

fn bench_simulated_second(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulated_second");
    for bpm in [60u32, 120, 300] {
        let clocks = (bpm * 24 / 60) as usize;
        group.bench_with_input(BenchmarkId::from_parameter(bpm), &clocks, |b, &clocks| {
            b.iter(|| {
                let state = SyncState::new();
                let sim = follow_midi_clock(&state, bpm, clocks);
                black_box(sim.capture().pulses().len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_clock_interrupt,
    bench_tick_interrupt,
    bench_debouncer,
    bench_simulated_second
);
criterion_main!(benches);
