//! Source state machine driven through `ManualDevice`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use musigen_core::monitor::MONITOR_LEN;
use musigen_engine::{
    ConfigError, DeviceError, Engine, EngineConfig, Error, ManualDevice, ManualDriver, Monitor, PlaybackState,
    SourceKind, Synth,
};
use proptest::prelude::*;

fn engine() -> (Engine<ManualDevice>, ManualDriver) {
    engine_with(EngineConfig::default())
}

fn engine_with(config: EngineConfig) -> (Engine<ManualDevice>, ManualDriver) {
    let (dev, driver) = ManualDevice::new();
    (Engine::new(dev, config).unwrap(), driver)
}

#[test]
fn play_render_stop_round_trip() {
    let (mut engine, driver) = engine();
    assert_eq!(engine.state(), PlaybackState::Stopped);

    engine.select_source(SourceKind::Sine).unwrap();
    assert!(engine.is_playing());
    assert_eq!(engine.state(), PlaybackState::PlayingSine);
    assert!(driver.is_running());

    let block = engine.render(256).unwrap();
    assert_eq!(block.len(), 256);
    assert_eq!(block[0], 0.0);
    assert!(block.iter().all(|v| v.is_finite()));

    engine.select_source(SourceKind::Stop).unwrap();
    assert!(!engine.is_playing());
    assert_eq!(driver.bound_stream(), None);
}

#[test]
fn switching_replaces_the_stream() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Sine).unwrap();
    let sine_stream = driver.bound_stream().unwrap();
    let sine_block = driver.pull(256).unwrap();

    engine.select_source(SourceKind::Fm).unwrap();
    let fm_stream = driver.bound_stream().unwrap();
    assert_ne!(sine_stream, fm_stream);
    assert_eq!((driver.opened(), driver.closed()), (2, 1));
    let fm_block = driver.pull(256).unwrap();

    // Same sequence on a standalone dispatcher: the pulled audio must come
    // from the FM-configured path.
    let mut reference = Synth::new(&EngineConfig::default(), Arc::new(Monitor::new())).unwrap();
    let mut expected = vec![0.0_f32; 256];
    reference.set_source(SourceKind::Sine);
    reference.render(&mut expected).unwrap();
    assert_eq!(sine_block, expected);
    reference.set_source(SourceKind::Fm);
    reference.render(&mut expected).unwrap();
    assert_eq!(fm_block, expected);
}

#[test]
fn reselecting_the_active_source_touches_nothing() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Stop).unwrap();
    assert_eq!((driver.opened(), driver.closed()), (0, 0));

    engine.select_source(SourceKind::Wavetable).unwrap();
    let stream = driver.bound_stream();
    engine.select_source(SourceKind::Wavetable).unwrap();
    engine.select_source(SourceKind::Wavetable).unwrap();
    assert_eq!((driver.opened(), driver.closed()), (1, 0));
    assert_eq!(driver.bound_stream(), stream);
}

#[test]
fn teardown_twice_is_fine() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Fm).unwrap();
    engine.teardown().unwrap();
    engine.teardown().unwrap();

    assert!(!engine.is_playing());
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert!(driver.is_released());
    assert_eq!((driver.opened(), driver.closed()), (1, 1));
}

#[test]
fn teardown_from_stopped_is_fine() {
    let (mut engine, driver) = engine();
    engine.teardown().unwrap();
    assert!(driver.is_released());
    assert_eq!(driver.opened(), 0);
}

#[test]
fn selecting_after_teardown_is_refused() {
    let (mut engine, driver) = engine();
    engine.teardown().unwrap();
    assert!(matches!(
        engine.select_source(SourceKind::Sine),
        Err(Error::Device(DeviceError::Released))
    ));
    assert_eq!(driver.opened(), 0);
}

#[test]
fn failed_open_rolls_back_to_stopped() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Sine).unwrap();

    driver.fail_next_open(DeviceError::Busy);
    let err = engine.select_source(SourceKind::Fm).unwrap_err();
    assert!(matches!(err, Error::Device(DeviceError::Busy)));
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert!(!engine.is_playing());
    assert_eq!(driver.bound_stream(), None);

    // The caller may simply retry.
    engine.select_source(SourceKind::Fm).unwrap();
    assert_eq!(engine.state(), PlaybackState::PlayingFm);
}

#[test]
fn failed_start_closes_the_new_stream() {
    let (mut engine, driver) = engine();
    driver.fail_next_start(DeviceError::Start("device unplugged".into()));
    assert!(engine.select_source(SourceKind::Wavetable).is_err());
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert_eq!((driver.opened(), driver.closed()), (1, 1));
    assert_eq!(driver.bound_stream(), None);
}

#[test]
fn nothing_renders_after_stop_returns() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Sine).unwrap();
    assert!(driver.pull(128).is_some());
    let rendered = engine.frames_rendered();

    engine.select_source(SourceKind::Stop).unwrap();
    assert!(driver.pull(128).is_none());
    assert_eq!(engine.frames_rendered(), rendered);
}

#[test]
fn snapshot_is_zero_before_any_render() {
    let (engine, _driver) = engine();
    let snap = engine.snapshot();
    assert_eq!(snap.len(), MONITOR_LEN);
    assert!(snap.iter().all(|&v| v == 0.0));
}

#[test]
fn snapshot_follows_pulled_audio() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Fm).unwrap();
    let block = driver.pull(2048).unwrap();
    assert_eq!(engine.snapshot(), block[2048 - MONITOR_LEN..].to_vec());
}

#[test]
fn stereo_streams_duplicate_mono() {
    let (mut engine, driver) = engine_with(EngineConfig { channels: 2, ..EngineConfig::default() });
    engine.select_source(SourceKind::Sine).unwrap();
    assert_eq!(driver.bound_spec().map(|s| s.channels), Some(2));

    let block = driver.pull(128).unwrap();
    assert_eq!(block.len(), 256);
    assert!(block.chunks_exact(2).all(|f| f[0] == f[1]));
}

#[test]
fn oversized_device_block_is_silent_and_counted() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Sine).unwrap();
    let block = driver.pull(22_051).unwrap();
    assert!(block.iter().all(|&v| v == 0.0));
    assert_eq!(engine.render_faults(), 1);
    assert!(engine.is_playing());
}

#[test]
fn oversized_direct_render_is_a_config_error() {
    let (engine, _driver) = engine();
    assert!(matches!(
        engine.render(30_000),
        Err(Error::Config(ConfigError::FrameCountTooLarge { frames: 30_000, capacity: 22_050 }))
    ));
}

#[test]
fn concurrent_snapshots_stay_bounded() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Wavetable).unwrap();
    let monitor = engine.monitor();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut reads = 0_u32;
            loop {
                let finished = done.load(Ordering::Acquire);
                let snap = monitor.snapshot();
                assert_eq!(snap.len(), MONITOR_LEN);
                // volume plus one echo at most
                assert!(snap.iter().all(|v| v.is_finite() && v.abs() <= 0.75 + 1e-6));
                reads += 1;
                if finished {
                    return reads;
                }
            }
        })
    };

    for _ in 0..200 {
        driver.pull(512).unwrap();
    }
    done.store(true, Ordering::Release);
    assert!(reader.join().unwrap() > 0);
}

#[test]
fn dropping_the_engine_closes_and_releases() {
    let (mut engine, driver) = engine();
    engine.select_source(SourceKind::Sine).unwrap();
    drop(engine);
    assert_eq!(driver.closed(), 1);
    assert!(driver.is_released());
    assert!(driver.pull(16).is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn render_returns_exactly_the_requested_frames(
        frames in 1usize..=22_050,
        source in prop::sample::select(SourceKind::ALL.to_vec()),
    ) {
        let (mut engine, _driver) = engine();
        engine.select_source(source).unwrap();
        let block = engine.render(frames).unwrap();
        prop_assert_eq!(block.len(), frames);
        prop_assert!(block.iter().all(|v| v.is_finite()));
    }
}
