use std::sync::Arc;

use super::*;
use crate::audio::test_support::{silent_wav, wav_bytes};

const RATE: u32 = 100;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn offline_track() -> Track {
    Track::new(
        TrackSettings::default(),
        AudioBackend::Offline {
            sample_rate: RATE,
            channels: 2,
        },
    )
}

fn source(bytes: Vec<u8>) -> TrackSource {
    TrackSource {
        bytes: Arc::from(bytes),
        display_name: "Drum loop".to_string(),
        source: "drums.wav".to_string(),
    }
}

fn initialized(seconds: f32, channels: u16) -> Track {
    let mut track = offline_track();
    let status = track.initialize(source(silent_wav(RATE, channels, seconds)));
    assert_eq!(status, TrackStatus::Initialized);
    track
}

fn context(track: &Track) -> &AudioContext {
    track.audio_context().expect("initialized track has a context")
}

#[test]
fn initialize_exposes_one_mono_sample_per_frame() {
    let track = initialized(2.0, 2);
    assert_eq!(track.status(), TrackStatus::Initialized);
    assert_eq!(track.samples().len(), 200);
    assert!(track.samples().iter().all(|&s| s == 0.0));
    assert_eq!(track.display_name(), "Drum loop");
    assert_eq!(track.source(), "drums.wav");
    assert!(approx(track.duration(), 2.0));
}

#[test]
fn undecodable_bytes_fail_without_leaving_audio_behind() {
    let mut track = offline_track();
    let status = track.initialize(source(b"definitely not audio".to_vec()));
    assert_eq!(status, TrackStatus::FailedToInitialize);
    assert!(track.last_error().is_some());
    assert!(track.samples().is_empty());
    assert!(track.audio_context().is_none());
    track.play();
    assert!(!track.is_playing());
}

#[test]
fn late_decode_results_are_dropped_after_clear() {
    let mut track = offline_track();
    let request = source(silent_wav(RATE, 1, 1.0));
    track.begin_initialize(&request);
    assert_eq!(track.status(), TrackStatus::Initializing);
    track.clear();
    let decoded = crate::audio::decode_audio(&request.bytes, request.extension());
    assert_eq!(track.complete_initialize(decoded), TrackStatus::Uninitialized);
    assert!(track.samples().is_empty());
}

#[test]
fn loop_locator_drives_playback_bounds() {
    let mut track = initialized(2.0, 2);
    track.update_locators(
        LocatorKind::Loop,
        Locator::span(0.2, 0.6),
        UpdateOptions::default(),
    );
    track.play();
    let times = track.active_loop_times().expect("playing");
    assert!(approx(times.start, 0.4));
    assert!(approx(times.end, 1.2));
    assert!(times.looping);
}

#[test]
fn focal_zoom_then_reset_restores_default_state() {
    let mut track = initialized(2.0, 2);
    let before = track.zoom_state();
    track.zoom(ZoomRequest::Focal {
        factor: FactorUpdate::Set(0.5),
        focus: 0.5,
    });
    assert!(approx(track.zoom_state().factor, 0.5));
    assert!(approx(track.zoom_window().to_normalized(0.5), 0.5));
    track.zoom(ZoomRequest::Reset);
    assert_eq!(track.zoom_state(), before);
    assert_eq!(track.locators().zoom(), None);
}

#[test]
fn reversed_drag_is_stored_ordered() {
    let mut track = initialized(1.0, 2);
    track.update_locators(
        LocatorKind::Loop,
        Locator {
            start: 0.7,
            end: Some(0.3),
        },
        UpdateOptions::default(),
    );
    assert_eq!(track.locators().loop_region(), Some(Locator::span(0.3, 0.7)));
}

#[test]
fn resize_during_playback_rebuilds_without_moving_the_cursor() {
    let mut track = initialized(2.0, 2);
    track.attach_canvas(CanvasSize {
        width: 50.0,
        height: 20.0,
    });
    assert_eq!(track.canvas().map(WaveformCanvas::size), Some([100, 40]));
    track.update_locators(
        LocatorKind::Loop,
        Locator::span(0.0, 0.5),
        UpdateOptions::default(),
    );
    track.play();
    context(&track).advance(0.25);
    let cursor = track.cursor_position();
    let epoch = track.canvas().map(|c| c.peaks().epoch());
    let renders = track.canvas().map(WaveformCanvas::offscreen_renders);

    track.observe_resize(CanvasSize {
        width: 80.0,
        height: 20.0,
    });

    let canvas = track.canvas().expect("attached");
    assert_eq!(canvas.size(), [160, 40]);
    assert_ne!(Some(canvas.peaks().epoch()), epoch);
    assert_eq!(Some(canvas.offscreen_renders()), renders.map(|r| r + 1));
    assert_eq!(track.cursor_position(), cursor);
    assert!(approx(cursor.expect("playing"), 0.125));
}

#[test]
fn zero_and_unchanged_sizes_skip_the_draw() {
    let mut track = initialized(1.0, 2);
    let size = CanvasSize {
        width: 40.0,
        height: 10.0,
    };
    track.attach_canvas(size);
    let renders = track.canvas().map(WaveformCanvas::offscreen_renders);
    track.observe_resize(size);
    track.observe_resize(CanvasSize {
        width: 0.0,
        height: 10.0,
    });
    assert_eq!(track.canvas().map(WaveformCanvas::offscreen_renders), renders);
    assert_eq!(track.canvas_dom_size(), Some(size));
}

#[test]
fn loop_updates_keep_the_previous_loop() {
    let mut track = initialized(1.0, 2);
    let first = Locator::span(0.1, 0.2);
    let second = Locator::span(0.4, 0.9);
    track.update_locators(LocatorKind::Loop, first, UpdateOptions::default());
    track.update_locators(LocatorKind::Loop, second, UpdateOptions::default());
    assert_eq!(track.locators().get(LocatorKind::PrevLoop), Some(first));

    track.restore_previous_loop();
    assert_eq!(track.locators().loop_region(), None);
    assert_eq!(track.locators().get(LocatorKind::PrevLoop), Some(second));

    track.restore_previous_loop();
    assert_eq!(track.locators().loop_region(), Some(second));
}

#[test]
fn cycling_a_playing_loop_off_plays_the_window_once() {
    let mut track = initialized(2.0, 2);
    track.update_locators(LocatorKind::Loop, Locator::span(0.5, 1.0), UpdateOptions::default());
    track.play();
    assert!(track.active_loop_times().expect("playing").looping);
    track.restore_previous_loop();
    let times = track.active_loop_times().expect("still playing");
    assert!(!times.looping);
    assert!(approx(times.start, 0.0));
    assert_eq!(context(&track).active_sources(), 1);
}

#[test]
fn reinitializing_starts_from_a_clean_slate() {
    let mut track = initialized(2.0, 2);
    track.attach_canvas(CanvasSize {
        width: 20.0,
        height: 10.0,
    });
    track.update_locators(LocatorKind::Loop, Locator::span(0.2, 0.6), UpdateOptions::default());
    track.zoom(ZoomRequest::Focal {
        factor: FactorUpdate::Set(0.5),
        focus: 0.5,
    });
    track.play();

    let next = TrackSource {
        bytes: Arc::from(silent_wav(RATE, 1, 1.0)),
        display_name: "Bass".to_string(),
        source: "bass.wav".to_string(),
    };
    track.begin_initialize(&next);
    assert_eq!(track.status(), TrackStatus::Initializing);
    assert!(!track.is_playing());
    assert!(track.samples().is_empty());
    assert!(track.audio_context().is_none());
    track.play();
    assert!(!track.is_playing());
    assert_eq!(track.locators(), &Locators::default());
    assert_eq!(track.zoom_state(), ZoomState::default());
    assert!(track.canvas().is_some());

    let decoded = crate::audio::decode_audio(&next.bytes, next.extension());
    assert_eq!(track.complete_initialize(decoded), TrackStatus::Initialized);
    assert_eq!(track.samples().len(), 100);
    assert_eq!(track.locators().loop_region(), None);
    assert!(approx(track.zoom_window().start, 0.0));
    assert!(approx(track.zoom_window().factor, 1.0));
    assert_eq!(track.display_name(), "Bass");
}

#[test]
fn setting_a_loop_clears_hover() {
    let mut track = initialized(1.0, 2);
    track.hover_at(Some(0.4));
    assert_eq!(track.locators().hover(), Some(Locator::point(0.4)));
    track.update_locators(
        LocatorKind::Loop,
        LocatorUpdate::map(|_| Some(Locator::span(0.1, 0.3))),
        UpdateOptions::default(),
    );
    assert_eq!(track.locators().hover(), None);
}

#[test]
fn restarting_a_loop_keeps_one_live_source() {
    let mut track = initialized(2.0, 2);
    track.update_locators(LocatorKind::Loop, Locator::span(0.0, 0.5), UpdateOptions::RESTART);
    assert!(!track.is_playing());
    track.play();
    context(&track).advance(0.3);
    track.update_locators(LocatorKind::Loop, Locator::span(0.25, 0.75), UpdateOptions::RESTART);
    assert!(track.is_playing());
    assert_eq!(context(&track).active_sources(), 1);
    assert!(approx(track.started_playing_at().expect("playing"), 0.3));
    assert!(approx(track.active_loop_times().expect("playing").start, 0.5));
}

#[test]
fn one_shot_playback_pauses_after_the_end() {
    let mut track = initialized(1.0, 2);
    track.play();
    assert!(!track.sync_playback());
    context(&track).advance(1.5);
    assert!(track.sync_playback());
    assert!(!track.is_playing());
    assert_eq!(track.cursor_position(), None);
}

#[test]
fn region_zoom_consumes_the_loop() {
    let mut track = initialized(1.0, 2);
    track.update_locators(LocatorKind::Loop, Locator::span(0.2, 0.4), UpdateOptions::default());
    track.zoom_to_loop();
    assert_eq!(track.locators().loop_region(), None);
    let window = track.zoom_window();
    assert!(approx(window.start, 0.2));
    assert!(approx(window.factor, 0.2));
}

#[test]
fn pan_is_pinned_for_mono_buffers() {
    let mut mono = initialized(1.0, 1);
    mono.set_pan(-0.8);
    assert_eq!(mono.pan(), 0.0);

    let mut stereo = initialized(1.0, 2);
    stereo.set_pan(-3.0);
    assert_eq!(stereo.pan(), -1.0);
    stereo.set_gain(0.25);
    assert_eq!(stereo.gain(), 0.25);
}

#[test]
fn gain_reaches_the_rendered_output() {
    let mut track = offline_track();
    let bytes = wav_bytes(RATE, 1, &vec![0.5; 100]);
    assert_eq!(track.initialize(source(bytes)), TrackStatus::Initialized);
    track.set_gain(0.5);
    track.play();
    let frames = context(&track).render(10);
    assert!(frames.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn clear_returns_every_field_to_default() {
    let mut track = initialized(1.0, 2);
    track.attach_canvas(CanvasSize {
        width: 10.0,
        height: 10.0,
    });
    track.update_locators(LocatorKind::Loop, Locator::span(0.1, 0.2), UpdateOptions::default());
    track.zoom(ZoomRequest::Focal {
        factor: FactorUpdate::Set(0.5),
        focus: 0.0,
    });
    track.play();
    track.clear();
    assert_eq!(track.status(), TrackStatus::Uninitialized);
    assert!(!track.is_playing());
    assert!(track.canvas().is_none());
    assert!(track.samples().is_empty());
    assert_eq!(track.locators(), &Locators::default());
    assert_eq!(track.zoom_state(), ZoomState::default());
    assert!(track.display_name().is_empty());
}
