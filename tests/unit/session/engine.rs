use super::*;
use crate::source::simulated::{SimulatedHandle, SimulatedSource};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn canvas() -> Canvas {
    Canvas::new(320, 180).unwrap()
}

fn engine_with(kind: SourceKind, duration: f64) -> (Engine, SimulatedHandle) {
    let mut engine = Engine::new(EngineConfig::default(), canvas()).unwrap();
    let (src, handle) = SimulatedSource::new(kind, Some(duration));
    engine.load_source(Box::new(src));
    (engine, handle)
}

fn looped(engine: &mut Engine, start: f64, end: f64) {
    engine.set_loop_in(start);
    engine.set_loop_out(end);
    engine.set_loop_enabled(true);
}

#[test]
fn forward_step_past_out_wraps_to_in() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    looped(&mut e, 2.0, 5.0);
    h.set_time(4.0);
    assert_eq!(e.step_advance(4.0), Some(2.0));
    assert_eq!(h.time(), 2.0);
}

#[test]
fn backward_step_from_in_wraps_to_safe_out() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    looped(&mut e, 2.0, 5.0);
    h.set_time(2.0);
    let t = e.step_advance(-1.0).unwrap();
    assert!(t > 2.0 && t < 5.0, "{t}");
    assert!((t - (5.0 - 0.005)).abs() < 1e-9);
}

#[test]
fn step_near_out_lands_on_safe_out() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    looped(&mut e, 2.0, 5.0);
    h.set_time(4.9);
    let t = e.step_advance(0.0998).unwrap();
    assert!(t < 5.0 && t > 4.9, "{t}");
    // Forward from within the wrap window goes back to `in`.
    h.set_time(4.999);
    assert_eq!(e.step_advance(0.1), Some(2.0));
}

#[test]
fn step_outside_loop_clamps_to_media() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 3.0);
    h.set_time(2.95);
    assert_eq!(e.step_advance(0.1), Some(3.0));
    h.set_time(0.05);
    assert_eq!(e.step_advance(-0.1), Some(0.0));
}

#[test]
fn manual_step_pauses_everything() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.play();
    assert_eq!(e.mode(), PlaybackMode::NativePlaying);
    e.step_by(0.1);
    assert_eq!(e.mode(), PlaybackMode::NativePaused);
    assert!(!h.is_playing());
    assert!((h.time() - 0.1).abs() < 1e-12);
}

#[test]
fn step_play_and_native_play_are_exclusive() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.play();
    e.toggle_step_play();
    assert_eq!(e.mode(), PlaybackMode::StepPlaying);
    assert!(!h.is_playing());

    // Pause keeps step-play armed; the next play resumes stepping.
    e.toggle_play();
    assert_eq!(e.mode(), PlaybackMode::NativePaused);
    assert!(e.step_play_armed());
    e.toggle_play();
    assert_eq!(e.mode(), PlaybackMode::StepPlaying);

    e.toggle_step_play();
    e.play();
    assert_eq!(e.mode(), PlaybackMode::NativePlaying);
}

#[test]
fn step_play_advances_once_per_interval() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.tick(ms(0));
    e.toggle_step_play();

    assert_eq!(e.tick(ms(50)).time, 0.0);
    let out = e.tick(ms(100));
    assert!((out.time - 0.1).abs() < 1e-12);
    assert_eq!(out.mode, PlaybackMode::StepPlaying);
    assert!((h.time() - 0.1).abs() < 1e-12);
    e.tick(ms(150));
    assert!((e.tick(ms(200)).time - 0.2).abs() < 1e-12);
}

#[test]
fn stopping_step_play_cancels_pending_ticks() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.tick(ms(0));
    e.toggle_step_play();
    e.pause();
    assert_eq!(e.tick(ms(500)).time, 0.0);
    assert_eq!(h.time(), 0.0);
}

#[test]
fn rate_change_restarts_step_timer() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.tick(ms(0));
    e.toggle_step_play();
    e.tick(ms(40));
    e.set_rate(2.0);
    assert_eq!(h.rate(), 2.0);
    // New 50ms interval counted from the last tick at 40ms.
    assert_eq!(e.tick(ms(89)).time, 0.0);
    assert!((e.tick(ms(90)).time - 0.1).abs() < 1e-12);
}

#[test]
fn native_playback_wraps_at_loop_out() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    looped(&mut e, 2.0, 5.0);
    assert_eq!(h.time(), 2.0);
    e.play();
    h.advance(3.2);
    let out = e.tick(ms(16));
    assert_eq!(out.time, 2.0);
    assert_eq!(h.time(), 2.0);
    assert_eq!(out.mode, PlaybackMode::NativePlaying);
}

#[test]
fn invalid_loop_is_not_enforced() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    looped(&mut e, 5.0, 2.0);
    assert_eq!(e.loop_status(), LoopStatus::Invalid);
    h.set_time(7.0);
    assert_eq!(e.tick(ms(16)).time, 7.0);
}

#[test]
fn hold_refreezes_remote_player_on_drift() {
    let (mut e, h) = engine_with(SourceKind::RemotePlayer, 10.0);
    h.set_time(3.0);
    e.set_hold(true);
    assert_eq!(e.hold_time(), Some(3.0));

    h.set_time(3.01);
    assert_eq!(e.tick(ms(16)).time, 3.01);

    h.set_time(3.5);
    let out = e.tick(ms(32));
    assert_eq!(out.time, 3.0);
    assert_eq!(h.time(), 3.0);
    assert!(!h.is_playing());

    // Seeks move the held time along.
    e.step_by(0.1);
    assert!((e.hold_time().unwrap() - 3.1).abs() < 1e-12);

    // Native play releases hold.
    e.play();
    assert_eq!(e.hold_time(), None);
}

#[test]
fn hold_is_ignored_for_local_media() {
    let (mut e, _h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.set_hold(true);
    assert_eq!(e.hold_time(), None);
}

#[test]
fn source_switch_clears_session_state() {
    let (mut e, old) = engine_with(SourceKind::LocalMedia, 10.0);
    looped(&mut e, 1.0, 4.0);
    e.pointer_down(NormPoint::new(0.1, 0.1));
    e.pointer_move(NormPoint::new(0.5, 0.5));
    e.set_tool(Tool::Point);
    e.toggle_step_play();

    let (src, new) = SimulatedSource::new(SourceKind::LocalMedia, Some(6.0));
    e.load_source(Box::new(src));

    assert!(old.is_released());
    assert!(e.store().is_empty());
    assert!(!e.step_play_armed());
    assert_eq!(e.mode(), PlaybackMode::NativePaused);
    assert_eq!(
        e.loop_range(),
        LoopRange {
            start: 0.0,
            end: 6.0,
            enabled: false
        }
    );
    // The aborted stroke is not committed on release.
    assert_eq!(e.pointer_up(), None);
    assert!(e.store().is_empty());
    assert_eq!(new.seeks(), vec![0.0]);
}

#[test]
fn pending_source_is_adopted_on_first_ready_tick() {
    let mut e = Engine::new(EngineConfig::default(), canvas()).unwrap();
    e.set_rate(1.5);
    let (src, h) = SimulatedSource::pending(SourceKind::RemotePlayer, Some(8.0));
    e.load_source(Box::new(src));

    assert_eq!(e.tick(ms(0)).mode, PlaybackMode::Idle);
    e.play();
    assert!(!h.is_playing());

    h.set_time(2.0);
    h.set_ready(true);
    let out = e.tick(ms(16));
    assert_eq!(out.mode, PlaybackMode::NativePaused);
    assert_eq!(out.time, 0.0);
    assert_eq!(h.rate(), 1.5);
    assert_eq!(e.loop_range().end, 8.0);
    assert!(!e.loop_range().enabled);
}

#[test]
fn remote_reference_errors_leave_session_untouched() {
    let (mut e, _h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.set_tool(Tool::Point);
    e.pointer_down(NormPoint::new(0.5, 0.5));

    let err = e
        .load_remote("https://example.com/nothing", |_| unreachable!())
        .unwrap_err();
    assert!(matches!(err, OnionError::Source(_)));
    assert_eq!(e.store().len(), 1);
    assert_eq!(e.source_kind(), Some(SourceKind::LocalMedia));

    let id = e
        .load_remote("https://youtu.be/abcdefghijk", |_| {
            let (src, _) = SimulatedSource::new(SourceKind::RemotePlayer, Some(30.0));
            Ok(Box::new(src))
        })
        .unwrap();
    assert_eq!(id.as_str(), "abcdefghijk");
    assert_eq!(e.source_kind(), Some(SourceKind::RemotePlayer));
    assert!(e.store().is_empty());
}

#[test]
fn drawing_respects_draw_and_interact_flags() {
    let (mut e, _h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.set_tool(Tool::Point);

    e.set_interact(true);
    assert!(!e.draw_active());
    assert_eq!(e.pointer_down(NormPoint::new(0.5, 0.5)), None);

    e.set_interact(false);
    e.set_draw_enabled(false);
    assert_eq!(e.pointer_down(NormPoint::new(0.5, 0.5)), None);

    e.set_draw_enabled(true);
    assert_eq!(e.pointer_down(NormPoint::new(0.5, 0.5)), Some(TimeKey(0)));
}

#[test]
fn undo_and_clear_target_active_keyframe() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.set_tool(Tool::Point);
    h.set_time(1.0);
    e.pointer_down(NormPoint::new(0.1, 0.1));
    e.pointer_down(NormPoint::new(0.2, 0.2));
    h.set_time(2.0);
    e.pointer_down(NormPoint::new(0.3, 0.3));

    h.set_time(1.04);
    assert!(matches!(e.undo(), Some(Undone::Point(p)) if p == NormPoint::new(0.2, 0.2)));
    assert!(e.clear_current());
    assert_eq!(e.store().keys(), &[TimeKey(2000)]);

    e.clear_all();
    assert!(e.store().is_empty());
    assert!(!e.clear_current());
    assert_eq!(e.undo(), None);
}

#[test]
fn pen_stroke_shows_in_progress_then_active() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    h.set_time(0.5);
    e.pointer_down(NormPoint::new(0.1, 0.1));
    e.pointer_move(NormPoint::new(0.4, 0.4));
    let plan = e.tick(ms(16)).plan;
    assert_eq!(plan.layers.len(), 1);
    assert_eq!(plan.layers[0].kind, crate::render::onion::LayerKind::InProgress);

    // The playhead moves while drawing; the stroke keeps its press-time key.
    h.set_time(0.9);
    assert_eq!(e.pointer_up(), Some(TimeKey(500)));
    h.set_time(0.5);
    let plan = e.overlay();
    assert_eq!(plan.layers[0].kind, crate::render::onion::LayerKind::Active);
    assert_eq!(plan.layers[0].key, Some(TimeKey(500)));
}

#[test]
fn snap_and_jumps_pause_and_seek() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    h.set_time(1.234);
    e.play();
    e.snap_to_slot();
    assert!(!h.is_playing());
    assert!((h.time() - 1.2).abs() < 1e-12);

    looped(&mut e, 2.0, 5.0);
    e.jump_to_loop_out();
    assert!((h.time() - 4.995).abs() < 1e-9);
    e.jump_to_loop_in();
    assert_eq!(h.time(), 2.0);

    h.set_time(7.33);
    e.snap_to_slot();
    assert!(h.time() < 5.0);
}

#[test]
fn loop_bar_and_handles_work_in_fractions() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.seek_to_fraction(0.25);
    assert_eq!(h.time(), 2.5);

    e.drag_loop_handle(LoopHandle::In, 0.4);
    e.drag_loop_handle(LoopHandle::Out, 0.6);
    e.set_loop_enabled(true);
    // Playhead pulled into [4, 6).
    assert_eq!(h.time(), 4.0);

    e.seek_to_fraction(0.9);
    assert!(h.time() < 6.0);

    let bar = e.loop_bar().unwrap();
    assert!((bar.in_fraction - 0.4).abs() < 1e-12);
    assert!((bar.out_fraction - 0.6).abs() < 1e-12);
    assert!(bar.playhead_fraction < 0.6);

    e.set_loop_in_at_current();
    assert_eq!(e.loop_range().start, h.time());
}

#[test]
fn loop_bounds_clamp_to_known_duration() {
    let (mut e, _h) = engine_with(SourceKind::LocalMedia, 4.0);
    e.set_loop_out(12.0);
    assert_eq!(e.loop_range().end, 4.0);
    e.set_loop_in(-3.0);
    assert_eq!(e.loop_range().start, 0.0);
}

#[test]
fn readout_formats_time_and_slot() {
    let (e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    h.set_time(1.234);
    assert_eq!(e.readout(), "t=1.234s · slot=1.200s");
}

#[test]
fn operations_without_source_are_no_ops() {
    let mut e = Engine::new(EngineConfig::default(), canvas()).unwrap();
    e.play();
    e.step_by(0.1);
    e.toggle_play();
    e.snap_to_slot();
    e.seek_to_fraction(0.5);
    assert_eq!(e.step_advance(0.1), None);
    assert_eq!(e.pointer_down(NormPoint::new(0.5, 0.5)), None);
    assert_eq!(e.mode(), PlaybackMode::Idle);
    assert!(e.loop_bar().is_none());
    assert!(e.tick(ms(16)).plan.is_empty());
    e.unload();
}

#[test]
fn invalid_settings_are_rejected() {
    let mut e = Engine::new(EngineConfig::default(), canvas()).unwrap();
    e.set_rate(-1.0);
    e.set_video_step(0.0);
    assert_eq!(e.config().rate, 1.0);
    assert_eq!(e.config().video_step_seconds, 0.1);
    assert!(
        e.set_key_policy(KeyPolicy::Grid {
            slot_seconds: 0.0001
        })
        .is_err()
    );
    assert!(
        e.set_onion(OnionConfig {
            falloff: 2.0,
            ..OnionConfig::default()
        })
        .is_err()
    );
}

#[test]
fn free_policy_draw_then_undo_at_same_playhead() {
    let (mut e, h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.set_key_policy(KeyPolicy::FreeTimestamp {
        merge_epsilon_ms: 10,
    })
    .unwrap();
    e.set_tool(Tool::Point);
    h.set_time(1.010);
    e.pointer_down(NormPoint::new(0.2, 0.2));

    h.set_time(1.002);
    assert_eq!(e.pointer_down(NormPoint::new(0.8, 0.8)), Some(TimeKey(1010)));
    let plan = e.overlay();
    assert_eq!(plan.layers.len(), 1);
    assert_eq!(plan.layers[0].kind, crate::render::onion::LayerKind::Active);
    assert_eq!(plan.layers[0].points.len(), 2);

    assert!(matches!(e.undo(), Some(Undone::Point(_))));
    assert_eq!(e.store().get(TimeKey(1010)).unwrap().points().len(), 1);
    assert!(e.clear_current());
    assert!(e.store().is_empty());
}

#[test]
fn point_radius_applies_to_existing_markers() {
    let (mut e, _h) = engine_with(SourceKind::LocalMedia, 10.0);
    e.set_tool(Tool::Point);
    e.pointer_down(NormPoint::new(0.5, 0.5));
    assert_eq!(e.overlay().layers[0].points[0].radius, 6.0);

    e.set_point_radius(11.0);
    assert_eq!(e.overlay().layers[0].points[0].radius, 11.0);
    assert_eq!(e.config().point_radius, 11.0);

    e.set_point_radius(-1.0);
    assert_eq!(e.overlay().layers[0].points[0].radius, 11.0);
}
