use super::*;

#[test]
fn advance_only_moves_while_playing_and_scales_by_rate() {
    let (mut src, handle) = SimulatedSource::new(SourceKind::LocalMedia, Some(10.0));
    handle.advance(1.0);
    assert_eq!(src.current_time(), 0.0);

    src.set_rate(2.0);
    src.play();
    handle.advance(0.5);
    assert_eq!(src.current_time(), 1.0);
    assert_eq!(handle.rate(), 2.0);
}

#[test]
fn playback_stops_at_end_of_media() {
    let (mut src, handle) = SimulatedSource::new(SourceKind::LocalMedia, Some(2.0));
    src.play();
    handle.advance(5.0);
    assert_eq!(src.current_time(), 2.0);
    assert!(!src.is_playing());
}

#[test]
fn seeks_are_clamped_and_recorded() {
    let (mut src, handle) = SimulatedSource::new(SourceKind::RemotePlayer, Some(4.0));
    src.seek(9.0);
    src.seek(-1.0);
    src.seek(1.5);
    assert_eq!(handle.seeks(), vec![4.0, 0.0, 1.5]);
    assert_eq!(handle.time(), 1.5);
    assert_eq!(src.kind(), SourceKind::RemotePlayer);
}

#[test]
fn pending_source_becomes_ready_through_handle() {
    let (mut src, handle) = SimulatedSource::pending(SourceKind::LocalMedia, Some(3.0));
    assert!(!src.is_ready());
    handle.set_ready(true);
    assert!(src.is_ready());

    src.play();
    src.release();
    assert!(handle.is_released());
    assert!(!handle.is_playing());
}
