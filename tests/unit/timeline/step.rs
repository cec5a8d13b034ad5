use super::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn interval_follows_step_and_rate() {
    assert_eq!(interval_for(0.1, 1.0), ms(100));
    assert_eq!(interval_for(0.1, 2.0), ms(50));
    assert_eq!(interval_for(0.1, 0.5), ms(200));
    // Rate floor of 0.05.
    assert_eq!(interval_for(0.1, 0.0), ms(2000));
    // Interval floor of 10ms.
    assert_eq!(interval_for(0.001, 4.0), ms(10));
    assert_eq!(interval_for(f64::NAN, 1.0), ms(10));
}

#[test]
fn poll_fires_once_per_interval() {
    let mut s = StepScheduler::new();
    assert!(!s.poll(ms(0)));

    s.start(ms(0), ms(100));
    assert!(!s.poll(ms(50)));
    assert!(s.poll(ms(100)));
    assert!(!s.poll(ms(120)));
    assert!(s.poll(ms(205)));
    assert!(s.poll(ms(300)));
}

#[test]
fn late_host_does_not_get_a_burst() {
    let mut s = StepScheduler::new();
    s.start(ms(0), ms(100));
    assert!(s.poll(ms(1000)));
    assert!(!s.poll(ms(1000)));
    assert!(!s.poll(ms(1099)));
    assert!(s.poll(ms(1100)));
}

#[test]
fn stop_cancels_pending_ticks_and_tickets() {
    let mut s = StepScheduler::new();
    let t1 = s.start(ms(0), ms(100));
    assert!(s.is_current(t1));

    s.stop();
    assert!(!s.is_running());
    assert!(!s.is_current(t1));
    assert!(!s.poll(ms(500)));

    let t2 = s.start(ms(500), ms(40));
    assert_ne!(t1, t2);
    assert!(!s.is_current(t1));
    assert!(s.is_current(t2));
}

#[test]
fn restart_replaces_interval() {
    let mut s = StepScheduler::new();
    let t1 = s.start(ms(0), ms(100));
    let t2 = s.restart(ms(30), ms(50));
    assert!(!s.is_current(t1));
    assert!(s.is_current(t2));
    assert_eq!(s.interval(), Some(ms(50)));
    assert!(!s.poll(ms(79)));
    assert!(s.poll(ms(80)));
}
