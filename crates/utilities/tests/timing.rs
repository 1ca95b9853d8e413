use core::time::Duration;

use utilities::{DebugTime, display_duration};

#[test]
fn display_duration_units() {
    assert_eq!(display_duration(Duration::from_secs(12)), "12s");
    assert_eq!(display_duration(Duration::from_millis(1500)), "1.5s");
    assert_eq!(display_duration(Duration::from_millis(250)), "250ms");
    assert_eq!(display_duration(Duration::from_micros(42)), "42µs");
    assert_eq!(display_duration(Duration::from_nanos(7)), "7ns");
}

#[test]
fn finish_returns_elapsed() {
    let timer = DebugTime::start("sleep");
    assert_eq!(timer.label(), "sleep");

    std::thread::sleep(Duration::from_millis(5));
    let elapsed = timer.finish();

    assert!(elapsed >= Duration::from_millis(5));
}
