//! Tests for display enumeration
//!

#![cfg(windows)]

use hdr_capture::DisplaySource;
use windows_capture_provider::{
    WindowsDisplaySource,
    monitor::{color_states, max_luminances, monitor_geometry},
};

#[test]
fn enumerate_displays() {
    let displays = WindowsDisplaySource::new().displays().unwrap();
    assert!(!displays.is_empty(), "At least one display must be attached");

    for display in displays {
        assert!(display.rect.width() > 0);
        assert!(display.rect.height() > 0);
        assert!(!display.name.is_empty());

        if let Some(hdr) = display.hdr {
            assert!(hdr.sdr_white_nits > 0.0);
        }
    }
}

#[test]
fn every_monitor_has_a_colour_state() {
    let geometry = monitor_geometry().unwrap();
    let states = color_states().unwrap();

    for monitor in geometry {
        assert!(
            states.contains_key(&monitor.name),
            "{} has no display path",
            monitor.name
        );
    }
}

#[test]
fn every_monitor_has_a_luminance() {
    let geometry = monitor_geometry().unwrap();
    let luminances = max_luminances().unwrap();

    for monitor in geometry {
        assert!(luminances.contains_key(&monitor.id));
    }
}
