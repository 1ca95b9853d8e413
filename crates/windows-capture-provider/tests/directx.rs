//! Tests for DirectX functions
//!

#![cfg(windows)]

use windows_capture_provider::DirectX;

#[test]
fn create_direct_x() {
    let direct_x = DirectX::new(false).unwrap();
    direct_x.trim().unwrap();
    drop(direct_x);
}

#[test]
fn create_direct_x_with_debug_layer() {
    // Falls back to a normal device if the debug layer is not installed.
    let direct_x = DirectX::new(true).unwrap();
    drop(direct_x);
}
