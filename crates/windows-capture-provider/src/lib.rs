//! # Windows Capture Provider
//! Enumerates displays and captures single frames through Windows.Graphics.Capture.
//!

#![cfg(windows)]

pub mod capture;
pub mod directx;
pub mod monitor;
mod result;

pub use capture::WindowsCaptureProvider;
pub use directx::DirectX;
pub use monitor::WindowsDisplaySource;
pub use result::{LabelledWinResult, WinError, WinErrorSource};
