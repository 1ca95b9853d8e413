//! # HDR Screenshot
//! Command line front end that captures every display into a single PNG.
//!

pub mod config;
pub mod logger;
pub mod options;
pub mod save;

/// The Cargo package version.
#[cfg(not(debug_assertions))]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Cargo package version or '0.0.0' if a non-release build.
#[cfg(debug_assertions)]
pub const VERSION: &str = "0.0.0";
