//! # HDR Capture
//! Platform independent core of the multi-display screenshot pipeline.
//!
//! Holds the display and frame data model, the traits implemented by platform providers, the
//! composer that places each capture on a shared canvas, and the orchestrator that drives a
//! single screenshot run.
//!

pub mod capture_provider;
pub mod compose;
pub mod config;
pub mod device_lock;
pub mod display;
pub mod frame;
pub mod persist;
pub mod run;
pub mod tonemap;

pub use capture_provider::CaptureProvider;
pub use compose::{Canvas, PlaceError, union_rect};
pub use config::{ConfigError, FailurePolicy, HdrMode, RunConfig};
pub use device_lock::{DeviceGuard, DeviceLock};
pub use display::{Display, DisplayId, DisplayRect, DisplaySource, HdrMetadata};
pub use frame::{CapturedFrame, FrameError, PixelFormat};
pub use persist::PersistenceSink;
pub use run::{DisplayError, RunError, RunReport, Screenshot, Screenshotter};
pub use tonemap::{InvalidToneMapParams, ToneMapParams, ToneMapPolicy, Tonemapper};

/// A boxed error from a platform provider.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;
