use crate::{CapturedFrame, Display, PixelFormat};

/// Acquires a single frame of a display.
pub trait CaptureProvider: Sync {
    /// The error returned when a capture fails.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Capture exactly one frame of `display` in `format`, blocking the calling thread until it
    /// arrives. Providers must support concurrent calls for different displays.
    fn capture(&self, display: &Display, format: PixelFormat)
    -> Result<CapturedFrame, Self::Error>;
}
