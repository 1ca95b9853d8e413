mod display_config;
mod geometry;
mod luminance;

use hdr_capture::{Display, DisplayId, DisplaySource, display::join_displays};
use thiserror::Error;
use tracing::{debug, instrument};
use windows::Win32::Graphics::Gdi::HMONITOR;

use crate::WinError;

pub use display_config::color_states;
pub use geometry::{GeometryError, monitor_geometry};
pub use luminance::max_luminances;

/// Enumerates displays through GDI, DXGI and the display configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsDisplaySource;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to enumerate monitors:\n{0}")]
    Geometry(#[source] GeometryError),

    #[error("Failed to query maximum luminance:\n{0}")]
    Luminance(#[source] WinError),

    #[error("Failed to query the display configuration:\n{0}")]
    DisplayConfig(#[source] WinError),
}

impl WindowsDisplaySource {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySource for WindowsDisplaySource {
    type Error = Error;

    #[instrument("WindowsDisplaySource::displays", skip_all, err)]
    fn displays(&self) -> Result<Vec<Display>, Self::Error> {
        let geometry = monitor_geometry().map_err(Error::Geometry)?;
        let max_luminances = max_luminances().map_err(Error::Luminance)?;
        let color_states = color_states().map_err(Error::DisplayConfig)?;

        debug!("Colour states: {color_states:?}");
        debug!("Maximum luminances: {max_luminances:?}");

        Ok(join_displays(geometry, &color_states, &max_luminances))
    }
}

/// Converts a monitor handle to a display id.
pub(crate) fn display_id(handle: HMONITOR) -> DisplayId {
    DisplayId(handle.0 as isize)
}

/// Converts a display id back to its monitor handle.
pub(crate) fn monitor_handle(id: DisplayId) -> HMONITOR {
    HMONITOR(id.0 as *mut core::ffi::c_void)
}

/// Reads a null terminated wide string.
pub(crate) fn wide_to_string(wide: &[u16]) -> String {
    let length = wide.iter().position(|c| *c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..length])
}
