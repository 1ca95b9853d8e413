use hdr_capture::{
    DisplayRect,
    display::{DisplayGeometry, EmptyRect},
};
use thiserror::Error;
use tracing::instrument;
use windows::Win32::{
    Foundation::{LPARAM, RECT},
    Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW},
};
use windows_core::BOOL;

use crate::{WinError, result::Labelled};

use super::{display_id, wide_to_string};

/// Why monitor geometry could not be read.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeometryError {
    /// A monitor query failed.
    #[error(transparent)]
    Windows(#[from] WinError),

    /// A monitor reported bounds with no area.
    #[error("Monitor \"{name}\" has invalid bounds:\n{source}")]
    EmptyMonitor {
        /// GDI device name of the monitor.
        name: String,
        #[source]
        source: EmptyRect,
    },
}

/// Returns the bounds and device name of every monitor on the desktop.
#[instrument(skip_all, err)]
pub fn monitor_geometry() -> Result<Vec<DisplayGeometry>, GeometryError> {
    let mut handles: Vec<HMONITOR> = Vec::new();

    unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(enum_monitor),
            LPARAM(&mut handles as *mut Vec<HMONITOR> as isize),
        )
        .ok()
        .labelled("EnumDisplayMonitors")?;
    }

    let mut geometry = Vec::with_capacity(handles.len());
    for handle in handles {
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = size_of::<MONITORINFOEXW>() as u32;

        unsafe { GetMonitorInfoW(handle, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO) }
            .ok()
            .labelled("GetMonitorInfoW")?;

        let name = wide_to_string(&info.szDevice);
        let rect = monitor_rect(&name, info.monitorInfo.rcMonitor)?;

        geometry.push(DisplayGeometry {
            id: display_id(handle),
            name,
            rect,
        });
    }

    Ok(geometry)
}

/// Converts a monitor's bounds, rejecting bounds with no area.
fn monitor_rect(name: &str, bounds: RECT) -> Result<DisplayRect, GeometryError> {
    DisplayRect::new(bounds.left, bounds.top, bounds.right, bounds.bottom).map_err(|source| {
        GeometryError::EmptyMonitor {
            name: name.to_string(),
            source,
        }
    })
}

unsafe extern "system" fn enum_monitor(
    monitor: HMONITOR,
    _: HDC,
    _: *mut RECT,
    state: LPARAM,
) -> BOOL {
    let handles = unsafe { &mut *(state.0 as *mut Vec<HMONITOR>) };
    handles.push(monitor);

    true.into()
}
