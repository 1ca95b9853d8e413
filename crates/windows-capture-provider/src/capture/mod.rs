mod readback;
mod start_capture_session;

use std::{sync::mpsc::RecvTimeoutError, time::Duration};

use hdr_capture::{CaptureProvider, CapturedFrame, DeviceLock, Display, PixelFormat};
use thiserror::Error;
use tracing::{error, info_span, instrument};
use windows::{
    Graphics::Capture::GraphicsCaptureItem,
    Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop,
};
use windows_core::factory;
use windows_result::Error as WindowsError;

use crate::{DirectX, LabelledWinResult, monitor::monitor_handle};
use start_capture_session::start_capture_session;

/// Captures displays through Windows.Graphics.Capture.
pub struct WindowsCaptureProvider {
    directx: DirectX,
    device_lock: DeviceLock,
    timeout: Duration,
    capture_cursor: bool,
}

impl WindowsCaptureProvider {
    /// Create a provider, `debug` enables the D3D11 debug layer. Readback is serialised by
    /// `device_lock`.
    pub fn new(
        debug: bool,
        device_lock: DeviceLock,
        timeout: Duration,
        capture_cursor: bool,
    ) -> LabelledWinResult<Self> {
        let directx = DirectX::new(debug)?;

        Ok(Self {
            directx,
            device_lock,
            timeout,
            capture_cursor,
        })
    }
}

impl CaptureProvider for WindowsCaptureProvider {
    type Error = Error;

    #[instrument("WindowsCaptureProvider::capture", skip_all, fields(display = %target.name), err)]
    fn capture(&self, target: &Display, format: PixelFormat) -> Result<CapturedFrame, Error> {
        let capture_item: GraphicsCaptureItem = {
            let interop = factory::<GraphicsCaptureItem, IGraphicsCaptureItemInterop>()
                .map_err(Error::CaptureItem)?;
            unsafe { interop.CreateForMonitor(monitor_handle(target.id)) }
                .map_err(Error::CaptureItem)?
        };

        let session = start_capture_session(
            &capture_item,
            &self.directx.d3d_device,
            format,
            self.capture_cursor,
        )?;

        let received = {
            let _span = info_span!("recv").entered();
            session.receiver.recv_timeout(self.timeout)
        };

        // The session is closed whether or not a frame arrived.
        if let Err(e) = session.close() {
            error!("Failed to close the capture session:\n{e}");
        }

        let frame = match received {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => return Err(Error::Disconnected),
        };

        let captured = {
            let _guard = self.device_lock.lock();
            let captured = unsafe { readback::read_frame(&self.directx, &frame, format) };
            if let Err(e) = self.directx.trim() {
                error!("Failed to trim the D3D device:\n{e}");
            }
            captured?
        };

        frame.Close().map_err(Error::CloseFrame)?;

        Ok(captured)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to create the capture item:\n{0}")]
    CaptureItem(#[source] WindowsError),

    #[error("Failed to start capture session:\n{0}")]
    StartCaptureSession(#[from] start_capture_session::Error),

    #[error("No frame arrived within {0:?}")]
    Timeout(Duration),

    #[error("The capture session ended before a frame arrived")]
    Disconnected,

    #[error("Failed to read back the frame:\n{0}")]
    Readback(#[from] readback::Error),

    #[error("Failed to close the frame:\n{0}")]
    CloseFrame(#[source] WindowsError),
}
