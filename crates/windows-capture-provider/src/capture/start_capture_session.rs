use std::sync::mpsc::{Receiver, channel};

use hdr_capture::PixelFormat;
use thiserror::Error;
use tracing::{instrument, warn};
use windows::{
    Foundation::TypedEventHandler,
    Graphics::{
        Capture::{
            Direct3D11CaptureFrame, Direct3D11CaptureFramePool, GraphicsCaptureItem,
            GraphicsCaptureSession,
        },
        DirectX::{Direct3D11::IDirect3DDevice, DirectXPixelFormat},
    },
    Win32::UI::WindowsAndMessaging::WM_APP,
};
use windows_core::{HRESULT, IInspectable};
use windows_result::Error as WindowsError;

/// A running capture session, frames are delivered to `receiver`.
pub struct CaptureSession {
    pub framepool: Direct3D11CaptureFramePool,
    pub session: GraphicsCaptureSession,
    pub receiver: Receiver<Direct3D11CaptureFrame>,
}

impl CaptureSession {
    /// Stop the session and release the framepool.
    pub fn close(self) -> Result<(), WindowsError> {
        self.session.Close()?;
        self.framepool.Close()
    }
}

/// The WinRT pixel format frames are delivered in.
pub fn directx_format(format: PixelFormat) -> DirectXPixelFormat {
    match format {
        PixelFormat::Bgra8Unorm => DirectXPixelFormat::B8G8R8A8UIntNormalized,
        PixelFormat::Rgba16Float => DirectXPixelFormat::R16G16B16A16Float,
    }
}

#[instrument(skip_all, err)]
pub fn start_capture_session(
    capture_item: &GraphicsCaptureItem,
    d3d_device: &IDirect3DDevice,
    format: PixelFormat,
    capture_cursor: bool,
) -> Result<CaptureSession, Error> {
    let capture_size = capture_item.Size().map_err(Error::CaptureSize)?;

    let framepool = Direct3D11CaptureFramePool::CreateFreeThreaded(
        d3d_device,
        directx_format(format),
        1,
        capture_size,
    )
    .map_err(Error::Framepool)?;

    let session = framepool
        .CreateCaptureSession(capture_item)
        .map_err(Error::CreateCaptureSession)?;

    session
        .SetIsCursorCaptureEnabled(capture_cursor)
        .map_err(Error::CursorCapture)?;

    // Not available before Windows 11.
    if let Err(e) = session.SetIsBorderRequired(false) {
        warn!("Failed to disable the capture border:\n{e}");
    }

    let (sender, receiver) = channel();

    framepool
        .FrameArrived(
            &TypedEventHandler::<Direct3D11CaptureFramePool, IInspectable>::new({
                move |frame_pool, _| {
                    let frame_pool = frame_pool.as_ref().ok_or(WindowsError::new(
                        HRESULT::from_win32(WM_APP),
                        "Failed to access frame pool, frame_pool is None",
                    ))?;

                    let frame = frame_pool.TryGetNextFrame()?;

                    // Later frames arrive after the receiver has taken the first.
                    let _ = sender.send(frame);
                    Ok(())
                }
            }),
        )
        .map_err(Error::FrameArrived)?;

    session.StartCapture().map_err(Error::StartCapture)?;

    Ok(CaptureSession {
        framepool,
        session,
        receiver,
    })
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to get capture item size:\n{0}")]
    CaptureSize(#[source] WindowsError),

    #[error("Failed to create framepool:\n{0}")]
    Framepool(#[source] WindowsError),

    #[error("Failed to create capture session:\n{0}")]
    CreateCaptureSession(#[source] WindowsError),

    #[error("Failed to set cursor capture:\n{0}")]
    CursorCapture(#[source] WindowsError),

    #[error("Failed to handle frame arrival:\n{0}")]
    FrameArrived(#[source] WindowsError),

    #[error("Failed to start capture session:\n{0}")]
    StartCapture(#[source] WindowsError),
}
