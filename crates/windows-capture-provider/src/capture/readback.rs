use hdr_capture::{CapturedFrame, FrameError, PixelFormat};
use thiserror::Error;
use tracing::instrument;
use windows::{
    Graphics::Capture::Direct3D11CaptureFrame,
    Win32::{
        Graphics::Direct3D11::{
            D3D11_CPU_ACCESS_READ, D3D11_MAP_READ, D3D11_MAPPED_SUBRESOURCE,
            D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING, ID3D11Texture2D,
        },
        System::WinRT::Direct3D11::IDirect3DDxgiInterfaceAccess,
    },
};
use windows_core::Interface;

use crate::{DirectX, WinError, result::Labelled};

/// Copies a frame into a staging texture and reads it into CPU memory.
///
/// # Safety
/// Uses the immediate context, the caller must hold the device lock.
#[instrument(skip_all, err)]
pub unsafe fn read_frame(
    directx: &DirectX,
    frame: &Direct3D11CaptureFrame,
    format: PixelFormat,
) -> Result<CapturedFrame, Error> {
    let source_texture: ID3D11Texture2D = {
        let surface = frame.Surface().labelled("Direct3D11CaptureFrame::Surface")?;
        let access: IDirect3DDxgiInterfaceAccess = surface
            .cast()
            .labelled("IDirect3DSurface::cast")?;
        unsafe { access.GetInterface() }.labelled("IDirect3DDxgiInterfaceAccess::GetInterface")?
    };

    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { source_texture.GetDesc(&mut desc) };

    desc.BindFlags = 0;
    desc.MiscFlags = 0;
    desc.Usage = D3D11_USAGE_STAGING;
    desc.CPUAccessFlags = D3D11_CPU_ACCESS_READ.0 as u32;

    let staging = {
        let mut staging = None;
        unsafe {
            directx
                .d3d11_device
                .CreateTexture2D(&desc, None, Some(&mut staging))
        }
        .labelled("ID3D11Device::CreateTexture2D")?;
        staging.ok_or(Error::NoStagingTexture)?
    };

    unsafe { directx.d3d11_context.CopyResource(&staging, &source_texture) };

    let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
    unsafe {
        directx
            .d3d11_context
            .Map(&staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped))
    }
    .labelled("ID3D11DeviceContext::Map")?;

    let row_length = desc.Width as usize * format.bytes_per_pixel();
    let mut data = vec![0u8; row_length * desc.Height as usize];

    // The mapped rows are padded to RowPitch.
    for (row_index, row) in data.chunks_exact_mut(row_length).enumerate() {
        let source = unsafe {
            core::slice::from_raw_parts(
                (mapped.pData as *const u8).add(row_index * mapped.RowPitch as usize),
                row_length,
            )
        };
        row.copy_from_slice(source);
    }

    unsafe { directx.d3d11_context.Unmap(&staging, 0) };

    Ok(CapturedFrame::new(format, desc.Width, desc.Height, data)?)
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to read the frame:\n{0}")]
    Windows(#[from] WinError),

    #[error("The staging texture was not created")]
    NoStagingTexture,

    #[error("The frame read back was invalid:\n{0}")]
    Frame(#[from] FrameError),
}
