use tracing::{error, info, instrument, warn};
use windows::{
    Graphics::DirectX::Direct3D11::IDirect3DDevice,
    Win32::{
        Foundation::{E_POINTER, HMODULE},
        Graphics::{
            Direct3D::{D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_WARP},
            Direct3D11::{
                D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_CREATE_DEVICE_DEBUG,
                D3D11_CREATE_DEVICE_FLAG, D3D11_SDK_VERSION, D3D11CreateDevice, ID3D11Device,
                ID3D11DeviceContext, ID3D11Multithread,
            },
            Dxgi::{DXGI_ERROR_SDK_COMPONENT_MISSING, DXGI_ERROR_UNSUPPORTED, IDXGIDevice},
        },
        System::WinRT::Direct3D11::CreateDirect3D11DeviceFromDXGIDevice,
    },
};
use windows_core::{Interface, Result as WindowsResult};

use crate::{LabelledWinResult, WinError, result::Labelled};

/// The directX devices used to capture and read back frames.
pub struct DirectX {
    /// Used to create framepools.
    pub d3d_device: IDirect3DDevice,

    /// Used to create staging textures.
    pub d3d11_device: ID3D11Device,

    /// Used to copy captures to the CPU. Calls must be made under the device lock.
    pub d3d11_context: ID3D11DeviceContext,
}

// SAFETY: ID3D11Device and IDirect3DDevice are free threaded. The immediate context is
// multithread protected and every use is serialised by the run's device lock.
unsafe impl Send for DirectX {}
unsafe impl Sync for DirectX {}

impl DirectX {
    /// Creates a new set of directX devices, `debug` enables the D3D11 debug layer.
    #[instrument("DirectX::new", skip_all, err)]
    pub fn new(debug: bool) -> LabelledWinResult<Self> {
        let d3d11_device = if debug {
            match create_d3d11_device(D3D11_CREATE_DEVICE_BGRA_SUPPORT | D3D11_CREATE_DEVICE_DEBUG)
            {
                Ok(device) => {
                    info!("Created D3D11 device with the debug layer");
                    device
                }
                Err(e) if e.code() == DXGI_ERROR_SDK_COMPONENT_MISSING => {
                    warn!("D3D11 debug layer is not installed, continuing without it");
                    create_d3d11_device(D3D11_CREATE_DEVICE_BGRA_SUPPORT)?
                }
                Err(e) => return Err(e),
            }
        } else {
            create_d3d11_device(D3D11_CREATE_DEVICE_BGRA_SUPPORT)?
        };

        // Get the d3d11 context.
        let d3d11_context =
            unsafe { d3d11_device.GetImmediateContext() }.labelled("ID3D11Device::GetImmediateContext")?;

        // Readback happens from several capture threads.
        {
            let multithread: ID3D11Multithread = d3d11_context
                .cast()
                .labelled("ID3D11DeviceContext::cast")?;
            let _ = unsafe { multithread.SetMultithreadProtected(true) };
        }

        // Cast to the dxgi device.
        let dxgi_device: IDXGIDevice = d3d11_device.cast().labelled("ID3D11Device::cast")?;

        // Get the d3d device.
        let d3d_device = {
            let inspectable = unsafe { CreateDirect3D11DeviceFromDXGIDevice(&dxgi_device) }
                .labelled("CreateDirect3D11DeviceFromDXGIDevice")?;

            inspectable.cast().labelled("IInspectable::cast")?
        };

        Ok(Self {
            d3d_device,
            d3d11_device,
            d3d11_context,
        })
    }

    /// Release transient state after a capture.
    pub fn trim(&self) -> LabelledWinResult<()> {
        unsafe { self.d3d11_context.ClearState() };
        self.d3d_device.Trim().labelled("IDirect3DDevice::Trim")
    }
}

impl Drop for DirectX {
    fn drop(&mut self) {
        if let Err(e) = self.d3d_device.Close() {
            error!("Failed to close D3D device:\n{e}");
        }
    }
}

/// Create a hardware device, falling back to WARP if hardware is unsupported.
fn create_d3d11_device(flags: D3D11_CREATE_DEVICE_FLAG) -> LabelledWinResult<ID3D11Device> {
    let mut device = None;
    let mut result = d3d11_device_with_type(D3D_DRIVER_TYPE_HARDWARE, flags, &mut device);

    if let Err(error) = &result {
        if error.code() == DXGI_ERROR_UNSUPPORTED {
            warn!("Hardware D3D11 device is unsupported, falling back to WARP");
            result = d3d11_device_with_type(D3D_DRIVER_TYPE_WARP, flags, &mut device);
        }
    }
    result.labelled("D3D11CreateDevice")?;

    device.ok_or(WinError::from_hresult(E_POINTER, "D3D11CreateDevice"))
}

fn d3d11_device_with_type(
    driver_type: D3D_DRIVER_TYPE,
    flags: D3D11_CREATE_DEVICE_FLAG,
    device: *mut Option<ID3D11Device>,
) -> WindowsResult<()> {
    unsafe {
        D3D11CreateDevice(
            None,
            driver_type,
            HMODULE::default(),
            flags,
            None,
            D3D11_SDK_VERSION,
            Some(device),
            None,
            None,
        )
    }
}
