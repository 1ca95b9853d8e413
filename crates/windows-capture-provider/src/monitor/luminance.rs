use std::collections::HashMap;

use hdr_capture::DisplayId;
use tracing::{debug, instrument};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, DXGI_ERROR_NOT_FOUND, IDXGIFactory1, IDXGIOutput6,
};
use windows_core::Interface;

use crate::{LabelledWinResult, WinError, result::Labelled};

use super::{display_id, wide_to_string};

/// Returns the maximum luminance in nits of every desktop output across all adapters.
#[instrument(skip_all, err)]
pub fn max_luminances() -> LabelledWinResult<HashMap<DisplayId, f32>> {
    let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1() }.labelled("CreateDXGIFactory1")?;
    let mut luminances = HashMap::new();

    for adapter_index in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(adapter_index) } {
            Ok(adapter) => adapter,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(WinError::new(e, "IDXGIFactory1::EnumAdapters1")),
        };

        for output_index in 0.. {
            let output = match unsafe { adapter.EnumOutputs(output_index) } {
                Ok(output) => output,
                Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
                Err(e) => return Err(WinError::new(e, "IDXGIAdapter1::EnumOutputs")),
            };

            let output: IDXGIOutput6 = output.cast().labelled("IDXGIOutput::cast")?;
            let desc = unsafe { output.GetDesc1() }.labelled("IDXGIOutput6::GetDesc1")?;

            if !desc.AttachedToDesktop.as_bool() {
                continue;
            }

            debug!(
                "Output \"{}\" on adapter {adapter_index}: max luminance {}nits",
                wide_to_string(&desc.DeviceName),
                desc.MaxLuminance
            );
            luminances.insert(display_id(desc.Monitor), desc.MaxLuminance);
        }
    }

    Ok(luminances)
}
