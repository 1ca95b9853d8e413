use std::collections::HashMap;

use hdr_capture::{display::ColorState, tonemap::SCENE_REFERRED_SDR_WHITE_NITS};
use tracing::{Level, instrument};
use windows::Win32::{
    Devices::Display::{
        DISPLAYCONFIG_DEVICE_INFO_GET_ADVANCED_COLOR_INFO,
        DISPLAYCONFIG_DEVICE_INFO_GET_SDR_WHITE_LEVEL, DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME,
        DISPLAYCONFIG_DEVICE_INFO_HEADER, DISPLAYCONFIG_GET_ADVANCED_COLOR_INFO,
        DISPLAYCONFIG_MODE_INFO, DISPLAYCONFIG_PATH_INFO, DISPLAYCONFIG_SDR_WHITE_LEVEL,
        DISPLAYCONFIG_SOURCE_DEVICE_NAME, DisplayConfigGetDeviceInfo, GetDisplayConfigBufferSizes,
        QDC_ONLY_ACTIVE_PATHS, QueryDisplayConfig,
    },
    Foundation::{ERROR_INSUFFICIENT_BUFFER, WIN32_ERROR},
};

use crate::{LabelledWinResult, WinError, result::check_win32};

use super::wide_to_string;

const ADVANCED_COLOR_ENABLED: u32 = 1 << 1;
const WIDE_COLOR_ENFORCED: u32 = 1 << 2;

/// Returns the advanced colour state of every active display path, keyed by GDI device name.
#[instrument(skip_all, err)]
pub fn color_states() -> LabelledWinResult<HashMap<String, ColorState>> {
    let paths = active_paths()?;
    let mut states = HashMap::with_capacity(paths.len());

    for path in &paths {
        let name = unsafe { source_name(path)? };
        let is_hdr = unsafe { is_hdr(path)? };

        let sdr_white_nits = if is_hdr {
            unsafe { sdr_white_nits(path)? }
        } else {
            SCENE_REFERRED_SDR_WHITE_NITS
        };

        states.insert(
            name,
            ColorState {
                is_hdr,
                sdr_white_nits,
            },
        );
    }

    Ok(states)
}

/// Query the active paths, retrying if the topology changes between calls.
#[instrument(level = Level::DEBUG, skip_all, err)]
fn active_paths() -> LabelledWinResult<Vec<DISPLAYCONFIG_PATH_INFO>> {
    loop {
        let mut path_elements = 0;
        let mut mode_info_elements = 0;
        check_win32(
            unsafe {
                GetDisplayConfigBufferSizes(
                    QDC_ONLY_ACTIVE_PATHS,
                    &mut path_elements,
                    &mut mode_info_elements,
                )
            },
            "GetDisplayConfigBufferSizes",
        )?;

        let mut paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_elements as usize];
        let mut mode_infos = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_info_elements as usize];
        let result = unsafe {
            QueryDisplayConfig(
                QDC_ONLY_ACTIVE_PATHS,
                &mut path_elements,
                paths.as_mut_ptr(),
                &mut mode_info_elements,
                mode_infos.as_mut_ptr(),
                None,
            )
        };

        if result == ERROR_INSUFFICIENT_BUFFER {
            continue;
        }
        check_win32(result, "QueryDisplayConfig")?;

        paths.truncate(path_elements as usize);
        return Ok(paths);
    }
}

/// Fills the header of a device info request and sends it.
unsafe fn get_device_info(
    header: &mut DISPLAYCONFIG_DEVICE_INFO_HEADER,
    call: &'static str,
) -> LabelledWinResult<()> {
    let result = unsafe { DisplayConfigGetDeviceInfo(header) };
    if result != 0 {
        return Err(WinError::from_win32(WIN32_ERROR(result as u32), call));
    }

    Ok(())
}

/// The GDI device name of the path's source, matches `MONITORINFOEXW::szDevice`.
unsafe fn source_name(path: &DISPLAYCONFIG_PATH_INFO) -> LabelledWinResult<String> {
    let mut request = DISPLAYCONFIG_SOURCE_DEVICE_NAME::default();
    request.header.adapterId = path.sourceInfo.adapterId;
    request.header.id = path.sourceInfo.id;
    request.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME;
    request.header.size = size_of::<DISPLAYCONFIG_SOURCE_DEVICE_NAME>() as u32;

    unsafe { get_device_info(&mut request.header, "DisplayConfigGetDeviceInfo(SourceName)")? };

    Ok(wide_to_string(&request.viewGdiDeviceName))
}

/// HDR is advanced colour that is enabled without wide colour being enforced.
unsafe fn is_hdr(path: &DISPLAYCONFIG_PATH_INFO) -> LabelledWinResult<bool> {
    let mut request = DISPLAYCONFIG_GET_ADVANCED_COLOR_INFO::default();
    request.header.adapterId = path.targetInfo.adapterId;
    request.header.id = path.targetInfo.id;
    request.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_ADVANCED_COLOR_INFO;
    request.header.size = size_of::<DISPLAYCONFIG_GET_ADVANCED_COLOR_INFO>() as u32;

    unsafe {
        get_device_info(
            &mut request.header,
            "DisplayConfigGetDeviceInfo(AdvancedColorInfo)",
        )?
    };

    let flags = unsafe { request.Anonymous.value };
    Ok(flags & ADVANCED_COLOR_ENABLED != 0 && flags & WIDE_COLOR_ENFORCED == 0)
}

/// The SDR white level in nits, reported as a multiplier of 80 nits in thousandths.
unsafe fn sdr_white_nits(path: &DISPLAYCONFIG_PATH_INFO) -> LabelledWinResult<f32> {
    let mut request = DISPLAYCONFIG_SDR_WHITE_LEVEL::default();
    request.header.adapterId = path.targetInfo.adapterId;
    request.header.id = path.targetInfo.id;
    request.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_SDR_WHITE_LEVEL;
    request.header.size = size_of::<DISPLAYCONFIG_SDR_WHITE_LEVEL>() as u32;

    unsafe {
        get_device_info(
            &mut request.header,
            "DisplayConfigGetDeviceInfo(SdrWhiteLevel)",
        )?
    };

    Ok(request.SDRWhiteLevel as f32 / 1000.0 * SCENE_REFERRED_SDR_WHITE_NITS)
}
