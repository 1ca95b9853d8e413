//! # HDR Screenshot
//! Captures every display, tonemaps HDR displays to SDR and writes one PNG of the desktop.
//!

use std::{env, process::ExitCode};

use hdr_capture::{PersistenceSink, RunConfig, Screenshot};
use hdr_screenshot::{
    VERSION,
    config::{CONFIG_FILE, Config},
    logger::setup_logger,
    options::{Options, USAGE},
    save::PngSink,
};
use mimalloc::MiMalloc;
use thiserror::Error;
use tracing::{error, info, info_span, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if options.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    // Set up logger
    let _logger_guards = match setup_logger(options.dx_debug) {
        Ok(guards) => Some(guards),
        Err(e) => {
            eprintln!("Logging is disabled:\n{e}");
            None
        }
    };

    let _span = info_span!("[Main Thread]").entered();
    info!("HDR Screenshot v{}", VERSION);

    // Load config
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Your config file \"{CONFIG_FILE}\" is invalid:\n{e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let run_config = match options.hdr_mode() {
        Ok(hdr_mode) => RunConfig {
            hdr_mode,
            failure_policy: config.failure_policy,
        },
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // Every GPU resource is released when this returns.
    let screenshot = match take_screenshot(&options, &config, run_config) {
        Ok(screenshot) => screenshot,
        Err(e) => {
            error!("Failed to take the screenshot:\n{e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let report = &screenshot.report;
    info!(
        "Captured {} displays in {:.2?}, tonemapped {:?}",
        report.displays.len(),
        report.duration,
        report.tonemapped
    );
    if !report.filled.is_empty() {
        warn!("Left as background: {:?}", report.filled);
    }

    let output = options.out.unwrap_or(config.output_path);
    if let Err(e) = PngSink::new(output).persist(&screenshot.canvas) {
        error!("Failed to save the screenshot:\n{e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    ExitCode::SUCCESS
}

#[derive(Debug, Error)]
#[non_exhaustive]
enum Error {
    #[cfg(windows)]
    #[error("Failed to initialise the Windows runtime:\n{0}")]
    RoInitialize(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to create the capture provider:\n{0}")]
    CaptureProvider(#[source] windows_capture_provider::WinError),

    #[error("Failed to run the screenshot:\n{0}")]
    Run(#[from] hdr_capture::RunError),

    #[cfg(not(windows))]
    #[error("Screen capture is only supported on Windows")]
    UnsupportedPlatform,
}

#[cfg(windows)]
fn take_screenshot(
    options: &Options,
    config: &Config,
    run_config: RunConfig,
) -> Result<Screenshot, Error> {
    use hdr_capture::{DeviceLock, Screenshotter};
    use scrgb_tonemapper::ScrgbTonemapper;
    use windows::Win32::{
        System::WinRT::{RO_INIT_MULTITHREADED, RoInitialize},
        UI::HiDpi::{DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext},
    };
    use windows_capture_provider::{WindowsCaptureProvider, WindowsDisplaySource};

    unsafe { RoInitialize(RO_INIT_MULTITHREADED) }.map_err(Error::RoInitialize)?;

    // Display rectangles must be physical pixels.
    if let Err(e) =
        unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) }
    {
        warn!("Failed to set per monitor DPI awareness:\n{e}");
    }

    let device_lock = DeviceLock::new();
    let provider = WindowsCaptureProvider::new(
        options.dx_debug,
        device_lock.clone(),
        config.capture_timeout(),
        config.capture_cursor,
    )
    .map_err(Error::CaptureProvider)?;

    let tonemapper = ScrgbTonemapper::new(run_config.hdr_mode.policy())
        .with_input_color_space(config.input_color_space);

    let screenshot = Screenshotter::new(run_config, device_lock).take(
        &WindowsDisplaySource::new(),
        &provider,
        &tonemapper,
    )?;

    Ok(screenshot)
}

#[cfg(not(windows))]
fn take_screenshot(
    _options: &Options,
    _config: &Config,
    _run_config: RunConfig,
) -> Result<Screenshot, Error> {
    Err(Error::UnsupportedPlatform)
}
