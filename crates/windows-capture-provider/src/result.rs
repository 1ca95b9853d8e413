use core::fmt::Display;

use thiserror::Error;
use windows::Win32::Foundation::WIN32_ERROR;
use windows_core::HRESULT;

/// A shortcut for `Result<T, WinError>`.
pub type LabelledWinResult<T> = Result<T, WinError>;

/// A Windows error labelled with the call that returned it.
#[derive(Debug, Error)]
pub struct WinError {
    call: &'static str,
    #[source]
    source: WinErrorSource,
}

/// Possible sources for a WinError.
#[derive(Debug, Error)]
pub enum WinErrorSource {
    /// A [windows_result::Error].
    #[error(transparent)]
    WindowsError(#[from] windows_result::Error),

    /// An [HRESULT].
    #[error("HRESULT: {0}")]
    HResult(HRESULT),

    /// A [WIN32_ERROR].
    #[error("Win32: {0:?}")]
    Win32(WIN32_ERROR),
}

impl WinError {
    /// Create a WinError from a `windows_result::Error` and a label.
    pub fn new(source: windows_result::Error, call: &'static str) -> Self {
        Self {
            call,
            source: source.into(),
        }
    }

    /// Create a new WinError from a `WIN32_ERROR` and a label.
    pub fn from_win32(source: WIN32_ERROR, call: &'static str) -> Self {
        Self {
            call,
            source: WinErrorSource::Win32(source),
        }
    }

    /// Create a new WinError from an `HRESULT` and a label.
    pub fn from_hresult(source: HRESULT, call: &'static str) -> Self {
        Self {
            call,
            source: WinErrorSource::HResult(source),
        }
    }

    /// The label of the call that failed.
    pub fn call(&self) -> &'static str {
        self.call
    }

    /// The HRESULT of the failure.
    pub fn code(&self) -> HRESULT {
        match &self.source {
            WinErrorSource::WindowsError(error) => error.code(),
            WinErrorSource::HResult(hresult) => *hresult,
            WinErrorSource::Win32(error) => error.to_hresult(),
        }
    }
}

impl Display for WinError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Windows {} call failed:\n{}", self.call, self.source)
    }
}

/// Label the error of a Windows call.
pub trait Labelled<T> {
    /// Map the error into a [WinError] for `call`.
    fn labelled(self, call: &'static str) -> LabelledWinResult<T>;
}

impl<T> Labelled<T> for windows_result::Result<T> {
    fn labelled(self, call: &'static str) -> LabelledWinResult<T> {
        self.map_err(|e| WinError::new(e, call))
    }
}

/// Returns an error if a `WIN32_ERROR` status is not success.
pub fn check_win32(status: WIN32_ERROR, call: &'static str) -> LabelledWinResult<()> {
    if status.is_err() {
        return Err(WinError::from_win32(status, call));
    }

    Ok(())
}
