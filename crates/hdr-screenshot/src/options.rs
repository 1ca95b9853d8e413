use std::path::PathBuf;

use hdr_capture::{ConfigError, HdrMode};
use thiserror::Error;

/// Usage printed for `-help`.
pub const USAGE: &str = "\
Usage: hdr-screenshot [options]

Options:
  -dxDebug      Enable debug logging and the D3D11 debug layer
  -forceHDR     Treat every display as HDR
  -clipHDR      Clip HDR highlights instead of compressing them
  -out <path>   Write the screenshot to <path>
  -help         Show this message";

/// Command line options. Flags are matched without case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub dx_debug: bool,
    pub force_hdr: bool,
    pub clip_hdr: bool,
    pub out: Option<PathBuf>,
    pub help: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionsError {
    #[error("Unknown option \"{0}\"")]
    UnknownFlag(String),

    #[error("Option \"{0}\" requires a value")]
    MissingValue(&'static str),

    #[error("Invalid options:\n{0}")]
    Config(#[from] ConfigError),
}

impl Options {
    /// Parse the arguments that follow the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.to_ascii_lowercase().as_str() {
                "-dxdebug" => options.dx_debug = true,
                "-forcehdr" => options.force_hdr = true,
                "-cliphdr" => options.clip_hdr = true,
                "-help" | "-h" | "-?" => options.help = true,
                "-out" => {
                    let path = args.next().ok_or(OptionsError::MissingValue("-out"))?;
                    options.out = Some(PathBuf::from(path));
                }
                _ => return Err(OptionsError::UnknownFlag(arg)),
            }
        }

        // Conflicting HDR flags are rejected here, before anything is allocated.
        options.hdr_mode()?;

        Ok(options)
    }

    /// The HDR mode selected by the flags.
    pub fn hdr_mode(&self) -> Result<HdrMode, ConfigError> {
        HdrMode::from_flags(self.force_hdr, self.clip_hdr)
    }
}
