use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use hdr_capture::FailurePolicy;
use scrgb_tonemapper::InputColorSpace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the optional config file in the working directory.
pub const CONFIG_FILE: &str = "hdr-screenshot.toml";

/// User configuration, every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the screenshot is written unless `-out` is given.
    pub output_path: PathBuf,

    /// How long to wait for a display's first frame.
    pub capture_timeout_secs: f32,

    /// Whether the cursor is drawn into captures.
    pub capture_cursor: bool,

    /// What happens to the run when a display fails.
    pub failure_policy: FailurePolicy,

    /// How float captures are interpreted.
    pub input_color_space: InputColorSpace,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("Failed to read config file:\n{0}")]
    ReadFile(#[source] io::Error),

    #[error("Failed to deserialize config:\n{0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("Capture timeout must be a positive number of seconds, found {0}")]
    Timeout(f32),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaveError {
    #[error("Failed to serialize config:\n{0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write file:\n{0}")]
    Write(#[from] io::Error),
}

impl Config {
    /// Load the config file from the working directory.
    pub fn load() -> Result<Self, LoadError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load a config file, a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(LoadError::ReadFile(e)),
        };

        Self::from_toml(&contents)
    }

    /// Parse and validate a config.
    pub fn from_toml(contents: &str) -> Result<Self, LoadError> {
        let config: Self = toml::from_str(contents)?;

        if !config.capture_timeout_secs.is_finite() || config.capture_timeout_secs <= 0.0 {
            return Err(LoadError::Timeout(config.capture_timeout_secs));
        }

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SaveError> {
        let toml_string = toml::to_string_pretty(self)?;

        fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.capture_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("screenshot.png"),
            capture_timeout_secs: 5.0,
            capture_cursor: false,
            failure_policy: FailurePolicy::default(),
            input_color_space: InputColorSpace::default(),
        }
    }
}
