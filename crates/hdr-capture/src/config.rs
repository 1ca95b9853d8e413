use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Display, ToneMapParams, ToneMapPolicy,
    tonemap::{REFERENCE_SDR_DISPLAY_PEAK_NITS, SCENE_REFERRED_SDR_WHITE_NITS},
};

/// Which displays go through the HDR pipeline, and with which policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HdrMode {
    /// Displays in HDR mode are tonemapped perceptually.
    #[default]
    Native,

    /// Every display is captured in HDR and tonemapped.
    Force,

    /// Displays in HDR mode are tonemapped by clipping.
    Clip,
}

/// An invalid combination of run options.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Force and clip were both requested.
    #[error("Forcing HDR and clipping HDR cannot be used together")]
    ConflictingHdrFlags,
}

impl HdrMode {
    /// Build the mode from the force and clip flags. Both flags together is an error.
    pub fn from_flags(force_hdr: bool, clip_hdr: bool) -> Result<Self, ConfigError> {
        match (force_hdr, clip_hdr) {
            (true, true) => Err(ConfigError::ConflictingHdrFlags),
            (true, false) => Ok(Self::Force),
            (false, true) => Ok(Self::Clip),
            (false, false) => Ok(Self::Native),
        }
    }

    /// The tonemap policy for this mode.
    pub fn policy(self) -> ToneMapPolicy {
        match self {
            Self::Clip => ToneMapPolicy::Clip,
            Self::Native | Self::Force => ToneMapPolicy::Perceptual,
        }
    }

    /// The tonemap parameters for a display, `None` if the display is not tonemapped.
    ///
    /// Forced displays without HDR metadata use the scene-referred SDR white and the reference
    /// SDR display peak.
    pub fn tonemap_params(self, display: &Display) -> Option<ToneMapParams> {
        match (self, display.hdr) {
            (_, Some(hdr)) => Some(ToneMapParams {
                sdr_white_nits: hdr.sdr_white_nits,
                max_luminance_nits: hdr.max_luminance_nits,
            }),

            (Self::Force, None) => Some(ToneMapParams {
                sdr_white_nits: SCENE_REFERRED_SDR_WHITE_NITS,
                max_luminance_nits: REFERENCE_SDR_DISPLAY_PEAK_NITS,
            }),

            (Self::Native | Self::Clip, None) => None,
        }
    }
}

/// What happens to the run when a single display fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// The whole run fails.
    #[default]
    Abort,

    /// The display's region is left black and the run continues.
    FillBackground,
}

/// Run level configuration, built once and passed to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunConfig {
    /// HDR handling for the run.
    pub hdr_mode: HdrMode,

    /// Handling of per-display failures.
    pub failure_policy: FailurePolicy,
}
