use thiserror::Error;

use crate::CapturedFrame;

/// Luminance of scRGB `1.0`, the scene-referred SDR white level, in nits.
pub const SCENE_REFERRED_SDR_WHITE_NITS: f32 = 80.0;

/// Peak luminance of the reference SDR display (BT.2408), in nits. Used as the source peak for
/// displays forced through the HDR pipeline without reporting HDR metadata.
pub const REFERENCE_SDR_DISPLAY_PEAK_NITS: f32 = 203.0;

/// Per-display parameters for converting a HDR frame to SDR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapParams {
    /// The display's SDR white level, in nits.
    pub sdr_white_nits: f32,

    /// The display's peak luminance, in nits.
    pub max_luminance_nits: f32,
}

/// A luminance parameter that cannot be used for tonemapping.
#[derive(Debug, Error, PartialEq)]
#[error("{parameter} must be a finite value greater than 0, got {value}")]
pub struct InvalidToneMapParams {
    /// The name of the invalid parameter.
    pub parameter: &'static str,

    /// The invalid value.
    pub value: f32,
}

impl ToneMapParams {
    /// Checks both luminances are finite and non-zero.
    pub fn validate(&self) -> Result<(), InvalidToneMapParams> {
        let checks = [
            ("sdr_white_nits", self.sdr_white_nits),
            ("max_luminance_nits", self.max_luminance_nits),
        ];

        for (parameter, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(InvalidToneMapParams { parameter, value });
            }
        }

        Ok(())
    }
}

/// How luminance above the output peak is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapPolicy {
    /// Compress highlights with a perceptual roll-off.
    #[default]
    Perceptual,

    /// Hard clip each channel at the output peak.
    Clip,
}

/// Converts a HDR frame into an SDR frame.
///
/// Implementations are constructed once per run and hold no per-frame state, so a single
/// instance is shared by every display's capture thread.
pub trait Tonemapper: Sync {
    /// The error returned when a frame cannot be converted.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Returns a new `Bgra8Unorm` frame of the same size. SDR input is returned unchanged.
    fn process(
        &self,
        frame: &CapturedFrame,
        params: ToneMapParams,
    ) -> Result<CapturedFrame, Self::Error>;
}
