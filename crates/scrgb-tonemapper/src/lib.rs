//! # scRGB Tonemapper
//! CPU colour pipeline that converts HDR captures to SDR.
//!
//! Each pixel goes through input colour management into absolute luminance, a tonemap from the
//! display's peak to the SDR target, a white level adjustment, and sRGB output encoding.
//!

pub mod color;
pub mod eetf;
pub mod scrgb;

use bytemuck::pod_read_unaligned;
use half::f16;
use hdr_capture::{
    CapturedFrame, FrameError, InvalidToneMapParams, PixelFormat, ToneMapParams, ToneMapPolicy,
    Tonemapper,
};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use color::{BT2020_TO_BT709, pq_eotf, quantise, srgb_encode, transform};
use eetf::Bt2390;
use scrgb::ScRgb;

/// Fraction of SDR white reserved above paper white for tonemapped highlights.
pub const HEADROOM: f32 = 0.1;

/// Largest finite half float as scRGB, in nits.
const MAX_INPUT_NITS: f32 = 65_504.0 * 80.0;

/// How the samples of a `Rgba16Float` frame are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputColorSpace {
    /// Linear BT.709 primaries, `1.0` is 80 nits, values may exceed `[0, 1]`.
    #[default]
    ScRgbLinear,

    /// BT.2020 primaries with the ST 2084 PQ transfer function.
    Bt2100Pq,
}

/// Tonemaps `Rgba16Float` scRGB captures into `Bgra8Unorm` sRGB frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrgbTonemapper {
    policy: ToneMapPolicy,
    input: InputColorSpace,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid tonemap parameters:\n{0}")]
    InvalidParameters(#[from] InvalidToneMapParams),

    #[error("Failed to create the output frame:\n{0}")]
    Output(#[from] FrameError),
}

impl ScrgbTonemapper {
    /// Create a tonemapper for a run, reading input as scRGB.
    pub fn new(policy: ToneMapPolicy) -> Self {
        Self {
            policy,
            input: InputColorSpace::default(),
        }
    }

    /// Declare how input samples should be interpreted.
    pub fn with_input_color_space(mut self, input: InputColorSpace) -> Self {
        self.input = input;
        self
    }

    pub fn policy(&self) -> ToneMapPolicy {
        self.policy
    }

    pub fn input_color_space(&self) -> InputColorSpace {
        self.input
    }
}

impl Tonemapper for ScrgbTonemapper {
    type Error = Error;

    #[instrument("ScrgbTonemapper::process", skip_all, err)]
    fn process(
        &self,
        frame: &CapturedFrame,
        params: ToneMapParams,
    ) -> Result<CapturedFrame, Self::Error> {
        params.validate()?;

        if frame.format() == PixelFormat::Bgra8Unorm {
            return Ok(frame.clone());
        }

        let pipeline = PixelPipeline::new(self.policy, self.input, params);
        debug!("{pipeline:?}");

        let mut output =
            vec![0u8; CapturedFrame::byte_length(PixelFormat::Bgra8Unorm, frame.width(), frame.height())];

        let input_pitch = frame.row_pitch();
        let output_pitch = frame.width() as usize * PixelFormat::Bgra8Unorm.bytes_per_pixel();

        output
            .par_chunks_exact_mut(output_pitch)
            .enumerate()
            .for_each(|(row, output_row)| {
                let input_row = &frame.data()[row * input_pitch..(row + 1) * input_pitch];

                for (input, output) in input_row.chunks_exact(8).zip(output_row.chunks_exact_mut(4)) {
                    let rgba: [f16; 4] = pod_read_unaligned(input);
                    output.copy_from_slice(&pipeline.apply(rgba.map(f16::to_f32)));
                }
            });

        Ok(CapturedFrame::new(
            PixelFormat::Bgra8Unorm,
            frame.width(),
            frame.height(),
            output,
        )?)
    }
}

/// Per-frame constants of the colour pipeline.
#[derive(Debug, Clone, Copy)]
struct PixelPipeline {
    input: InputColorSpace,
    policy: ToneMapPolicy,
    eetf: Bt2390,
    target_peak_nits: f32,
    /// Maps absolute nits to output relative luminance, target peak lands on `1.0`.
    output_scale: f32,
}

impl PixelPipeline {
    fn new(policy: ToneMapPolicy, input: InputColorSpace, params: ToneMapParams) -> Self {
        let target_peak_nits = params.sdr_white_nits * (1.0 + HEADROOM);

        // White level adjustment: the display's SDR white becomes scene-referred white, then
        // headroom is reserved above it.
        let white_scale = ScRgb::from_nits(params.sdr_white_nits).0.recip();
        let output_scale = ScRgb::from_nits(1.0).0 * white_scale / (1.0 + HEADROOM);

        Self {
            input,
            policy,
            eetf: Bt2390::new(params.max_luminance_nits, target_peak_nits)
                .with_paper_white(params.sdr_white_nits),
            target_peak_nits,
            output_scale,
        }
    }

    /// Converts a single input sample to a BGRA8 pixel.
    fn apply(&self, [r, g, b, a]: [f32; 4]) -> [u8; 4] {
        let nits = self.to_nits([r, g, b]);
        let mapped = self.tonemap(nits);

        let [r, g, b] = mapped.map(|nits| quantise(srgb_encode(nits * self.output_scale)));
        [b, g, r, quantise(a)]
    }

    /// Input colour management into linear BT.709 nits.
    fn to_nits(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self.input {
            InputColorSpace::ScRgbLinear => rgb.map(|value| ScRgb(value).as_nits()),
            InputColorSpace::Bt2100Pq => transform(&BT2020_TO_BT709, rgb.map(pq_eotf)),
        }
    }

    fn tonemap(&self, rgb: [f32; 3]) -> [f32; 3] {
        let rgb = rgb.map(|channel| {
            if channel.is_nan() {
                0.0
            } else {
                channel.clamp(0.0, MAX_INPUT_NITS)
            }
        });

        match self.policy {
            ToneMapPolicy::Clip => rgb.map(|channel| channel.min(self.target_peak_nits)),

            ToneMapPolicy::Perceptual => {
                let peak = rgb[0].max(rgb[1]).max(rgb[2]);
                if peak <= 0.0 {
                    return rgb;
                }

                let ratio = self.eetf.apply(peak) / peak;
                rgb.map(|channel| channel * ratio)
            }
        }
    }
}
