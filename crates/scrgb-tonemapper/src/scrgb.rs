use hdr_capture::tonemap::SCENE_REFERRED_SDR_WHITE_NITS;

/// A value in the scRGB color space, `1.0` is 80 nits.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct ScRgb(pub f32);

impl ScRgb {
    pub fn from_nits(nits: f32) -> Self {
        Self(nits / SCENE_REFERRED_SDR_WHITE_NITS)
    }

    pub fn as_nits(self) -> f32 {
        self.0 * SCENE_REFERRED_SDR_WHITE_NITS
    }
}

impl core::fmt::Display for ScRgb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({}nits)", self.0, self.as_nits().round())
    }
}
