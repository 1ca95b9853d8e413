//! Transfer functions and primaries conversions.

/// Luminance of PQ code value `1.0`, in nits.
pub const PQ_MAX_NITS: f32 = 10_000.0;

const PQ_M1: f32 = 2610.0 / 16384.0;
const PQ_M2: f32 = 2523.0 / 4096.0 * 128.0;
const PQ_C1: f32 = 3424.0 / 4096.0;
const PQ_C2: f32 = 2413.0 / 4096.0 * 32.0;
const PQ_C3: f32 = 2392.0 / 4096.0 * 32.0;

/// Linear BT.2020 to linear BT.709, rows are output channels.
pub const BT2020_TO_BT709: [[f32; 3]; 3] = [
    [1.660_491, -0.587_641, -0.072_850],
    [-0.124_550, 1.132_900, -0.008_349],
    [-0.018_151, -0.100_579, 1.118_730],
];

/// SMPTE ST 2084 EOTF, PQ code value to nits.
pub fn pq_eotf(code: f32) -> f32 {
    let e = code.clamp(0.0, 1.0).powf(1.0 / PQ_M2);
    let numerator = (e - PQ_C1).max(0.0);
    let denominator = PQ_C2 - PQ_C3 * e;

    PQ_MAX_NITS * (numerator / denominator).powf(1.0 / PQ_M1)
}

/// Inverse of [`pq_eotf`], nits to PQ code value.
pub fn pq_inverse_eotf(nits: f32) -> f32 {
    let y = (nits / PQ_MAX_NITS).clamp(0.0, 1.0).powf(PQ_M1);

    ((PQ_C1 + PQ_C2 * y) / (1.0 + PQ_C3 * y)).powf(PQ_M2)
}

/// sRGB transfer function, linear `[0, 1]` to encoded `[0, 1]`.
pub fn srgb_encode(linear: f32) -> f32 {
    let linear = linear.clamp(0.0, 1.0);

    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// Multiply an RGB triple by a 3x3 matrix.
pub fn transform(matrix: &[[f32; 3]; 3], rgb: [f32; 3]) -> [f32; 3] {
    matrix.map(|row| row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2])
}

/// Quantise a `[0, 1]` value to 8 bits, rounding to nearest.
pub fn quantise(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pq_reference_points() {
        assert!(pq_eotf(0.0) < 1e-3);
        assert!((pq_eotf(1.0) - PQ_MAX_NITS).abs() < 1.0);

        // 100 nits sits at roughly half of the PQ code range.
        let code = pq_inverse_eotf(100.0);
        assert!((code - 0.508).abs() < 0.002, "{code}");
        assert!((pq_eotf(code) - 100.0).abs() < 0.1);
    }

    #[test]
    fn srgb_endpoints() {
        assert_eq!(quantise(srgb_encode(0.0)), 0);
        assert_eq!(quantise(srgb_encode(1.0)), 255);
        assert_eq!(quantise(srgb_encode(2.0)), 255);
        assert_eq!(quantise(srgb_encode(-1.0)), 0);
    }

    #[test]
    fn grey_survives_primaries_conversion() {
        let [r, g, b] = transform(&BT2020_TO_BT709, [0.5, 0.5, 0.5]);

        for channel in [r, g, b] {
            assert!((channel - 0.5).abs() < 1e-4);
        }
    }
}
