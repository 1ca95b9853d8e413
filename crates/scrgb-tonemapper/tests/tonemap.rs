use half::f16;
use hdr_capture::{CapturedFrame, PixelFormat, ToneMapParams, ToneMapPolicy, Tonemapper};
use rand::{Rng, SeedableRng, rngs::StdRng};
use scrgb_tonemapper::{
    Error, InputColorSpace, ScrgbTonemapper, color::pq_inverse_eotf,
};

const PARAMS: ToneMapParams = ToneMapParams {
    sdr_white_nits: 240.0,
    max_luminance_nits: 1000.0,
};

fn hdr_frame(width: u32, height: u32, pixels: &[[f32; 4]]) -> CapturedFrame {
    let data: Vec<u8> = pixels
        .iter()
        .flat_map(|pixel| pixel.iter().flat_map(|c| f16::from_f32(*c).to_le_bytes()))
        .collect();

    CapturedFrame::new(PixelFormat::Rgba16Float, width, height, data).unwrap()
}

fn grey(value: f32) -> [f32; 4] {
    [value, value, value, 1.0]
}

#[test]
fn sdr_input_is_unchanged() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut data = vec![0u8; 16 * 8 * 4];
    rng.fill(data.as_mut_slice());
    let frame = CapturedFrame::new(PixelFormat::Bgra8Unorm, 16, 8, data).unwrap();

    let output = ScrgbTonemapper::default().process(&frame, PARAMS).unwrap();

    assert_eq!(output, frame);
}

#[test]
fn hdr_output_is_bgra8_of_same_size() {
    let frame = hdr_frame(3, 2, &[grey(0.0), grey(1.0), grey(3.0), grey(6.0), grey(12.5), grey(40.0)]);

    let output = ScrgbTonemapper::default().process(&frame, PARAMS).unwrap();

    assert_eq!(output.format(), PixelFormat::Bgra8Unorm);
    assert_eq!(output.size(), [3, 2]);
    assert_eq!(output.data().len(), 3 * 2 * 4);
}

#[test]
fn tonemapping_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let pixels: Vec<[f32; 4]> = (0..64 * 64)
        .map(|_| {
            [
                rng.random_range(0.0..20.0),
                rng.random_range(0.0..20.0),
                rng.random_range(0.0..20.0),
                1.0,
            ]
        })
        .collect();
    let frame = hdr_frame(64, 64, &pixels);
    let tonemapper = ScrgbTonemapper::default();

    let first = tonemapper.process(&frame, PARAMS).unwrap();
    let second = tonemapper.process(&frame, PARAMS).unwrap();

    assert_eq!(first, second);
}

#[test]
fn invalid_luminance_is_rejected() {
    let frame = hdr_frame(1, 1, &[grey(1.0)]);
    let tonemapper = ScrgbTonemapper::default();

    let zero_peak = ToneMapParams {
        max_luminance_nits: 0.0,
        ..PARAMS
    };
    assert!(matches!(
        tonemapper.process(&frame, zero_peak),
        Err(Error::InvalidParameters(_))
    ));

    let zero_white = ToneMapParams {
        sdr_white_nits: 0.0,
        ..PARAMS
    };
    assert!(matches!(
        tonemapper.process(&frame, zero_white),
        Err(Error::InvalidParameters(_))
    ));
}

#[test]
fn paper_white_keeps_headroom() {
    // 240 nits SDR white in scRGB.
    let frame = hdr_frame(1, 1, &[grey(3.0)]);

    let output = ScrgbTonemapper::new(ToneMapPolicy::Clip)
        .process(&frame, PARAMS)
        .unwrap();

    // Linear 1 / 1.1 encoded as sRGB.
    assert_eq!(output.data(), &[245, 245, 245, 255]);
}

#[test]
fn perceptual_paper_white_keeps_headroom() {
    let frame = hdr_frame(1, 1, &[grey(3.0)]);

    let output = ScrgbTonemapper::new(ToneMapPolicy::Perceptual)
        .process(&frame, PARAMS)
        .unwrap();

    assert_eq!(output.data(), &[245, 245, 245, 255]);
}

#[test]
fn forced_sdr_display_keeps_paper_white() {
    // Scene-referred white on a display forced through the HDR pipeline.
    let forced = ToneMapParams {
        sdr_white_nits: 80.0,
        max_luminance_nits: 203.0,
    };
    let frame = hdr_frame(2, 1, &[grey(1.0), grey(203.0 / 80.0)]);

    let output = ScrgbTonemapper::default().process(&frame, forced).unwrap();

    assert_eq!(&output.data()[..4], &[245, 245, 245, 255]);
    assert_eq!(&output.data()[4..], &[255, 255, 255, 255]);
}

#[test]
fn builder_sets_policy_and_input() {
    let tonemapper = ScrgbTonemapper::new(ToneMapPolicy::Clip)
        .with_input_color_space(InputColorSpace::Bt2100Pq);

    assert_eq!(tonemapper.policy(), ToneMapPolicy::Clip);
    assert_eq!(tonemapper.input_color_space(), InputColorSpace::Bt2100Pq);

    let default = ScrgbTonemapper::default();
    assert_eq!(default.policy(), ToneMapPolicy::Perceptual);
    assert_eq!(default.input_color_space(), InputColorSpace::ScRgbLinear);
}

#[test]
fn black_stays_black() {
    let frame = hdr_frame(2, 1, &[[0.0, 0.0, 0.0, 1.0], [-0.5, -0.1, -2.0, 1.0]]);

    let output = ScrgbTonemapper::default().process(&frame, PARAMS).unwrap();

    assert_eq!(output.data(), &[0, 0, 0, 255, 0, 0, 0, 255]);
}

#[test]
fn display_peak_maps_to_full_output() {
    let peak = PARAMS.max_luminance_nits / 80.0;
    let frame = hdr_frame(2, 1, &[grey(peak), grey(peak * 4.0)]);

    let output = ScrgbTonemapper::default().process(&frame, PARAMS).unwrap();

    for channel in output.data() {
        assert!(*channel >= 254, "{channel}");
    }
}

#[test]
fn output_is_monotonic_in_luminance() {
    let pixels: Vec<[f32; 4]> = (0..256).map(|step| grey(step as f32 * 0.1)).collect();
    let frame = hdr_frame(256, 1, &pixels);

    for policy in [ToneMapPolicy::Perceptual, ToneMapPolicy::Clip] {
        let output = ScrgbTonemapper::new(policy).process(&frame, PARAMS).unwrap();

        let greens: Vec<u8> = output.data().chunks_exact(4).map(|pixel| pixel[1]).collect();
        assert!(greens.windows(2).all(|pair| pair[0] <= pair[1]), "{policy:?}");
    }
}

#[test]
fn perceptual_compresses_less_than_clip_removes() {
    // Two highlights above the target peak stay distinguishable only with the perceptual curve.
    let frame = hdr_frame(2, 1, &[grey(3.4), grey(3.6)]);

    let clipped = ScrgbTonemapper::new(ToneMapPolicy::Clip)
        .process(&frame, PARAMS)
        .unwrap();
    let perceptual = ScrgbTonemapper::new(ToneMapPolicy::Perceptual)
        .process(&frame, PARAMS)
        .unwrap();

    assert_eq!(clipped.data()[0], clipped.data()[4]);
    assert!(perceptual.data()[0] < perceptual.data()[4]);
}

#[test]
fn pq_input_is_decoded() {
    let white = pq_inverse_eotf(PARAMS.sdr_white_nits);
    let frame = hdr_frame(1, 1, &[grey(white)]);

    let output = ScrgbTonemapper::new(ToneMapPolicy::Clip)
        .with_input_color_space(InputColorSpace::Bt2100Pq)
        .process(&frame, PARAMS)
        .unwrap();

    for channel in &output.data()[..3] {
        assert!((244..=245).contains(channel), "{channel}");
    }
}
