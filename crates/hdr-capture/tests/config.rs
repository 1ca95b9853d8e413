use hdr_capture::{
    ConfigError, Display, DisplayId, DisplayRect, HdrMetadata, HdrMode, ToneMapParams,
    ToneMapPolicy,
};

fn display(hdr: Option<HdrMetadata>) -> Display {
    Display {
        id: DisplayId(1),
        name: "Test".to_string(),
        rect: DisplayRect::new(0, 0, 1920, 1080).unwrap(),
        hdr,
    }
}

#[test]
fn force_and_clip_conflict() {
    assert_eq!(
        HdrMode::from_flags(true, true),
        Err(ConfigError::ConflictingHdrFlags)
    );
    assert_eq!(HdrMode::from_flags(false, false), Ok(HdrMode::Native));
    assert_eq!(HdrMode::from_flags(true, false), Ok(HdrMode::Force));
    assert_eq!(HdrMode::from_flags(false, true), Ok(HdrMode::Clip));
}

#[test]
fn clip_mode_uses_clip_policy() {
    assert_eq!(HdrMode::Clip.policy(), ToneMapPolicy::Clip);
    assert_eq!(HdrMode::Native.policy(), ToneMapPolicy::Perceptual);
    assert_eq!(HdrMode::Force.policy(), ToneMapPolicy::Perceptual);
}

#[test]
fn sdr_display_is_only_tonemapped_when_forced() {
    let sdr = display(None);

    assert_eq!(HdrMode::Native.tonemap_params(&sdr), None);
    assert_eq!(HdrMode::Clip.tonemap_params(&sdr), None);

    let forced = HdrMode::Force.tonemap_params(&sdr).unwrap();
    assert!(forced.validate().is_ok());
}

#[test]
fn hdr_display_uses_its_metadata() {
    let hdr = display(Some(HdrMetadata {
        sdr_white_nits: 240.0,
        max_luminance_nits: 1000.0,
    }));

    let expected = Some(ToneMapParams {
        sdr_white_nits: 240.0,
        max_luminance_nits: 1000.0,
    });
    assert_eq!(HdrMode::Native.tonemap_params(&hdr), expected);
    assert_eq!(HdrMode::Force.tonemap_params(&hdr), expected);
}

#[test]
fn zero_and_non_finite_params_are_invalid() {
    let zero_peak = ToneMapParams {
        sdr_white_nits: 200.0,
        max_luminance_nits: 0.0,
    };
    assert_eq!(zero_peak.validate().unwrap_err().parameter, "max_luminance_nits");

    let nan_white = ToneMapParams {
        sdr_white_nits: f32::NAN,
        max_luminance_nits: 1000.0,
    };
    assert_eq!(nan_white.validate().unwrap_err().parameter, "sdr_white_nits");
}
