use super::*;

#[test]
fn defaults_are_valid() {
    let s = RenderSettings::default();
    s.validate().unwrap();
    assert_eq!(s.feather, 0.1);
    assert_eq!(s.stereo.alpha_difference, 0.1);
    assert!(s.stereo.full_disagreement);
    assert_eq!(s.background(), Vec4::new(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn partial_json_fills_defaults() {
    let s: RenderSettings =
        serde_json::from_str(r#"{ "feather": 0.05, "stereo": { "alpha_difference": 0.2 } }"#)
            .unwrap();
    assert_eq!(s.feather, 0.05);
    assert_eq!(s.stereo.alpha_difference, 0.2);
    assert!(s.stereo.full_disagreement);
    assert_eq!(s.background, RenderSettings::default().background);
    assert_eq!(s.threads, None);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let bad = [
        RenderSettings {
            feather: 0.8,
            ..Default::default()
        },
        RenderSettings {
            background: [0.0, 2.0, 0.0, 1.0],
            ..Default::default()
        },
        RenderSettings {
            threads: Some(0),
            ..Default::default()
        },
        RenderSettings {
            stereo: StereoThresholds {
                alpha_difference: f32::NAN,
                full_disagreement: true,
            },
            ..Default::default()
        },
    ];
    for s in bad {
        assert!(s.validate().is_err(), "{s:?}");
    }
}

#[test]
fn thread_override_parsing() {
    assert_eq!(parse_threads(" 4 "), Some(4));
    assert_eq!(parse_threads("0"), None);
    assert_eq!(parse_threads("many"), None);
}

#[test]
fn straight_conversion_unpremultiplies() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 0, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    let straight = frame.to_straight_rgba8();
    assert_eq!(&straight[4..], &[10, 20, 30, 255]);
    assert_eq!(straight[3], 128);
    assert!((i32::from(straight[0]) - 128).abs() <= 1);
    assert_eq!(frame.pixel(1, 0), Some([10, 20, 30, 255]));
}

#[test]
fn pixel_outside_the_frame_is_none() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![0; 8],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(1, 0), Some([0; 4]));
    assert_eq!(frame.pixel(2, 0), None);
    assert_eq!(frame.pixel(0, 1), None);
}
