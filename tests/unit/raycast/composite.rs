use super::*;

fn sample(color: Vec3, alpha: f32) -> RaySample {
    RaySample {
        color,
        alpha,
        inv_z: 0.5,
        confidence: alpha,
    }
}

#[test]
fn opaque_front_layer_occludes_everything_behind() {
    let front = sample(Vec3::new(0.2, 0.4, 0.6), 1.0);
    let back = sample(Vec3::new(1.0, 0.0, 0.0), 1.0);
    let acc = composite_front_to_back([front, back]);
    assert_eq!(acc.color, front.color);
    assert_eq!(acc.alpha, 1.0);
}

#[test]
fn later_layers_are_not_pulled_once_opaque() {
    let mut pulled = 0;
    let layers = (0..4).map(|i| {
        pulled += 1;
        sample(Vec3::splat(i as f32 / 4.0), 1.0)
    });
    let acc = composite_front_to_back(layers);
    assert_eq!(pulled, 1);
    assert_eq!(acc.color, Vec3::ZERO);
}

#[test]
fn transparent_front_layer_passes_back_layer_through() {
    let back = sample(Vec3::new(0.1, 0.7, 0.3), 0.8);
    let acc = composite_front_to_back([RaySample::BACKGROUND, back]);
    assert_eq!(acc.color, back.color * 0.8);
    assert_eq!(acc.alpha, 0.8);
}

#[test]
fn partial_layers_follow_the_over_rule() {
    let front = sample(Vec3::new(1.0, 0.0, 0.0), 0.5);
    let back = sample(Vec3::new(0.0, 0.0, 1.0), 0.5);
    let acc = composite_front_to_back([front, back]);
    assert!((acc.color - Vec3::new(0.5, 0.0, 0.25)).abs().max_element() < 1e-6);
    assert!((acc.alpha - 0.75).abs() < 1e-6);
}

#[test]
fn order_matters() {
    let a = sample(Vec3::new(1.0, 0.0, 0.0), 0.6);
    let b = sample(Vec3::new(0.0, 1.0, 0.0), 0.6);
    let ab = composite_front_to_back([a, b]);
    let ba = composite_front_to_back([b, a]);
    assert!((ab.alpha - ba.alpha).abs() < 1e-6);
    assert_ne!(ab.color, ba.color);
}

#[test]
fn background_fills_remaining_coverage() {
    let acc = composite_front_to_back([sample(Vec3::ONE, 0.25)]);
    let out = acc.over_background(Vec4::new(0.0, 0.0, 1.0, 1.0));
    assert!((out - Vec4::new(0.25, 0.25, 1.0, 1.0)).abs().max_element() < 1e-6);

    let empty = Accum::EMPTY.over_background(Vec4::new(0.2, 0.4, 0.6, 0.5));
    assert!((empty - Vec4::new(0.1, 0.2, 0.3, 0.5)).abs().max_element() < 1e-6);
}
