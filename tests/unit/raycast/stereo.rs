use super::*;

fn sample(color: Vec3, alpha: f32, confidence: f32) -> RaySample {
    RaySample {
        color,
        alpha,
        inv_z: 0.6,
        confidence,
    }
}

#[test]
fn weight_is_zero_and_one_at_the_views() {
    let c1 = Vec3::new(-0.03, 0.0, 0.0);
    let c2 = Vec3::new(0.03, 0.0, 0.0);
    assert_eq!(stereo_weight(c1, c2, c1), 0.0);
    assert_eq!(stereo_weight(c1, c2, c2), 1.0);
    assert!((stereo_weight(c1, c2, Vec3::ZERO) - 0.5).abs() < 1e-6);
}

#[test]
fn weight_is_monotonic_along_the_baseline_and_ignores_orthogonal_offsets() {
    let c1 = Vec3::new(1.0, 0.0, 2.0);
    let c2 = Vec3::new(2.0, 0.0, 2.0);
    let mut prev = -1.0;
    for i in -10..=30 {
        let c = c1 + (c2 - c1) * (i as f32 / 20.0);
        let w = stereo_weight(c1, c2, c);
        assert!(w >= prev);
        prev = w;
    }
    let lifted = Vec3::new(1.5, 3.0, -1.0);
    assert!((stereo_weight(c1, c2, lifted) - 0.5).abs() < 1e-6);
}

#[test]
fn coincident_views_weigh_toward_the_first() {
    let c = Vec3::ONE;
    assert_eq!(stereo_weight(c, c, Vec3::ZERO), 0.0);
}

#[test]
fn agreeing_views_are_left_alone() {
    let l = sample(Vec3::new(1.0, 0.0, 0.0), 1.0, 0.9);
    let r = sample(Vec3::new(0.0, 0.0, 1.0), 0.95, 0.8);
    let (l2, r2) = reconcile(l, r, &StereoThresholds::default());
    assert_eq!((l2, r2), (l, r));

    let mid = blend_views(l, r, 0.5, &StereoThresholds::default());
    assert!((mid.color - Vec3::new(0.5, 0.0, 0.5)).abs().max_element() < 1e-6);
    assert!((mid.alpha - 0.975).abs() < 1e-6);
}

#[test]
fn disagreement_keeps_the_more_confident_view() {
    let hit = sample(Vec3::ONE, 1.0, 0.9);
    let miss = RaySample::BACKGROUND;
    let t = StereoThresholds::default();
    assert_eq!(reconcile(hit, miss, &t), (hit, hit));
    assert_eq!(reconcile(miss, hit, &t), (hit, hit));

    let faint = sample(Vec3::ZERO, 0.5, 0.2);
    let solid = sample(Vec3::ONE, 0.8, 0.7);
    assert_eq!(reconcile(faint, solid, &t), (solid, solid));
}

#[test]
fn thresholds_are_configurable() {
    let hit = sample(Vec3::ONE, 1.0, 0.9);
    let miss = RaySample::BACKGROUND;
    let lax = StereoThresholds {
        alpha_difference: 2.0,
        full_disagreement: false,
    };
    assert_eq!(reconcile(hit, miss, &lax), (hit, miss));

    let full_only = StereoThresholds {
        alpha_difference: 2.0,
        full_disagreement: true,
    };
    assert_eq!(reconcile(hit, miss, &full_only), (hit, hit));
}
