use super::*;
use crate::{
    assets::{PreparedLif, PreparedView, Texture},
    codec::{DepthMaskTexture, InvDepthRange},
    foundation::core::{Mat3, Pose},
    pose::{AxisConvention, SourceOrientation, roll_matrix, slant_matrix},
};

fn extent() -> Extent {
    Extent::new(32, 32).unwrap()
}

fn layer(color: Vec4, inv_z: f32) -> PreparedLayer {
    PreparedLayer::new(
        Texture::solid(extent(), color),
        DepthMaskTexture::flat(extent(), inv_z, InvDepthRange::new(1.0, 0.5).unwrap()),
        32.0,
    )
    .unwrap()
}

fn view(index: usize, x: f32, layers: Vec<PreparedLayer>) -> PreparedView {
    PreparedView {
        index,
        position: Vec3::new(x, 0.0, 0.0),
        orientation: SourceOrientation::RotationMatrix(Mat3::IDENTITY),
        skew: Vec2::ZERO,
        layers,
    }
}

fn camera(position: Vec3) -> ObserverCamera {
    ObserverCamera {
        pose: Pose::from_position(position),
        focal: Vec2::ONE,
        skew: Vec2::ZERO,
        extent: Extent::new(8, 8).unwrap(),
    }
}

fn projector(views: Vec<PreparedView>) -> LifProjector {
    LifProjector::new(PreparedLif::from_views(views, None, AxisConvention::default()).unwrap())
}

#[test]
fn mono_identity_frame_passes_color_through() {
    let p = projector(vec![view(0, 0.0, vec![layer(Vec4::new(0.2, 0.4, 0.6, 1.0), 0.75)])]);
    let u = FrameUniforms::prepare(&p, &camera(Vec3::ZERO), &RenderSettings::default()).unwrap();
    assert_eq!(u.stereo_weight, 0.0);
    assert_eq!(u.layer_count(), 1);

    let s = u.layer_sample(0, Vec2::splat(0.5));
    assert!((s.inv_z - 0.75).abs() < 1e-4);
    let px = u.shade(Vec2::splat(0.5));
    assert!((px - Vec4::new(0.2, 0.4, 0.6, 1.0)).abs().max_element() < 1e-5);
}

#[test]
fn view_position_is_flipped_into_kernel_axes() {
    let p = projector(vec![view(0, 0.0, vec![layer(Vec4::ONE, 0.75)])]);
    let u = FrameUniforms::prepare(&p, &camera(Vec3::new(0.0, 0.0, 0.5)), &RenderSettings::default())
        .unwrap();
    // 0.5 ahead of the observer along scene −Z is kernel +Z.
    assert!((u.views[0].pose.position - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-6);
}

#[test]
fn stereo_midpoint_weighs_views_equally() {
    let p = projector(vec![
        view(0, -0.05, vec![layer(Vec4::new(1.0, 0.0, 0.0, 1.0), 0.75)]),
        view(1, 0.05, vec![layer(Vec4::new(0.0, 0.0, 1.0, 1.0), 0.75)]),
    ]);
    let u = FrameUniforms::prepare(&p, &camera(Vec3::ZERO), &RenderSettings::default()).unwrap();
    assert!((u.stereo_weight - 0.5).abs() < 1e-6);

    let s = u.layer_sample(0, Vec2::splat(0.5));
    assert!((s.color - Vec3::new(0.5, 0.0, 0.5)).abs().max_element() < 1e-5);

    let at_left = FrameUniforms::prepare(&p, &camera(Vec3::new(-0.05, 0.0, 0.0)), &RenderSettings::default())
        .unwrap();
    assert!(at_left.stereo_weight.abs() < 1e-3);
}

#[test]
fn uneven_layer_counts_fall_back_to_the_view_that_has_the_layer() {
    let p = projector(vec![
        view(
            0,
            -0.05,
            vec![
                layer(Vec4::new(1.0, 0.0, 0.0, 1.0), 0.75),
                layer(Vec4::new(0.0, 1.0, 0.0, 1.0), 0.6),
            ],
        ),
        view(1, 0.05, vec![layer(Vec4::new(0.0, 0.0, 1.0, 1.0), 0.75)]),
    ]);
    let u = FrameUniforms::prepare(&p, &camera(Vec3::ZERO), &RenderSettings::default()).unwrap();
    assert_eq!(u.layer_count(), 2);
    let back = u.layer_sample(1, Vec2::splat(0.5));
    assert!((back.color - Vec3::new(0.0, 1.0, 0.0)).abs().max_element() < 1e-6);
    assert_eq!(u.layer_sample(2, Vec2::splat(0.5)), RaySample::BACKGROUND);
}

#[test]
fn invalid_settings_are_rejected() {
    let p = projector(vec![view(0, 0.0, vec![layer(Vec4::ONE, 0.75)])]);
    let settings = RenderSettings {
        feather: -1.0,
        ..Default::default()
    };
    assert!(FrameUniforms::prepare(&p, &camera(Vec3::ZERO), &settings).is_err());
}

#[test]
fn empty_frame_is_background() {
    let p = projector(vec![view(0, 0.0, vec![layer(Vec4::ONE, 0.75)])]);
    let settings = RenderSettings {
        background: [0.0, 1.0, 0.0, 1.0],
        ..Default::default()
    };
    let u = FrameUniforms::prepare(&p, &camera(Vec3::ZERO), &settings).unwrap();
    // Far outside the source frustum.
    let mut wide = camera(Vec3::ZERO);
    wide.focal = Vec2::splat(0.05);
    let w = FrameUniforms::prepare(&p, &wide, &settings).unwrap();
    assert_eq!(w.shade(Vec2::new(0.99, 0.5)), Vec4::new(0.0, 1.0, 0.0, 1.0));
    assert!(u.shade(Vec2::splat(0.5)).x > 0.99);
}

#[test]
fn legacy_slant_roll_reaches_the_kernel_unchanged() {
    let slant = Vec2::new(0.3, -0.2);
    let roll_deg = 12.0;
    let mut v = view(0, 0.0, vec![layer(Vec4::ONE, 0.75)]);
    v.orientation = SourceOrientation::LegacySlantRoll { slant, roll_deg };
    let p = projector(vec![v]);

    let u = FrameUniforms::prepare(&p, &camera(Vec3::ZERO), &RenderSettings::default()).unwrap();
    let expected = roll_matrix(roll_deg) * slant_matrix(slant);
    assert!(
        u.views[0].pose.rotation.abs_diff_eq(expected, 1e-6),
        "{:?} vs {expected:?}",
        u.views[0].pose.rotation
    );
}
