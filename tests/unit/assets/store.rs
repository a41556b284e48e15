use super::*;
use crate::{
    codec::InvDepthRange,
    foundation::core::{Extent, Mat3, Quat, Vec4},
    pose::slant_matrix,
};

fn layer() -> PreparedLayer {
    let e = Extent::new(8, 4).unwrap();
    PreparedLayer::new(
        Texture::solid(e, Vec4::ONE),
        DepthMaskTexture::flat(e, 0.75, InvDepthRange::new(1.0, 0.5).unwrap()),
        4.0,
    )
    .unwrap()
}

fn view(index: usize, x: f32, skew: Vec2) -> PreparedView {
    PreparedView {
        index,
        position: Vec3::new(x, 0.0, 0.0),
        orientation: SourceOrientation::RotationMatrix(Mat3::IDENTITY),
        skew,
        layers: vec![layer()],
    }
}

#[test]
fn layer_focal_is_normalized_per_axis() {
    assert_eq!(layer().focal, Vec2::new(0.5, 1.0));
    let e = Extent::new(2, 2).unwrap();
    assert!(
        PreparedLayer::new(
            Texture::solid(e, Vec4::ONE),
            DepthMaskTexture::flat(e, 0.75, InvDepthRange::new(1.0, 0.5).unwrap()),
            0.0,
        )
        .is_err()
    );
}

#[test]
fn from_views_enforces_caps() {
    let conv = AxisConvention::default();
    assert!(PreparedLif::from_views(vec![], None, conv).is_err());
    assert!(
        PreparedLif::from_views(
            vec![view(0, 0.0, Vec2::ZERO), view(1, 0.1, Vec2::ZERO), view(2, 0.2, Vec2::ZERO)],
            None,
            conv
        )
        .is_err()
    );

    let mut deep = view(0, 0.0, Vec2::ZERO);
    deep.layers = vec![layer(); 5];
    assert!(PreparedLif::from_views(vec![deep], None, conv).is_err());
}

#[test]
fn convergence_comes_from_stereo_metadata_or_skews() {
    let conv = AxisConvention::default();
    let meta = StereoMetadata {
        baseline_m: 0.06,
        invd: None,
    };
    let lif = PreparedLif::from_views(
        vec![
            view(0, -0.03, Vec2::new(0.01, 0.0)),
            view(1, 0.03, Vec2::new(-0.01, 0.0)),
        ],
        Some(meta),
        conv,
    )
    .unwrap();
    assert!(lif.is_stereo());
    assert!((lif.convergence().unwrap().meters() - 3.0).abs() < 1e-4);

    let mono = PreparedLif::from_views(vec![view(0, 0.0, Vec2::ZERO)], Some(meta), conv).unwrap();
    assert!(mono.convergence().is_none());
    assert!(mono.faults().is_empty());
}

#[test]
fn projector_placement_composes_with_view_position_and_rotation() {
    let lif = PreparedLif::from_views(
        vec![view(0, 1.0, Vec2::ZERO)],
        None,
        AxisConvention::default(),
    )
    .unwrap();
    let placement = Pose::new(Vec3::new(0.0, 0.0, -5.0), Quat::from_rotation_y(std::f32::consts::PI));
    let projector = LifProjector::new(lif).with_placement(placement);

    let view = &projector.asset().views()[0];
    assert!((projector.view_position(view) - Vec3::new(-1.0, 0.0, -5.0)).length() < 1e-5);
    assert!(
        projector
            .view_rotation(view)
            .abs_diff_eq(Mat3::from_quat(placement.rotation), 1e-6)
    );
}

#[test]
fn legacy_view_rotation_resolves_to_identity_for_zero_scalars() {
    let mut v = view(0, 0.0, Vec2::ZERO);
    v.orientation = SourceOrientation::LegacySlantRoll {
        slant: Vec2::ZERO,
        roll_deg: 0.0,
    };
    assert!(
        v.world_rotation(AxisConvention::default())
            .abs_diff_eq(Mat3::IDENTITY, 1e-7)
    );
}

#[test]
fn legacy_slant_keeps_its_exact_matrix() {
    let slant = Vec2::new(0.3, -0.2);
    let mut v = view(0, 0.0, Vec2::ZERO);
    v.orientation = SourceOrientation::LegacySlantRoll {
        slant,
        roll_deg: 0.0,
    };
    let conv = AxisConvention::default();
    let expected = conv.from_kernel_rotation(slant_matrix(slant));
    assert!(v.world_rotation(conv).abs_diff_eq(expected, 1e-7));

    let projector = LifProjector::new(PreparedLif::from_views(vec![v], None, conv).unwrap());
    let view = &projector.asset().views()[0];
    assert!(projector.view_rotation(view).abs_diff_eq(expected, 1e-6));
}
