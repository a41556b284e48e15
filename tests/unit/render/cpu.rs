use super::*;
use crate::{
    assets::{LifProjector, PreparedLayer, PreparedLif, PreparedView, Texture},
    camera::ObserverCamera,
    codec::{DepthMaskTexture, InvDepthRange},
    foundation::core::{Extent, Mat3, Pose, Vec2, Vec3, Vec4},
    pose::{AxisConvention, SourceOrientation},
};

fn projector() -> LifProjector {
    let extent = Extent::new(16, 16).unwrap();
    let layer = PreparedLayer::new(
        Texture::solid(extent, Vec4::new(0.25, 0.5, 0.75, 1.0)),
        DepthMaskTexture::flat(extent, 0.75, InvDepthRange::new(1.0, 0.5).unwrap()),
        16.0,
    )
    .unwrap();
    let view = PreparedView {
        index: 0,
        position: Vec3::ZERO,
        orientation: SourceOrientation::RotationMatrix(Mat3::IDENTITY),
        skew: Vec2::ZERO,
        layers: vec![layer],
    };
    LifProjector::new(PreparedLif::from_views(vec![view], None, AxisConvention::default()).unwrap())
}

fn camera() -> ObserverCamera {
    ObserverCamera {
        pose: Pose::IDENTITY,
        focal: Vec2::ONE,
        skew: Vec2::ZERO,
        extent: Extent::new(7, 5).unwrap(),
    }
}

#[test]
fn render_matches_per_pixel_shading() {
    let p = projector();
    let u = FrameUniforms::prepare(&p, &camera(), &RenderSettings::default()).unwrap();
    let mut backend = CpuBackend::new(RenderSettings::default()).unwrap();
    let frame = backend.render(&u).unwrap();

    assert_eq!((frame.width, frame.height), (7, 5));
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 7 * 5 * 4);
    for (x, y) in [(0, 0), (3, 2), (6, 4)] {
        let expected = Rgba8Premul::from_unit_premul(u.shade_pixel(x, y)).to_array();
        assert_eq!(frame.pixel(x, y), Some(expected));
    }
    assert_eq!(frame.pixel(3, 2), Some([64, 128, 191, 255]));
}

#[test]
fn dedicated_pool_gives_identical_pixels() {
    let p = projector();
    let u = FrameUniforms::prepare(&p, &camera(), &RenderSettings::default()).unwrap();
    let shared = CpuBackend::new(RenderSettings::default())
        .unwrap()
        .render(&u)
        .unwrap();
    let pinned = CpuBackend::new(RenderSettings {
        threads: Some(2),
        ..Default::default()
    })
    .unwrap()
    .render(&u)
    .unwrap();
    assert_eq!(shared.data, pinned.data);
}

#[test]
fn worker_settings_drop_the_thread_count() {
    let backend = CpuBackend::new(RenderSettings {
        threads: Some(3),
        feather: 0.2,
        ..Default::default()
    })
    .unwrap();
    let worker = backend.worker_render_settings().unwrap();
    assert_eq!(worker.threads, None);
    assert_eq!(worker.feather, 0.2);
}

#[test]
fn invalid_settings_are_rejected() {
    assert!(
        CpuBackend::new(RenderSettings {
            threads: Some(0),
            ..Default::default()
        })
        .is_err()
    );
}
