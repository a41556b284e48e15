use super::*;

fn gradient_2x2() -> Texture {
    // Row 0 (top): black, red. Row 1 (bottom): green, blue.
    Texture::from_texels(
        Extent::new(2, 2).unwrap(),
        vec![
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 1.0, 1.0),
        ],
    )
    .unwrap()
}

#[test]
fn texel_centers_sample_exactly() {
    let t = gradient_2x2();
    // Top-left texel center: u = 0.25, v = 0.75 (v grows upwards).
    assert_eq!(t.sample(Vec2::new(0.25, 0.75)), Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(t.sample(Vec2::new(0.75, 0.75)), Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(t.sample(Vec2::new(0.25, 0.25)), Vec4::new(0.0, 1.0, 0.0, 1.0));
    assert_eq!(t.sample(Vec2::new(0.75, 0.25)), Vec4::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn center_is_average_of_four_texels() {
    let t = gradient_2x2();
    let c = t.sample(Vec2::splat(0.5));
    assert!((c - Vec4::new(0.25, 0.25, 0.25, 1.0)).abs().max_element() < 1e-6);
}

#[test]
fn sampling_clamps_to_edge() {
    let t = gradient_2x2();
    assert_eq!(t.sample(Vec2::new(-4.0, 9.0)), Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(t.sample(Vec2::new(9.0, -4.0)), Vec4::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn constant_texture_samples_constant_everywhere() {
    let value = Vec4::new(0.333_333_3, 0.1, 0.9, 1.0);
    let t = Texture::solid(Extent::new(7, 5).unwrap(), value);
    for uv in [
        Vec2::new(0.013, 0.77),
        Vec2::new(0.5, 0.5),
        Vec2::new(0.999, 0.001),
        Vec2::new(0.31, 0.62),
    ] {
        let got = t.sample(uv);
        assert!(got.abs_diff_eq(value, 1e-6), "{uv}: {got}");
    }
}

#[test]
fn nan_uv_samples_zero() {
    let t = gradient_2x2();
    assert_eq!(t.sample(Vec2::new(f32::NAN, 0.5)), Vec4::ZERO);
}

#[test]
fn inset_uv_keeps_margin_from_edges() {
    let t = Texture::solid(Extent::new(100, 50).unwrap(), Vec4::ONE);
    let uv = t.inset_uv(Vec2::new(0.0, 1.0), 2.0);
    assert!((uv.x - 0.02).abs() < 1e-6);
    assert!((uv.y - 0.96).abs() < 1e-6);
    let inner = Vec2::new(0.4, 0.6);
    assert_eq!(t.inset_uv(inner, 2.0), inner);
}

#[test]
fn inset_uv_on_tiny_texture_collapses_to_center() {
    let t = Texture::solid(Extent::new(2, 2).unwrap(), Vec4::ONE);
    assert_eq!(t.inset_uv(Vec2::new(0.0, 1.0), 2.0), Vec2::splat(0.5));
}

#[test]
fn from_rgba8_normalizes_and_checks_length() {
    let e = Extent::new(1, 1).unwrap();
    let t = Texture::from_rgba8(e, &[255, 0, 51, 255]).unwrap();
    assert!((t.fetch(0, 0) - Vec4::new(1.0, 0.0, 0.2, 1.0)).abs().max_element() < 1e-6);
    assert!(Texture::from_rgba8(e, &[0, 0, 0]).is_err());
}
