use super::*;

#[test]
fn extent_rejects_empty() {
    assert!(Extent::new(0, 4).is_err());
    assert!(Extent::new(4, 0).is_err());
    let e = Extent::new(4, 2).unwrap();
    assert_eq!(e.pixel_count(), 8);
    assert_eq!(e.aspect(), 2.0);
}

#[test]
fn rgba8_from_unit_clamps_and_zeroes_nan() {
    let px = Rgba8Premul::from_unit_premul(Vec4::new(1.5, f32::NAN, 0.5, 1.0));
    assert_eq!(px.to_array(), [255, 0, 128, 255]);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
}

#[test]
fn pose_affine_roundtrip() {
    let pose = Pose::new(
        Vec3::new(1.0, -2.0, 3.0),
        Quat::from_rotation_y(0.4) * Quat::from_rotation_x(-0.2),
    );
    let back = Pose::from_affine(pose.to_affine());
    assert!((back.position - pose.position).length() < 1e-5);
    assert!(back.rotation.dot(pose.rotation).abs() > 1.0 - 1e-5);
}

#[test]
fn looking_at_points_minus_z_at_target() {
    let pose = Pose::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let forward = pose.rotation * Vec3::NEG_Z;
    assert!((forward - Vec3::NEG_Z).length() < 1e-5);

    let pose = Pose::looking_at(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
    let forward = pose.rotation * Vec3::NEG_Z;
    assert!((forward - Vec3::NEG_X).length() < 1e-5);
}

#[test]
fn looking_at_degenerate_target_keeps_identity() {
    let pose = Pose::looking_at(Vec3::ONE, Vec3::ONE, Vec3::Y);
    assert_eq!(pose.rotation, Quat::IDENTITY);
    assert_eq!(pose.position, Vec3::ONE);
}
