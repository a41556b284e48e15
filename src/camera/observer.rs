use crate::{
    foundation::{
        core::{Extent, Mat4, Pose, Vec2, Vec3},
        error::{LifError, LifResult},
    },
    raycast::KernelCamera,
};

/// The viewpoint a frame is rendered from.
///
/// `focal` is normalized (focal length in pixels over the output width / height) and `skew`
/// holds the off-axis principal point offset as tangents, the same parameterization the
/// source views use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverCamera {
    pub pose: Pose,
    pub focal: Vec2,
    pub skew: Vec2,
    pub extent: Extent,
}

impl ObserverCamera {
    /// Symmetric frustum with square pixels.
    pub fn perspective(pose: Pose, vertical_fov: f32, extent: Extent) -> LifResult<Self> {
        if !(vertical_fov > 0.0 && vertical_fov < std::f32::consts::PI) {
            return Err(LifError::validation(format!(
                "vertical field of view must be in (0, pi), got {vertical_fov}"
            )));
        }
        let fy = 0.5 / (0.5 * vertical_fov).tan();
        Ok(Self {
            pose,
            focal: Vec2::new(fy / extent.aspect(), fy),
            skew: Vec2::ZERO,
            extent,
        })
    }

    /// Derive intrinsics from a GL-style right-handed projection matrix, including the
    /// asymmetric frustums VR runtimes hand out per eye.
    pub fn from_projection(pose: Pose, projection: Mat4, extent: Extent) -> LifResult<Self> {
        let p00 = projection.x_axis.x;
        let p11 = projection.y_axis.y;
        if !(p00 > 0.0 && p11 > 0.0 && p00.is_finite() && p11.is_finite()) {
            return Err(LifError::validation(
                "projection must have positive, finite focal terms",
            ));
        }
        Ok(Self {
            pose,
            focal: Vec2::new(p00, p11) * 0.5,
            skew: Vec2::new(projection.z_axis.x / p00, projection.z_axis.y / p11),
            extent,
        })
    }

    pub fn with_pose(self, pose: Pose) -> Self {
        Self { pose, ..self }
    }

    pub fn kernel_camera(&self) -> KernelCamera {
        KernelCamera::observer(self.focal, self.skew)
    }

    /// Texture coordinate of an output pixel center. Row 0 is the top of the frame.
    pub fn pixel_uv(&self, x: u32, y: u32) -> Vec2 {
        let size = self.extent.as_vec2();
        Vec2::new(
            (x as f32 + 0.5) / size.x,
            1.0 - (y as f32 + 0.5) / size.y,
        )
    }
}

/// Head-locked eye pair for stereo output.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StereoRig {
    /// Interpupillary distance in scene units.
    pub ipd: f32,
    pub vertical_fov: f32,
}

impl Default for StereoRig {
    fn default() -> Self {
        Self {
            ipd: 0.063,
            vertical_fov: 60f32.to_radians(),
        }
    }
}

impl StereoRig {
    /// Eye poses offset by half the IPD along the head's local X.
    pub fn eye_poses(&self, head: &Pose) -> [Pose; 2] {
        let half = head.rotation * Vec3::new(0.5 * self.ipd, 0.0, 0.0);
        [
            Pose::new(head.position - half, head.rotation),
            Pose::new(head.position + half, head.rotation),
        ]
    }

    /// Symmetric left/right cameras.
    pub fn eye_cameras(&self, head: &Pose, extent: Extent) -> LifResult<[ObserverCamera; 2]> {
        let [left, right] = self.eye_poses(head);
        Ok([
            ObserverCamera::perspective(left, self.vertical_fov, extent)?,
            ObserverCamera::perspective(right, self.vertical_fov, extent)?,
        ])
    }

    /// Left/right cameras from per-eye projection matrices.
    pub fn eye_cameras_with_projections(
        &self,
        head: &Pose,
        projections: [Mat4; 2],
        extent: Extent,
    ) -> LifResult<[ObserverCamera; 2]> {
        let [left, right] = self.eye_poses(head);
        Ok([
            ObserverCamera::from_projection(left, projections[0], extent)?,
            ObserverCamera::from_projection(right, projections[1], extent)?,
        ])
    }
}

/// `frames` observer poses evenly spaced on a circle of `radius` around `center`, in the
/// plane facing `target`, each looking at `target`.
pub fn orbit_path(center: Vec3, target: Vec3, radius: f32, frames: u32) -> Vec<Pose> {
    let forward = (target - center).normalize_or(Vec3::NEG_Z);
    let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
    let up = right.cross(forward);

    (0..frames)
        .map(|i| {
            let theta = std::f32::consts::TAU * i as f32 / frames as f32;
            let eye = center + radius * (theta.cos() * right + theta.sin() * up);
            Pose::looking_at(eye, target, up)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/camera/observer.rs"]
mod tests;
