//! World → observer-local pose transform and the kernel axis convention.
//!
//! Scene poses are rigid transforms in a right-handed, Y-up frame where cameras look down
//! −Z. The raycast kernel is derived for cameras looking down +Z, so every source-view pose
//! crosses [`AxisConvention::to_kernel`] exactly once before it reaches the kernel.

use crate::foundation::core::{Affine3A, Mat3, Pose, Vec2, Vec3};

/// First-column norm at or below which a rotation uniform counts as "not supplied".
pub const ABSENT_ROTATION_NORM: f32 = 0.01;

/// A source view expressed in the observer's local frame (observer at origin, identity
/// orientation). Scene axis convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativePose {
    pub position: Vec3,
    pub rotation: Mat3,
}

impl RelativePose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Mat3::IDENTITY,
    };
}

/// Source-view pose ready for upload: world → camera rotation and camera position, both in
/// kernel axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelPose {
    pub rotation: Mat3,
    pub position: Vec3,
}

/// `p' = C⁻¹·p`, `R' = C⁻¹_rot · R_rot`. Scale in either pose is ignored.
pub fn observer_local(view: &Pose, observer: &Pose) -> RelativePose {
    let inv = observer.rotation.inverse();
    RelativePose {
        position: inv * (view.position - observer.position),
        rotation: Mat3::from_quat((inv * view.rotation).normalize()),
    }
}

/// [`observer_local`] for a view whose orientation is a plain matrix. The matrix is carried
/// through unchanged, orthonormal or not.
pub fn observer_local_mat3(position: Vec3, rotation: Mat3, observer: &Pose) -> RelativePose {
    let inv = Mat3::from_quat(observer.rotation.inverse().normalize());
    RelativePose {
        position: inv * (position - observer.position),
        rotation: inv * rotation,
    }
}

/// [`observer_local`] for 4×4 rigid affines as handed out by a scene graph.
pub fn observer_local_affine(view: Affine3A, observer: Affine3A) -> RelativePose {
    observer_local(&Pose::from_affine(view), &Pose::from_affine(observer))
}

/// Which way the scene's cameras look relative to the kernel's +Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisConvention {
    /// Cameras look down −Z (glTF/GL scene graphs). Converted with `F = diag(1, 1, −1)`.
    #[default]
    LooksNegativeZ,
    /// Cameras already look down +Z; no flip.
    LooksPositiveZ,
}

impl AxisConvention {
    pub fn flip(self) -> Mat3 {
        match self {
            Self::LooksNegativeZ => Mat3::from_diagonal(Vec3::new(1.0, 1.0, -1.0)),
            Self::LooksPositiveZ => Mat3::IDENTITY,
        }
    }

    /// `R_kernel = F · R'ᵀ · F`, position `F · p'`.
    pub fn to_kernel(self, rel: &RelativePose) -> KernelPose {
        let f = self.flip();
        KernelPose {
            rotation: f * rel.rotation.transpose() * f,
            position: f * rel.position,
        }
    }

    /// Inverse of the rotation half of [`to_kernel`](Self::to_kernel): turns a kernel-frame
    /// world → camera rotation back into a scene-convention orientation.
    pub fn from_kernel_rotation(self, kernel: Mat3) -> Mat3 {
        let f = self.flip();
        (f * kernel * f).transpose()
    }
}

/// Orientation of a source view as stored in a LIF.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceOrientation {
    /// Older files: two slant tangents and a roll angle in degrees, defined in kernel axes.
    LegacySlantRoll { slant: Vec2, roll_deg: f32 },
    /// Scene-convention orientation (view → world).
    RotationMatrix(Mat3),
}

impl SourceOrientation {
    /// Pick the representation the way packed uniforms encode it: a rotation whose first
    /// column is (near) zero means the legacy scalars are authoritative.
    pub fn from_uniform(rotation: Mat3, slant: Vec2, roll_deg: f32) -> Self {
        if rotation.x_axis.length() <= ABSENT_ROTATION_NORM {
            Self::LegacySlantRoll { slant, roll_deg }
        } else {
            Self::RotationMatrix(rotation)
        }
    }

    /// Canonical scene-convention orientation.
    pub fn resolve(&self, convention: AxisConvention) -> Mat3 {
        match *self {
            Self::RotationMatrix(m) => m,
            Self::LegacySlantRoll { slant, roll_deg } => {
                convention.from_kernel_rotation(roll_matrix(roll_deg) * slant_matrix(slant))
            }
        }
    }
}

/// Off-axis shear: maps a +Z ray with tangents `skew` back onto the optical axis.
pub fn skew_matrix(skew: Vec2) -> Mat3 {
    Mat3::from_cols(
        Vec3::X,
        Vec3::Y,
        Vec3::new(-skew.x, -skew.y, 1.0),
    )
}

/// Rotation about the view axis.
pub fn roll_matrix(roll_deg: f32) -> Mat3 {
    let (s, c) = roll_deg.to_radians().sin_cos();
    Mat3::from_cols(
        Vec3::new(c, s, 0.0),
        Vec3::new(-s, c, 0.0),
        Vec3::Z,
    )
}

/// Tilt whose optical axis points along the normalized tangent `(slant.x, slant.y, 1)`.
pub fn slant_matrix(slant: Vec2) -> Mat3 {
    let inv_sq_x = 1.0 / (1.0 + slant.x * slant.x).sqrt();
    let inv_sq_y = 1.0 / (1.0 + slant.y * slant.y).sqrt();
    let inv_sq = 1.0 / (1.0 + slant.x * slant.x + slant.y * slant.y).sqrt();
    Mat3::from_cols(
        Vec3::new(inv_sq_x, 0.0, slant.x * inv_sq),
        Vec3::new(0.0, inv_sq_y, slant.y * inv_sq),
        Vec3::new(-slant.x * inv_sq_x, -slant.y * inv_sq_y, inv_sq),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/pose/transform.rs"]
mod tests;
