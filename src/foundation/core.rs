use crate::foundation::error::{LifError, LifResult};

pub use glam::{Affine3A, Mat2, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Pixel dimensions of a texture or output surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Create a validated, non-empty extent.
    pub fn new(width: u32, height: u32) -> LifResult<Self> {
        if width == 0 || height == 0 {
            return Err(LifError::validation(format!(
                "extent must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered by this extent.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Width and height as a float vector.
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Width divided by height.
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Quantize a premultiplied unit-range color. Non-finite channels become 0.
    pub fn from_unit_premul(c: Vec4) -> Self {
        Self {
            r: crate::foundation::math::unit_to_u8(c.x),
            g: crate::foundation::math::unit_to_u8(c.y),
            b: crate::foundation::math::unit_to_u8(c.z),
            a: crate::foundation::math::unit_to_u8(c.w),
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Rigid placement of a camera in world space.
///
/// World convention is right-handed with cameras looking down their local −Z, +Y up.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    /// Camera position.
    pub position: Vec3,
    /// Camera orientation (local to world).
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Pose at `eye` whose −Z axis points at `target`.
    ///
    /// Falls back to the identity orientation when `eye == target`.
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = target - eye;
        if forward.length_squared() <= f32::EPSILON {
            return Self::from_position(eye);
        }
        // look_at_rh builds world->view; the pose wants view->world.
        let view = Mat4::look_at_rh(eye, target, up);
        let rotation = Quat::from_mat4(&view.inverse()).normalize();
        Self {
            position: eye,
            rotation,
        }
    }

    pub fn to_affine(self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation, self.position)
    }

    /// Decompose a rigid affine. Scale, if present, is discarded.
    pub fn from_affine(affine: Affine3A) -> Self {
        let (_scale, rotation, position) = affine.to_scale_rotation_translation();
        Self {
            position,
            rotation: rotation.normalize(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
