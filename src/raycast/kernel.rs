//! Per-pixel inverse-depth search.
//!
//! The observer ray through a screen point `s2` is parameterized by the inverse depth `invZ`
//! it would have as seen from the source camera. For each candidate the ray lands at
//! `s1` in the source image; comparing the stored inverse depth there against the candidate
//! brackets the surface crossing. All coordinates are image fractions centered on the
//! optical axis, so `s ∈ (-0.5, 0.5)²` covers the image.

use crate::{
    assets::texture::Texture,
    codec::DepthMaskTexture,
    foundation::{
        core::{Mat2, Mat3, Vec2, Vec3},
        math::smoothstep,
    },
    pose::{KernelPose, skew_matrix},
};

/// Fixed search budget. There is no early exit.
pub const RAYCAST_ITERATIONS: u32 = 40;
/// Default width of the edge feather, as a fraction of the source image.
pub const DEFAULT_FEATHER: f32 = 0.1;

const DENOM_EPSILON: f32 = 1e-6;

/// Intrinsics and pose of one camera as the kernel consumes them.
///
/// `frame` is `Focal · Skew · Rotation` and maps kernel-frame offsets to homogeneous image
/// coordinates; `position` is in kernel axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelCamera {
    pub frame: Mat3,
    pub position: Vec3,
}

impl KernelCamera {
    /// `focal` is normalized: focal length in pixels over the image width / height.
    pub fn new(focal: Vec2, skew: Vec2, rotation: Mat3, position: Vec3) -> Self {
        Self {
            frame: focal_matrix(focal) * skew_matrix(skew) * rotation,
            position,
        }
    }

    /// The observer sits at the origin of its own frame with identity orientation.
    pub fn observer(focal: Vec2, skew: Vec2) -> Self {
        Self::new(focal, skew, Mat3::IDENTITY, Vec3::ZERO)
    }

    pub fn source(focal: Vec2, skew: Vec2, pose: &KernelPose) -> Self {
        Self::new(focal, skew, pose.rotation, pose.position)
    }
}

pub fn focal_matrix(focal: Vec2) -> Mat3 {
    Mat3::from_diagonal(Vec3::new(focal.x, focal.y, 1.0))
}

/// Observer → source mapping for one (view, layer) pair, computed once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    p: Mat3,
    c: Vec3,
}

impl Homography {
    /// `P = source · observer⁻¹`, `C = source · (observer_pos − source_pos)`.
    ///
    /// `None` when the observer frame is singular.
    pub fn new(source: &KernelCamera, observer: &KernelCamera) -> Option<Self> {
        let det = observer.frame.determinant();
        if !(det.abs() > f32::EPSILON) {
            return None;
        }
        let p = source.frame * observer.frame.inverse();
        let c = source.frame * (observer.position - source.position);
        (p.is_finite() && c.is_finite()).then_some(Self { p, c })
    }

    pub fn matrix(&self) -> Mat3 {
        self.p
    }

    pub fn offset(&self) -> Vec3 {
        self.c
    }

    /// The observer ray through screen point `s2`.
    pub fn ray(&self, s2: Vec2) -> Option<ObserverRay> {
        let p_xyxy = Mat2::from_cols(self.p.x_axis.truncate(), self.p.y_axis.truncate());
        let p_xyz = self.p.z_axis.truncate();
        let p_zxy = Vec2::new(self.p.x_axis.z, self.p.y_axis.z);
        let p_zz = self.p.z_axis.z;

        let q_z = p_zxy.dot(s2) + p_zz;
        if !(q_z.abs() > DENOM_EPSILON) {
            return None;
        }
        let q_xy = p_xyxy * s2 + p_xyz;
        Some(ObserverRay {
            c: self.c,
            dir: q_xy / q_z,
            q_z,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ObserverRay {
    c: Vec3,
    dir: Vec2,
    q_z: f32,
}

/// Where a candidate lands in the source image and the inverse depth the observer sees it at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayPoint {
    pub s1: Vec2,
    pub observer_inv_z: f32,
}

impl ObserverRay {
    pub fn at(&self, inv_z: f32) -> Option<RayPoint> {
        let denom = 1.0 - self.c.z * inv_z;
        if !(denom.abs() > DENOM_EPSILON) {
            return None;
        }
        let s1 = self.c.truncate() * inv_z + denom * self.dir;
        let observer_inv_z = inv_z * self.q_z / denom;
        (s1.is_finite() && observer_inv_z.is_finite()).then_some(RayPoint { s1, observer_inv_z })
    }
}

/// One layer of one source view.
#[derive(Clone, Copy, Debug)]
pub struct LayerSource<'a> {
    pub rgb: &'a Texture,
    pub depth: &'a DepthMaskTexture,
}

/// Reconstructed surface sample. `color` is straight (not premultiplied).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaySample {
    pub color: Vec3,
    pub alpha: f32,
    /// Inverse depth of the hit as seen from the observer.
    pub inv_z: f32,
    pub confidence: f32,
}

impl RaySample {
    pub const BACKGROUND: Self = Self {
        color: Vec3::ZERO,
        alpha: 0.0,
        inv_z: 0.0,
        confidence: 0.0,
    };

    pub fn is_hit(&self) -> bool {
        self.alpha > 0.0
    }
}

/// Search the layer's depth surface along the observer ray through `screen_uv`.
pub fn raycast(
    screen_uv: Vec2,
    homography: &Homography,
    layer: LayerSource<'_>,
    feather: f32,
) -> RaySample {
    let range = layer.depth.range();
    if range.is_degenerate() {
        return RaySample::BACKGROUND;
    }
    let Some(ray) = homography.ray(screen_uv - Vec2::splat(0.5)) else {
        return RaySample::BACKGROUND;
    };

    let initial_step = (range.inv_z_min - range.inv_z_max) / RAYCAST_ITERATIONS as f32;
    let mut step = initial_step;
    let mut inv_z = range.inv_z_min;
    let mut last = None;

    for _ in 0..RAYCAST_ITERATIONS {
        last = ray.at(inv_z).map(|point| {
            let stored = layer.depth.sample_inv_z(point.s1 + Vec2::splat(0.5));
            (point, inv_z, stored)
        });
        if let Some((point, _, stored)) = last
            && stored > inv_z
            && point.observer_inv_z > 0.0
        {
            inv_z += step;
            step *= 0.5;
        }
        inv_z -= step;
    }

    let Some((point, candidate, stored)) = last else {
        return RaySample::BACKGROUND;
    };
    let inside = point.s1.x.abs() < 0.5 && point.s1.y.abs() < 0.5;
    if !inside || !(point.observer_inv_z > 0.0) {
        return RaySample::BACKGROUND;
    }

    let uv = point.s1 + Vec2::splat(0.5);
    if !layer.depth.mask_valid(uv) {
        return RaySample {
            inv_z: point.observer_inv_z,
            ..RaySample::BACKGROUND
        };
    }

    let color = layer.rgb.sample(uv).truncate();
    let alpha = taper(uv, feather);
    let miss = ((stored - candidate).abs() / initial_step).clamp(0.0, 1.0);
    RaySample {
        color,
        alpha,
        inv_z: point.observer_inv_z,
        confidence: alpha * (1.0 - miss),
    }
}

/// [`raycast`] straight from the two cameras, without a cached [`Homography`].
pub fn raycast_views(
    screen_uv: Vec2,
    observer: &KernelCamera,
    source: &KernelCamera,
    layer: LayerSource<'_>,
    feather: f32,
) -> RaySample {
    match Homography::new(source, observer) {
        Some(h) => raycast(screen_uv, &h, layer, feather),
        None => RaySample::BACKGROUND,
    }
}

/// Edge feather: 1 in the interior, smoothly falling to 0 over a band of width `feather`
/// along every image edge.
pub fn taper(uv: Vec2, feather: f32) -> f32 {
    if !(feather > 0.0) {
        return 1.0;
    }
    let f = feather.min(0.5);
    let edge = |t: f32| smoothstep(0.0, f, t) * (1.0 - smoothstep(1.0 - f, 1.0, t));
    edge(uv.x) * edge(uv.y)
}

#[cfg(test)]
#[path = "../../tests/unit/raycast/kernel.rs"]
mod tests;
