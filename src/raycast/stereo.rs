//! Two-view blending: occlusion reconciliation and the observer-position weight.

use crate::foundation::{core::Vec3, math::smoothstep};

use super::kernel::RaySample;

/// When the two views disagree about coverage, one result replaces the other.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StereoThresholds {
    /// Alphas further apart than this count as a disagreement.
    pub alpha_difference: f32,
    /// Treat one view fully transparent against the other fully opaque as a disagreement.
    pub full_disagreement: bool,
}

impl Default for StereoThresholds {
    fn default() -> Self {
        Self {
            alpha_difference: 0.1,
            full_disagreement: true,
        }
    }
}

impl StereoThresholds {
    pub fn disagree(&self, left: &RaySample, right: &RaySample) -> bool {
        let full = (left.alpha == 0.0 && right.alpha == 1.0)
            || (left.alpha == 1.0 && right.alpha == 0.0);
        (self.full_disagreement && full)
            || (left.alpha - right.alpha).abs() > self.alpha_difference
    }
}

/// Replace the lower-confidence result with the higher one when the views disagree.
pub fn reconcile(
    left: RaySample,
    right: RaySample,
    thresholds: &StereoThresholds,
) -> (RaySample, RaySample) {
    if !thresholds.disagree(&left, &right) {
        return (left, right);
    }
    if left.confidence >= right.confidence {
        (left, left)
    } else {
        (right, right)
    }
}

/// `smoothstep(0, 1, dot(c2 − c1, c − c1) / |c2 − c1|²)`.
///
/// 0 at the first view, 1 at the second. Coincident views weigh fully toward the first.
pub fn stereo_weight(c1: Vec3, c2: Vec3, observer: Vec3) -> f32 {
    let axis = c2 - c1;
    let len2 = axis.length_squared();
    if !(len2 > f32::EPSILON) {
        return 0.0;
    }
    let t = axis.dot(observer - c1) / len2;
    if !t.is_finite() {
        return 0.0;
    }
    smoothstep(0.0, 1.0, t)
}

/// Linear blend of two reconciled samples, `w` toward `right`.
pub fn blend(left: &RaySample, right: &RaySample, w: f32) -> RaySample {
    let lerp = |a: f32, b: f32| a + (b - a) * w;
    RaySample {
        color: left.color.lerp(right.color, w),
        alpha: lerp(left.alpha, right.alpha),
        inv_z: lerp(left.inv_z, right.inv_z),
        confidence: lerp(left.confidence, right.confidence),
    }
}

/// Reconcile then blend one layer's pair of samples.
pub fn blend_views(
    left: RaySample,
    right: RaySample,
    w: f32,
    thresholds: &StereoThresholds,
) -> RaySample {
    let (left, right) = reconcile(left, right, thresholds);
    blend(&left, &right, w)
}

#[cfg(test)]
#[path = "../../tests/unit/raycast/stereo.rs"]
mod tests;
