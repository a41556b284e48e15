use crate::foundation::core::Vec2;

/// Stereo metadata embedded in a LIF.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StereoMetadata {
    /// Physical separation of the two capture cameras, meters.
    pub baseline_m: f32,
    /// Inverse convergence disparity, if the file records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invd: Option<f32>,
}

/// Distance of the zero-parallax plane, in scene units.
///
/// Derived once per loaded file from its stereo metadata. It is independent of wherever a
/// renderer chooses to place its output surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvergenceDepth(f32);

impl ConvergenceDepth {
    /// `baseline / invd`. `invd` comes from the metadata when present, otherwise from the
    /// difference of the two views' horizontal frustum skews. `None` when neither yields a
    /// positive value.
    pub fn derive(meta: &StereoMetadata, skews: Option<(Vec2, Vec2)>) -> Option<Self> {
        let invd = meta
            .invd
            .or_else(|| skews.map(|(left, right)| (left.x - right.x).abs()))?;
        if invd.is_nan() || invd <= 0.0 || !meta.baseline_m.is_finite() || meta.baseline_m <= 0.0 {
            return None;
        }
        let depth = meta.baseline_m / invd;
        depth.is_finite().then_some(Self(depth))
    }

    pub fn meters(self) -> f32 {
        self.0
    }
}
