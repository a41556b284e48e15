//! Inverse-depth + mask codec.
//!
//! A layer's inverse-depth map and its optional validity mask travel together in one RGBA
//! surface: red holds the normalized inverse depth, alpha holds the mask (1 = valid).

use crate::{
    assets::texture::Texture,
    foundation::{
        core::{Extent, Vec2, Vec4},
        error::{LifError, LifResult},
    },
};

/// Depth lookups stay at least this many texels away from the image border.
pub const DEPTH_EDGE_MARGIN_TEXELS: f32 = 2.0;
/// Mask samples below this value mark a texel invalid.
pub const MASK_THRESHOLD: f32 = 0.5;
/// Offset of the 3×3 dilation neighborhood, in texels.
pub const MASK_DILATION_TEXELS: f32 = 1.5;

/// Calibrated inverse-depth range of one layer.
///
/// `inv_z_min` is the inverse depth of the *closest* point and therefore the larger value.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InvDepthRange {
    pub inv_z_min: f32,
    pub inv_z_max: f32,
}

impl InvDepthRange {
    pub fn new(inv_z_min: f32, inv_z_max: f32) -> LifResult<Self> {
        if !inv_z_min.is_finite() || !inv_z_max.is_finite() {
            return Err(LifError::validation("inverse depth range must be finite"));
        }
        if inv_z_min < inv_z_max {
            return Err(LifError::validation(format!(
                "inv_z_min ({inv_z_min}) must be >= inv_z_max ({inv_z_max}): min is the nearest point"
            )));
        }
        Ok(Self {
            inv_z_min,
            inv_z_max,
        })
    }

    /// `true` when the range collapses and no search interval exists.
    pub fn is_degenerate(self) -> bool {
        (self.inv_z_min - self.inv_z_max).abs() <= f32::EPSILON
    }

    /// Map a normalized red-channel sample to inverse depth.
    pub fn decode(self, red: f32) -> f32 {
        red * (self.inv_z_min - self.inv_z_max) + self.inv_z_max
    }

    /// Map inverse depth to the normalized red-channel value. Degenerate ranges encode 0.
    pub fn encode(self, inv_z: f32) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        ((inv_z - self.inv_z_max) / (self.inv_z_min - self.inv_z_max)).clamp(0.0, 1.0)
    }
}

/// Packed inverse-depth + mask surface of one layer.
#[derive(Clone, Debug)]
pub struct DepthMaskTexture {
    texture: Texture,
    range: InvDepthRange,
}

impl DepthMaskTexture {
    /// Pack a normalized depth plane and an optional mask plane (1 = valid).
    ///
    /// A missing mask marks every texel valid.
    pub fn pack(
        extent: Extent,
        depth: &[f32],
        mask: Option<&[f32]>,
        range: InvDepthRange,
    ) -> LifResult<Self> {
        if depth.len() != extent.pixel_count() {
            return Err(LifError::validation(format!(
                "depth plane expects {} samples, got {}",
                extent.pixel_count(),
                depth.len()
            )));
        }
        if let Some(mask) = mask
            && mask.len() != depth.len()
        {
            return Err(LifError::validation(format!(
                "mask plane expects {} samples, got {}",
                depth.len(),
                mask.len()
            )));
        }

        let texels = depth
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let m = mask.map_or(1.0, |m| m[i]);
                Vec4::new(d, 0.0, 0.0, m)
            })
            .collect();
        Ok(Self {
            texture: Texture::from_texels(extent, texels)?,
            range,
        })
    }

    /// Pack from absolute inverse-depth values.
    pub fn from_inv_depth(
        extent: Extent,
        inv_z: &[f32],
        mask: Option<&[f32]>,
        range: InvDepthRange,
    ) -> LifResult<Self> {
        let normalized: Vec<f32> = inv_z.iter().map(|&v| range.encode(v)).collect();
        Self::pack(extent, &normalized, mask, range)
    }

    /// Constant inverse depth over the whole layer, fully valid.
    pub fn flat(extent: Extent, inv_z: f32, range: InvDepthRange) -> Self {
        Self {
            texture: Texture::solid(extent, Vec4::new(range.encode(inv_z), 0.0, 0.0, 1.0)),
            range,
        }
    }

    pub fn range(&self) -> InvDepthRange {
        self.range
    }

    pub fn extent(&self) -> Extent {
        self.texture.extent()
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Stored inverse depth at `uv`, sampled inset from the borders.
    pub fn sample_inv_z(&self, uv: Vec2) -> f32 {
        let red = self.texture.sample_inset(uv, DEPTH_EDGE_MARGIN_TEXELS).x;
        self.range.decode(red)
    }

    /// Dilated mask test: invalid when any of the 3×3 neighbors falls below threshold.
    pub fn mask_valid(&self, uv: Vec2) -> bool {
        let step = self.texture.texel_size() * MASK_DILATION_TEXELS;
        for dy in [-1.0f32, 0.0, 1.0] {
            for dx in [-1.0f32, 0.0, 1.0] {
                let a = self.texture.sample(uv + Vec2::new(dx, dy) * step).w;
                if a.is_nan() || a < MASK_THRESHOLD {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/depth.rs"]
mod tests;
