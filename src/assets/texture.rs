use std::sync::Arc;

use crate::foundation::{
    core::{Extent, Vec2, Vec4},
    error::{LifError, LifResult},
};

/// Read-only float RGBA texture with bilinear, clamp-to-edge sampling.
///
/// Texture coordinates follow the GL convention: `uv = (0, 0)` is the bottom-left corner
/// of the image and texel centers sit at half-integer positions. Storage is row-major with
/// row 0 at the *top* of the image, as decoded from image files.
#[derive(Clone, Debug)]
pub struct Texture {
    extent: Extent,
    texels: Arc<[Vec4]>,
}

impl Texture {
    pub fn from_texels(extent: Extent, texels: Vec<Vec4>) -> LifResult<Self> {
        if texels.len() != extent.pixel_count() {
            return Err(LifError::validation(format!(
                "texture expects {} texels for {}x{}, got {}",
                extent.pixel_count(),
                extent.width,
                extent.height,
                texels.len()
            )));
        }
        Ok(Self {
            extent,
            texels: texels.into(),
        })
    }

    /// Build from straight (non-premultiplied) RGBA8 bytes.
    pub fn from_rgba8(extent: Extent, bytes: &[u8]) -> LifResult<Self> {
        if bytes.len() != extent.pixel_count() * 4 {
            return Err(LifError::validation(format!(
                "rgba8 buffer expects {} bytes for {}x{}, got {}",
                extent.pixel_count() * 4,
                extent.width,
                extent.height,
                bytes.len()
            )));
        }
        let texels = bytes
            .chunks_exact(4)
            .map(|px| {
                Vec4::new(
                    f32::from(px[0]),
                    f32::from(px[1]),
                    f32::from(px[2]),
                    f32::from(px[3]),
                ) / 255.0
            })
            .collect();
        Self::from_texels(extent, texels)
    }

    pub fn solid(extent: Extent, color: Vec4) -> Self {
        Self {
            extent,
            texels: vec![color; extent.pixel_count()].into(),
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    /// Fetch one texel by integer coordinates (row 0 at top), clamped to the edge.
    pub fn fetch(&self, x: i64, y: i64) -> Vec4 {
        let w = i64::from(self.extent.width);
        let h = i64::from(self.extent.height);
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        self.texels[y * (w as usize) + x]
    }

    /// Bilinear sample at `uv`.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let size = self.extent.as_vec2();
        let px = uv.x * size.x - 0.5;
        let py = (1.0 - uv.y) * size.y - 0.5;
        if !px.is_finite() || !py.is_finite() {
            return Vec4::ZERO;
        }

        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.fetch(x0, y0).lerp(self.fetch(x0 + 1, y0), tx);
        let bottom = self.fetch(x0, y0 + 1).lerp(self.fetch(x0 + 1, y0 + 1), tx);
        top.lerp(bottom, ty)
    }

    /// Bilinear sample with `uv` pulled at least `margin` texels away from every edge.
    pub fn sample_inset(&self, uv: Vec2, margin: f32) -> Vec4 {
        self.sample(self.inset_uv(uv, margin))
    }

    pub(crate) fn inset_uv(&self, uv: Vec2, margin: f32) -> Vec2 {
        let m = Vec2::splat(margin) / self.extent.as_vec2();
        // Textures narrower than twice the margin collapse to their center.
        let lo = m.min(Vec2::splat(0.5));
        let hi = (Vec2::ONE - m).max(Vec2::splat(0.5));
        uv.clamp(lo, hi)
    }

    /// One texel in uv units.
    pub fn texel_size(&self) -> Vec2 {
        Vec2::ONE / self.extent.as_vec2()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/texture.rs"]
mod tests;
