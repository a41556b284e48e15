use crate::foundation::core::{Vec3, Vec4};

use super::kernel::RaySample;

/// Premultiplied running result of the front-to-back "over".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Accum {
    pub color: Vec3,
    pub alpha: f32,
}

impl Accum {
    pub const EMPTY: Self = Self {
        color: Vec3::ZERO,
        alpha: 0.0,
    };

    /// Place `sample` behind everything accumulated so far.
    pub fn under(&mut self, sample: &RaySample) {
        let a = sample.alpha.clamp(0.0, 1.0);
        self.color += (1.0 - self.alpha) * a * sample.color;
        self.alpha = a + self.alpha * (1.0 - a);
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    /// Finish over a straight-alpha background. Returns premultiplied RGBA.
    pub fn over_background(self, background: Vec4) -> Vec4 {
        let bg_alpha = background.w.clamp(0.0, 1.0);
        let color = self.color + (1.0 - self.alpha) * bg_alpha * background.truncate();
        let alpha = bg_alpha + self.alpha * (1.0 - bg_alpha);
        color.extend(alpha)
    }
}

/// Composite layers in the order given, which must be nearest first.
///
/// Layers are pulled lazily; nothing past the first fully opaque accumulation is evaluated.
pub fn composite_front_to_back<I>(layers: I) -> Accum
where
    I: IntoIterator<Item = RaySample>,
{
    let mut acc = Accum::EMPTY;
    for sample in layers {
        acc.under(&sample);
        if acc.is_opaque() {
            break;
        }
    }
    acc
}

#[cfg(test)]
#[path = "../../tests/unit/raycast/composite.rs"]
mod tests;
