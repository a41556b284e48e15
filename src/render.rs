pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod pipeline;
pub mod uniforms;

use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::{
        core::Vec4,
        error::{LifError, LifResult},
        math::unpremultiply_rgba8,
    },
    raycast::{DEFAULT_FEATHER, StereoThresholds},
    render::uniforms::FrameUniforms,
};

/// Environment variable overriding [`RenderSettings::threads`].
pub const THREADS_ENV: &str = "LIFCAST_THREADS";

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA8 at `(x, y)`, row 0 at the top. `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixel data, as image files expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        self.data
            .chunks_exact(4)
            .flat_map(|px| unpremultiply_rgba8([px[0], px[1], px[2], px[3]]))
            .collect()
    }

    pub fn save_png(&self, path: &Path) -> LifResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.to_straight_rgba8(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Executes a prepared frame.
pub trait RenderBackend {
    fn render(&mut self, frame: &FrameUniforms<'_>) -> LifResult<FrameRGBA>;

    /// Settings for building per-thread copies of this backend, if it supports that.
    fn worker_render_settings(&self) -> Option<RenderSettings> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Straight RGBA composited behind every layer.
    pub background: [f32; 4],
    /// Edge feather width as a fraction of the source image.
    pub feather: f32,
    pub stereo: StereoThresholds,
    /// Worker threads for the CPU backend. `None` lets rayon decide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0, 1.0],
            feather: DEFAULT_FEATHER,
            stereo: StereoThresholds::default(),
            threads: None,
        }
    }
}

impl RenderSettings {
    pub fn background(&self) -> Vec4 {
        Vec4::from_array(self.background)
    }

    /// Apply `LIFCAST_THREADS` when it holds a positive integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var(THREADS_ENV)
            .ok()
            .and_then(|v| parse_threads(&v))
        {
            self.threads = Some(n);
        }
        self
    }

    pub fn validate(&self) -> LifResult<()> {
        if !self.background.iter().all(|c| c.is_finite() && (0.0..=1.0).contains(c)) {
            return Err(LifError::validation(
                "background channels must be finite and within [0, 1]",
            ));
        }
        if !self.feather.is_finite() || !(0.0..=0.5).contains(&self.feather) {
            return Err(LifError::validation("feather must be within [0, 0.5]"));
        }
        if !self.stereo.alpha_difference.is_finite() || self.stereo.alpha_difference < 0.0 {
            return Err(LifError::validation(
                "stereo alpha_difference must be finite and >= 0",
            ));
        }
        if self.threads == Some(0) {
            return Err(LifError::validation("threads must be >= 1 when set"));
        }
        Ok(())
    }
}

fn parse_threads(v: &str) -> Option<usize> {
    v.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
) -> LifResult<Box<dyn RenderBackend>> {
    settings.validate()?;
    match kind {
        BackendKind::Cpu => Ok(Box::new(cpu::CpuBackend::new(settings.clone())?)),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Ok(Box::new(gpu::GpuBackend::new(settings.clone())?)),
    }
}

#[cfg(test)]
#[path = "../tests/unit/render/settings.rs"]
mod tests;
