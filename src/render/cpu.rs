use rayon::prelude::*;

use crate::{
    foundation::{core::Rgba8Premul, error::LifResult},
    render::{
        FrameRGBA, RenderBackend, RenderSettings, pipeline::build_thread_pool,
        uniforms::FrameUniforms,
    },
};

/// Shades frames on the CPU, one rayon task per output row.
pub struct CpuBackend {
    settings: RenderSettings,
    pool: Option<rayon::ThreadPool>,
}

impl CpuBackend {
    /// A dedicated pool is built only when `settings.threads` is set; otherwise rows run on
    /// whatever rayon pool the caller is in.
    pub fn new(settings: RenderSettings) -> LifResult<Self> {
        settings.validate()?;
        let pool = settings
            .threads
            .map(|n| build_thread_pool(Some(n)))
            .transpose()?;
        Ok(Self { settings, pool })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(width = frame.extent.width, height = frame.extent.height)
    )]
    fn render(&mut self, frame: &FrameUniforms<'_>) -> LifResult<FrameRGBA> {
        let row_bytes = frame.extent.width as usize * 4;
        let mut data = vec![0u8; frame.extent.pixel_count() * 4];

        let shade_rows = |data: &mut [u8]| {
            data.par_chunks_mut(row_bytes)
                .enumerate()
                .for_each(|(y, row)| shade_row(frame, y as u32, row));
        };
        match &self.pool {
            Some(pool) => pool.install(|| shade_rows(&mut data)),
            None => shade_rows(&mut data),
        }

        Ok(FrameRGBA {
            width: frame.extent.width,
            height: frame.extent.height,
            data,
            premultiplied: true,
        })
    }

    fn worker_render_settings(&self) -> Option<RenderSettings> {
        // Frame-parallel workers already run inside a pool; they must not build their own.
        Some(RenderSettings {
            threads: None,
            ..self.settings.clone()
        })
    }
}

fn shade_row(frame: &FrameUniforms<'_>, y: u32, row: &mut [u8]) {
    for (x, px) in row.chunks_exact_mut(4).enumerate() {
        let rgba = Rgba8Premul::from_unit_premul(frame.shade_pixel(x as u32, y));
        px.copy_from_slice(&rgba.to_array());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
