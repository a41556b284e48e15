use rayon::prelude::*;

use crate::{
    assets::LifProjector,
    camera::{ObserverCamera, StereoRig},
    foundation::{
        core::{Extent, Pose},
        error::{LifError, LifResult},
    },
    render::{FrameRGBA, RenderBackend, RenderSettings, cpu::CpuBackend, uniforms::FrameUniforms},
};

/// Prepare uniforms for `camera` and render one frame.
///
/// This is the primary "one-shot" API for producing pixels from a [`LifProjector`].
///
/// Pipeline:
/// 1. [`FrameUniforms::prepare`] (pose transform, homographies, stereo weight)
/// 2. [`RenderBackend::render`]
///
/// Returns a [`FrameRGBA`] containing **premultiplied** RGBA8 pixels.
pub fn render_frame(
    projector: &LifProjector,
    camera: &ObserverCamera,
    backend: &mut dyn RenderBackend,
    settings: &RenderSettings,
) -> LifResult<FrameRGBA> {
    let uniforms = FrameUniforms::prepare(projector, camera, settings)?;
    backend.render(&uniforms)
}

#[derive(Clone, Debug, Default)]
pub struct RenderThreading {
    /// Render whole frames concurrently on per-thread CPU backends.
    pub parallel: bool,
    pub threads: Option<usize>,
}

/// Render one frame per camera, in order.
pub fn render_frames(
    projector: &LifProjector,
    cameras: &[ObserverCamera],
    backend: &mut dyn RenderBackend,
    settings: &RenderSettings,
    threading: &RenderThreading,
) -> LifResult<Vec<FrameRGBA>> {
    if cameras.is_empty() {
        return Err(LifError::validation("render needs at least one camera"));
    }

    if !threading.parallel {
        return cameras
            .iter()
            .map(|camera| render_frame(projector, camera, &mut *backend, settings))
            .collect();
    }

    let worker_settings = backend.worker_render_settings().ok_or_else(|| {
        LifError::render("parallel render requires backend worker settings support (CpuBackend)")
    })?;
    let pool = build_thread_pool(threading.threads)?;

    let rendered = pool.install(|| {
        cameras
            .par_iter()
            .map_init(
                || CpuBackend::new(worker_settings.clone()),
                |worker, camera| -> LifResult<FrameRGBA> {
                    let worker = worker
                        .as_mut()
                        .map_err(|e| LifError::render(format!("worker backend: {e}")))?;
                    render_frame(projector, camera, worker, settings)
                },
            )
            .collect::<Vec<_>>()
    });
    rendered.into_iter().collect()
}

/// Render `camera` from each pose in `poses`, keeping its intrinsics.
pub fn render_path(
    projector: &LifProjector,
    camera: &ObserverCamera,
    poses: &[Pose],
    backend: &mut dyn RenderBackend,
    settings: &RenderSettings,
    threading: &RenderThreading,
) -> LifResult<Vec<FrameRGBA>> {
    let cameras: Vec<ObserverCamera> = poses.iter().map(|&p| camera.with_pose(p)).collect();
    render_frames(projector, &cameras, backend, settings, threading)
}

/// Left and right eye frames for a head pose.
pub fn render_stereo_pair(
    projector: &LifProjector,
    rig: &StereoRig,
    head: &Pose,
    extent: Extent,
    backend: &mut dyn RenderBackend,
    settings: &RenderSettings,
) -> LifResult<[FrameRGBA; 2]> {
    let [left, right] = rig.eye_cameras(head, extent)?;
    Ok([
        render_frame(projector, &left, backend, settings)?,
        render_frame(projector, &right, backend, settings)?,
    ])
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> LifResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LifError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LifError::render(format!("failed to build rayon thread pool: {e}")))
}
