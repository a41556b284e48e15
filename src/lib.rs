#![forbid(unsafe_code)]
//! Raycast reconstruction of layered light field images.
//!
//! A LIF holds one or two captured views, each with up to four RGB + inverse-depth layers.
//! `lifcast` re-renders such a file from a new viewpoint: every output pixel marches the
//! observer ray through each layer's depth surface, layers are composited nearest first and
//! stereo files blend their two views by where the observer stands between them.
//!
//! ```no_run
//! use lifcast::{BackendKind, Extent, ObserverCamera, Pose, RenderSettings};
//!
//! # fn main() -> lifcast::LifResult<()> {
//! let lif = lifcast::load_lif("capture/lif.json")?;
//! let settings = RenderSettings::default();
//! let camera = ObserverCamera::perspective(Pose::IDENTITY, 1.0, Extent::new(640, 480)?)?;
//! let mut backend = lifcast::create_backend(BackendKind::Cpu, &settings)?;
//! let frame = lifcast::render_frame(&lif, &camera, backend.as_mut(), &settings)?;
//! frame.save_png(std::path::Path::new("out.png"))?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod camera;
pub mod codec;
mod foundation;
pub mod pose;
pub mod raycast;
pub mod render;
pub mod scene;

pub use assets::{
    LifProjector, PreparedLayer, PreparedLif, PreparedView, Texture, ViewFault, load_lif,
};
pub use camera::{ObserverCamera, StereoRig, orbit_path};
pub use codec::{DepthMaskTexture, InvDepthRange};
pub use foundation::{
    core::{Affine3A, Extent, Mat3, Mat4, Pose, Quat, Rgba8Premul, Vec2, Vec3, Vec4},
    error::{LifError, LifResult},
};
pub use pose::{
    AxisConvention, ConvergenceDepth, KernelPose, RelativePose, SourceOrientation,
    StereoMetadata, observer_local, observer_local_affine, observer_local_mat3,
};
pub use raycast::{
    Accum, Homography, KernelCamera, LayerSource, RaySample, StereoThresholds,
    composite_front_to_back, stereo_weight, taper,
};
pub use render::{
    BackendKind, FrameRGBA, RenderBackend, RenderSettings, THREADS_ENV, create_backend,
    cpu::CpuBackend,
    pipeline::{RenderThreading, render_frame, render_frames, render_path, render_stereo_pair},
    uniforms::FrameUniforms,
};
#[cfg(feature = "gpu")]
pub use render::gpu::GpuBackend;
pub use scene::{LayerManifest, LifManifest, RotationManifest, ViewManifest};
