//! Per-frame uniform preparation.
//!
//! Everything the kernel needs that depends on the observer is computed here, once per
//! frame and before any pixel is shaded: the observer-local pose of every source view, the
//! kernel cameras, the per-layer homographies and the stereo weight. Shading is then a pure
//! function of `(uv, FrameUniforms)`.

use smallvec::SmallVec;

use crate::{
    assets::{LifProjector, PreparedLayer},
    camera::ObserverCamera,
    foundation::{
        core::{Extent, Vec2, Vec3, Vec4},
        error::LifResult,
    },
    pose::{KernelPose, observer_local_mat3},
    raycast::{
        Homography, KernelCamera, RaySample, StereoThresholds, blend_views,
        composite_front_to_back, raycast, stereo_weight,
    },
    render::RenderSettings,
    scene::{MAX_LAYERS, MAX_VIEWS},
};

#[derive(Clone, Debug)]
pub struct LayerUniforms<'a> {
    pub layer: &'a PreparedLayer,
    pub source: KernelCamera,
    /// `None` when the observer frame is degenerate; the layer then renders as background.
    pub homography: Option<Homography>,
}

impl LayerUniforms<'_> {
    pub fn sample(&self, uv: Vec2, feather: f32) -> RaySample {
        match &self.homography {
            Some(h) => raycast(uv, h, self.layer.source(), feather),
            None => RaySample::BACKGROUND,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewUniforms<'a> {
    pub view_index: usize,
    pub pose: KernelPose,
    pub layers: SmallVec<[LayerUniforms<'a>; MAX_LAYERS]>,
}

#[derive(Clone, Debug)]
pub struct FrameUniforms<'a> {
    pub extent: Extent,
    pub observer: ObserverCamera,
    pub observer_kernel: KernelCamera,
    pub views: SmallVec<[ViewUniforms<'a>; MAX_VIEWS]>,
    /// Blend weight toward the second view; 0 for mono.
    pub stereo_weight: f32,
    /// Straight RGBA.
    pub background: Vec4,
    pub feather: f32,
    pub thresholds: StereoThresholds,
}

impl<'a> FrameUniforms<'a> {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(width = camera.extent.width, height = camera.extent.height)
    )]
    pub fn prepare(
        projector: &'a LifProjector,
        camera: &ObserverCamera,
        settings: &RenderSettings,
    ) -> LifResult<Self> {
        settings.validate()?;
        let asset = projector.asset();
        let convention = asset.axis_convention();
        let observer_kernel = camera.kernel_camera();

        let views: SmallVec<[ViewUniforms<'a>; MAX_VIEWS]> = asset
            .views()
            .iter()
            .map(|view| {
                let rel = observer_local_mat3(
                    projector.view_position(view),
                    projector.view_rotation(view),
                    &camera.pose,
                );
                let pose = convention.to_kernel(&rel);
                let layers = view
                    .layers
                    .iter()
                    .map(|layer| {
                        let source = KernelCamera::source(layer.focal, view.skew, &pose);
                        LayerUniforms {
                            layer,
                            source,
                            homography: Homography::new(&source, &observer_kernel),
                        }
                    })
                    .collect();
                ViewUniforms {
                    view_index: view.index,
                    pose,
                    layers,
                }
            })
            .collect();

        let weight = match views.as_slice() {
            // The observer sits at the kernel-frame origin.
            [left, right] => stereo_weight(left.pose.position, right.pose.position, Vec3::ZERO),
            _ => 0.0,
        };

        tracing::debug!(
            views = views.len(),
            stereo_weight = weight,
            "prepared frame uniforms"
        );

        Ok(Self {
            extent: camera.extent,
            observer: *camera,
            observer_kernel,
            views,
            stereo_weight: weight,
            background: settings.background(),
            feather: settings.feather,
            thresholds: settings.stereo,
        })
    }

    pub fn layer_count(&self) -> usize {
        self.views.iter().map(|v| v.layers.len()).max().unwrap_or(0)
    }

    /// Reconstructed sample of layer `index`, blended across views when stereo.
    pub fn layer_sample(&self, index: usize, uv: Vec2) -> RaySample {
        match self.views.as_slice() {
            [view] => view
                .layers
                .get(index)
                .map_or(RaySample::BACKGROUND, |l| l.sample(uv, self.feather)),
            [left, right] => match (left.layers.get(index), right.layers.get(index)) {
                (Some(l), Some(r)) => blend_views(
                    l.sample(uv, self.feather),
                    r.sample(uv, self.feather),
                    self.stereo_weight,
                    &self.thresholds,
                ),
                (Some(only), None) | (None, Some(only)) => only.sample(uv, self.feather),
                (None, None) => RaySample::BACKGROUND,
            },
            _ => RaySample::BACKGROUND,
        }
    }

    /// Final premultiplied RGBA at `uv`.
    pub fn shade(&self, uv: Vec2) -> Vec4 {
        let layers = (0..self.layer_count()).map(|i| self.layer_sample(i, uv));
        composite_front_to_back(layers).over_background(self.background)
    }

    pub fn shade_pixel(&self, x: u32, y: u32) -> Vec4 {
        self.shade(self.observer.pixel_uv(x, y))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/uniforms.rs"]
mod tests;
