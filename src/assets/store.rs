use std::{path::PathBuf, sync::Arc};

use crate::{
    assets::{decode, texture::Texture},
    codec::DepthMaskTexture,
    foundation::{
        core::{Mat3, Pose, Vec2, Vec3},
        error::{LifError, LifResult},
    },
    pose::{AxisConvention, ConvergenceDepth, SourceOrientation, StereoMetadata},
    raycast::LayerSource,
    render::RenderSettings,
    scene::{LifManifest, MAX_LAYERS, MAX_VIEWS, ViewManifest, manifest::resolve_source},
};

/// One decoded depth layer.
#[derive(Clone, Debug)]
pub struct PreparedLayer {
    /// Straight RGBA color.
    pub rgb: Texture,
    /// Packed inverse depth + mask.
    pub depth: DepthMaskTexture,
    /// Focal length normalized by the color image's width and height.
    pub focal: Vec2,
}

impl PreparedLayer {
    pub fn new(rgb: Texture, depth: DepthMaskTexture, focal_px: f32) -> LifResult<Self> {
        if !focal_px.is_finite() || focal_px <= 0.0 {
            return Err(LifError::validation("layer focal length must be finite and > 0"));
        }
        let focal = Vec2::splat(focal_px) / rgb.extent().as_vec2();
        Ok(Self { rgb, depth, focal })
    }

    pub fn source(&self) -> LayerSource<'_> {
        LayerSource {
            rgb: &self.rgb,
            depth: &self.depth,
        }
    }
}

/// One decoded source view.
#[derive(Clone, Debug)]
pub struct PreparedView {
    /// Index of the view in its manifest.
    pub index: usize,
    /// Position in the file's world frame.
    pub position: Vec3,
    pub orientation: SourceOrientation,
    /// Off-axis frustum skew as tangents.
    pub skew: Vec2,
    /// Nearest first.
    pub layers: Vec<PreparedLayer>,
}

impl PreparedView {
    /// Orientation in the file's world frame. Legacy slant/roll orientations are not
    /// orthonormal and stay a matrix all the way to the kernel.
    pub fn world_rotation(&self, convention: AxisConvention) -> Mat3 {
        self.orientation.resolve(convention)
    }
}

/// A view that could not be decoded. The rest of the file still renders without it.
#[derive(thiserror::Error, Debug)]
#[error("view {view_index} omitted: {error}")]
pub struct ViewFault {
    pub view_index: usize,
    #[source]
    pub error: LifError,
}

/// Immutable, fully decoded light field image.
///
/// Every texture is decoded before the first frame can reference it; views that fail are
/// recorded as [`ViewFault`]s and left out.
#[derive(Clone, Debug)]
pub struct PreparedLif {
    views: Vec<PreparedView>,
    faults: Arc<Vec<ViewFault>>,
    convergence: Option<ConvergenceDepth>,
    axis_convention: AxisConvention,
    settings: Option<RenderSettings>,
}

impl PreparedLif {
    /// Decode every layer referenced by `manifest`, resolving paths against `root`.
    ///
    /// Fails only if the manifest is invalid or no view survives decoding.
    #[tracing::instrument(skip(manifest, root), fields(views = manifest.views.len()))]
    pub fn prepare(manifest: &LifManifest, root: impl Into<PathBuf>) -> LifResult<Self> {
        manifest.validate()?;
        let root = root.into();

        let mut views = Vec::with_capacity(manifest.views.len());
        let mut faults = Vec::new();
        for (index, view) in manifest.views.iter().enumerate() {
            match prepare_view(index, view, &root) {
                Ok(v) => views.push(v),
                Err(error) => {
                    tracing::warn!(view = index, %error, "view failed to load; omitting it");
                    faults.push(ViewFault {
                        view_index: index,
                        error,
                    });
                }
            }
        }
        if views.is_empty() {
            return Err(match faults.into_iter().next() {
                Some(fault) => fault.error,
                None => LifError::validation("manifest has no views"),
            });
        }

        let mut out = Self::from_views(views, manifest.stereo, manifest.axis_convention)?;
        out.faults = Arc::new(faults);
        out.settings = manifest.settings.clone();
        tracing::debug!(
            views = out.views.len(),
            faults = out.faults.len(),
            convergence = ?out.convergence.map(ConvergenceDepth::meters),
            "prepared lif"
        );
        Ok(out)
    }

    /// Assemble from already decoded views.
    pub fn from_views(
        views: Vec<PreparedView>,
        stereo: Option<StereoMetadata>,
        axis_convention: AxisConvention,
    ) -> LifResult<Self> {
        if views.is_empty() || views.len() > MAX_VIEWS {
            return Err(LifError::validation(format!(
                "a LIF needs 1..={MAX_VIEWS} views, got {}",
                views.len()
            )));
        }
        if let Some(v) = views
            .iter()
            .find(|v| v.layers.is_empty() || v.layers.len() > MAX_LAYERS)
        {
            return Err(LifError::validation(format!(
                "view {} needs 1..={MAX_LAYERS} layers, got {}",
                v.index,
                v.layers.len()
            )));
        }

        let skews = match views.as_slice() {
            [l, r] => Some((l.skew, r.skew)),
            _ => None,
        };
        let convergence = stereo.and_then(|meta| ConvergenceDepth::derive(&meta, skews));

        Ok(Self {
            views,
            faults: Arc::new(Vec::new()),
            convergence,
            axis_convention,
            settings: None,
        })
    }

    pub fn views(&self) -> &[PreparedView] {
        &self.views
    }

    pub fn faults(&self) -> &[ViewFault] {
        &self.faults
    }

    pub fn is_stereo(&self) -> bool {
        self.views.len() == 2
    }

    pub fn convergence(&self) -> Option<ConvergenceDepth> {
        self.convergence
    }

    pub fn axis_convention(&self) -> AxisConvention {
        self.axis_convention
    }

    /// Render defaults carried by the manifest, if any.
    pub fn settings(&self) -> Option<&RenderSettings> {
        self.settings.as_ref()
    }
}

fn prepare_view(index: usize, view: &ViewManifest, root: &std::path::Path) -> LifResult<PreparedView> {
    let orientation = view.rotation.to_orientation()?;
    let mut layers = Vec::with_capacity(view.layers.len());
    let mut skew = None;

    for layer in &view.layers {
        let rgb = decode::decode_rgb(&decode::read_bytes(&resolve_source(root, &layer.image))?)?;
        let mask_bytes = layer
            .mask
            .as_deref()
            .map(|m| decode::read_bytes(&resolve_source(root, m)))
            .transpose()?;
        let depth = decode::decode_depth_mask(
            &decode::read_bytes(&resolve_source(root, &layer.depth))?,
            mask_bytes.as_deref(),
            layer.range()?,
        )?;

        // The view's principal point refers to its first (full-frame) layer.
        let extent = rgb.extent();
        skew.get_or_insert_with(|| view.skew(extent.width, extent.height));

        layers.push(PreparedLayer::new(
            rgb,
            depth,
            layer.focal_px.unwrap_or(view.focal_px),
        )?);
    }

    Ok(PreparedView {
        index,
        position: view.position(),
        orientation,
        skew: skew.unwrap_or(Vec2::ZERO),
        layers,
    })
}

/// Handle to a loaded LIF placed in a scene.
///
/// This is what a host registers for rendering: the decoded asset plus where its world frame
/// sits in the scene.
#[derive(Clone, Debug)]
pub struct LifProjector {
    asset: Arc<PreparedLif>,
    placement: Pose,
}

impl LifProjector {
    pub fn new(asset: PreparedLif) -> Self {
        Self {
            asset: Arc::new(asset),
            placement: Pose::IDENTITY,
        }
    }

    pub fn with_placement(self, placement: Pose) -> Self {
        Self { placement, ..self }
    }

    pub fn asset(&self) -> &PreparedLif {
        &self.asset
    }

    pub fn placement(&self) -> Pose {
        self.placement
    }

    pub fn convergence(&self) -> Option<ConvergenceDepth> {
        self.asset.convergence()
    }

    /// Scene position of a view: placement applied to the view's position.
    pub fn view_position(&self, view: &PreparedView) -> Vec3 {
        self.placement.position + self.placement.rotation * view.position
    }

    /// Scene orientation of a view: placement rotation times the view's world rotation.
    pub fn view_rotation(&self, view: &PreparedView) -> Mat3 {
        Mat3::from_quat(self.placement.rotation) * view.world_rotation(self.asset.axis_convention())
    }
}

/// Read a manifest, decode its layers relative to the manifest's directory and return a
/// projector handle at the scene origin.
pub fn load_lif(manifest_path: impl AsRef<std::path::Path>) -> LifResult<LifProjector> {
    let path = manifest_path.as_ref();
    let manifest = LifManifest::from_path(path)?;
    let root = path
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();
    Ok(LifProjector::new(PreparedLif::prepare(&manifest, root)?))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
