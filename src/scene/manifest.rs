use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    codec::InvDepthRange,
    foundation::{
        core::{Mat3, Quat, Vec2, Vec3},
        error::{LifError, LifResult},
    },
    pose::{AxisConvention, SourceOrientation, StereoMetadata},
    render::RenderSettings,
};

/// Hard cap on source views per file.
pub const MAX_VIEWS: usize = 2;
/// Hard cap on depth layers per view.
pub const MAX_LAYERS: usize = 4;

/// A decoded light field image: per-view intrinsics and pose plus per-layer image paths.
///
/// Image paths are relative to the directory holding the manifest.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LifManifest {
    /// Stereo capture metadata. Required for a convergence depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereo: Option<StereoMetadata>,
    /// Axis convention of view poses.
    #[serde(default)]
    pub axis_convention: AxisConvention,
    /// One (mono) or two (stereo) source views.
    pub views: Vec<ViewManifest>,
    /// Render defaults shipped with the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<RenderSettings>,
}

/// One captured camera.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ViewManifest {
    /// Position in the file's world frame.
    pub position: [f32; 3],
    /// Orientation in the file's world frame.
    #[serde(default)]
    pub rotation: RotationManifest,
    /// Focal length in pixels of the view's RGB image.
    pub focal_px: f32,
    /// Principal point in pixels, origin top-left. Converted to a frustum skew at load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_point_px: Option<[f32; 2]>,
    /// Off-axis offset as tangents. Takes priority over `principal_point_px`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frustum_skew: Option<[f32; 2]>,
    /// Depth layers, nearest first.
    pub layers: Vec<LayerManifest>,
}

/// Stored orientation encodings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationManifest {
    /// Legacy slant tangents and roll angle.
    Legacy { slant: [f32; 2], roll_deg: f32 },
    /// Column-major 3×3 rotation. A (near) zero matrix falls back to legacy zeros.
    Matrix([[f32; 3]; 3]),
    /// Unit quaternion `[x, y, z, w]`.
    Quaternion([f32; 4]),
}

impl Default for RotationManifest {
    fn default() -> Self {
        Self::Quaternion([0.0, 0.0, 0.0, 1.0])
    }
}

impl RotationManifest {
    pub fn to_orientation(&self) -> LifResult<SourceOrientation> {
        match self {
            Self::Legacy { slant, roll_deg } => {
                if !slant.iter().all(|v| v.is_finite()) || !roll_deg.is_finite() {
                    return Err(LifError::validation("legacy rotation must be finite"));
                }
                Ok(SourceOrientation::LegacySlantRoll {
                    slant: Vec2::from_array(*slant),
                    roll_deg: *roll_deg,
                })
            }
            Self::Matrix(cols) => {
                let m = Mat3::from_cols_array_2d(cols);
                if !m.is_finite() {
                    return Err(LifError::validation("rotation matrix must be finite"));
                }
                let orientation = SourceOrientation::from_uniform(m, Vec2::ZERO, 0.0);
                if matches!(orientation, SourceOrientation::RotationMatrix(_))
                    && !is_rotation(m)
                {
                    return Err(LifError::validation(
                        "rotation matrix must be orthonormal with determinant 1",
                    ));
                }
                Ok(orientation)
            }
            Self::Quaternion(xyzw) => {
                let q = Quat::from_array(*xyzw);
                if !q.is_finite() || q.length_squared() <= f32::EPSILON {
                    return Err(LifError::validation(
                        "rotation quaternion must be finite and non-zero",
                    ));
                }
                Ok(SourceOrientation::RotationMatrix(Mat3::from_quat(
                    q.normalize(),
                )))
            }
        }
    }
}

/// One depth layer of a view.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerManifest {
    /// RGB(A) image.
    pub image: String,
    /// Inverse depth, normalized to [0, 1] in the red channel. Alpha, if any, is the mask.
    pub depth: String,
    /// Separate validity mask (red channel, 1 = valid). Overrides depth alpha.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    /// Inverse depth of the nearest point (red = 1).
    pub inv_z_min: f32,
    /// Inverse depth of the furthest point (red = 0).
    pub inv_z_max: f32,
    /// Focal length for outpainted layers whose resolution differs from the view's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_px: Option<f32>,
}

impl LayerManifest {
    pub fn range(&self) -> LifResult<InvDepthRange> {
        InvDepthRange::new(self.inv_z_min, self.inv_z_max)
    }
}

impl ViewManifest {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Frustum skew for an RGB image of `width`×`height` pixels.
    pub fn skew(&self, width: u32, height: u32) -> Vec2 {
        if let Some(skew) = self.frustum_skew {
            return Vec2::from_array(skew);
        }
        match self.principal_point_px {
            // Image rows grow downwards; the kernel's y axis points up.
            Some([px, py]) => Vec2::new(
                (0.5 * width as f32 - px) / self.focal_px,
                (py - 0.5 * height as f32) / self.focal_px,
            ),
            None => Vec2::ZERO,
        }
    }
}

impl LifManifest {
    /// Parse from a JSON string and validate.
    pub fn from_json_str(json: &str) -> LifResult<Self> {
        let manifest: Self =
            serde_json::from_str(json).map_err(|e| LifError::serde(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read, parse and validate a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> LifResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> LifResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LifError::serde(e.to_string()))
    }

    pub fn is_stereo(&self) -> bool {
        self.views.len() == 2
    }

    pub fn validate(&self) -> LifResult<()> {
        if self.views.is_empty() || self.views.len() > MAX_VIEWS {
            return Err(LifError::validation(format!(
                "a LIF needs 1..={MAX_VIEWS} views, got {}",
                self.views.len()
            )));
        }
        if let Some(stereo) = &self.stereo
            && (!stereo.baseline_m.is_finite() || stereo.baseline_m < 0.0)
        {
            return Err(LifError::validation(
                "stereo baseline_m must be finite and >= 0",
            ));
        }

        for (vi, view) in self.views.iter().enumerate() {
            if view.layers.is_empty() || view.layers.len() > MAX_LAYERS {
                return Err(LifError::validation(format!(
                    "view {vi} needs 1..={MAX_LAYERS} layers, got {}",
                    view.layers.len()
                )));
            }
            if !view.position.iter().all(|v| v.is_finite()) {
                return Err(LifError::validation(format!(
                    "view {vi} position must be finite"
                )));
            }
            validate_focal(view.focal_px, &format!("view {vi} focal_px"))?;
            for (name, value) in [
                ("frustum_skew", view.frustum_skew),
                ("principal_point_px", view.principal_point_px),
            ] {
                if let Some(v) = value
                    && !v.iter().all(|c| c.is_finite())
                {
                    return Err(LifError::validation(format!(
                        "view {vi} {name} must be finite"
                    )));
                }
            }
            view.rotation.to_orientation()?;

            for (li, layer) in view.layers.iter().enumerate() {
                let field = |f: &str| format!("view {vi} layer {li} {f}");
                validate_rel_source(&layer.image, &field("image"))?;
                validate_rel_source(&layer.depth, &field("depth"))?;
                if let Some(mask) = &layer.mask {
                    validate_rel_source(mask, &field("mask"))?;
                }
                if let Some(f) = layer.focal_px {
                    validate_focal(f, &field("focal_px"))?;
                }
                layer
                    .range()
                    .map_err(|e| LifError::validation(format!("{}: {e}", field("range"))))?;
            }
        }
        Ok(())
    }
}

const ROTATION_TOLERANCE: f32 = 1e-3;

fn is_rotation(m: Mat3) -> bool {
    (m * m.transpose()).abs_diff_eq(Mat3::IDENTITY, ROTATION_TOLERANCE)
        && (m.determinant() - 1.0).abs() <= ROTATION_TOLERANCE
}

fn validate_focal(value: f32, field: &str) -> LifResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LifError::validation(format!(
            "{field} must be finite and > 0"
        )));
    }
    Ok(())
}

fn validate_rel_source(source: &str, field: &str) -> LifResult<()> {
    if source.trim().is_empty() {
        return Err(LifError::validation(format!("{field} must be non-empty")));
    }
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(LifError::validation(format!(
            "{field} must be a relative path"
        )));
    }
    if s.split('/').any(|part| part == "..") {
        return Err(LifError::validation(format!(
            "{field} must not contain '..'"
        )));
    }
    Ok(())
}

/// Resolve a validated manifest-relative path against `root`.
pub fn resolve_source(root: &Path, source: &str) -> PathBuf {
    source
        .replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/manifest.rs"]
mod tests;
