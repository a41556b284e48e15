use anyhow::Context;

use crate::{
    assets::texture::Texture,
    codec::{DepthMaskTexture, InvDepthRange},
    foundation::{
        core::{Extent, Vec4},
        error::{LifError, LifResult},
    },
};

struct DecodedPlane {
    extent: Extent,
    has_alpha: bool,
    texels: Vec<Vec4>,
}

fn decode_plane(bytes: &[u8], what: &str) -> LifResult<DecodedPlane> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| LifError::decode(format!("{what}: {e}")))?;
    let has_alpha = img.color().has_alpha();
    let rgba = img.to_rgba32f();
    let (width, height) = rgba.dimensions();
    let extent = Extent::new(width, height)?;
    let texels = rgba.pixels().map(|p| Vec4::from_array(p.0)).collect();
    Ok(DecodedPlane {
        extent,
        has_alpha,
        texels,
    })
}

/// Decode a layer's color image. Colors stay straight (not premultiplied).
pub fn decode_rgb(bytes: &[u8]) -> LifResult<Texture> {
    let plane = decode_plane(bytes, "decode layer image")?;
    Texture::from_texels(plane.extent, plane.texels)
}

/// Decode a depth image (normalized inverse depth in red) and pack it with its mask.
///
/// The mask comes from `mask_bytes` (red channel) when given, else from the depth image's
/// own alpha channel, else every texel is valid.
pub fn decode_depth_mask(
    depth_bytes: &[u8],
    mask_bytes: Option<&[u8]>,
    range: InvDepthRange,
) -> LifResult<DepthMaskTexture> {
    let depth = decode_plane(depth_bytes, "decode depth image")?;
    let red: Vec<f32> = depth.texels.iter().map(|t| t.x).collect();

    let mask: Option<Vec<f32>> = match mask_bytes {
        Some(bytes) => {
            let mask = decode_plane(bytes, "decode mask image")?;
            if mask.extent != depth.extent {
                return Err(LifError::decode(format!(
                    "mask is {}x{} but depth is {}x{}",
                    mask.extent.width,
                    mask.extent.height,
                    depth.extent.width,
                    depth.extent.height
                )));
            }
            Some(mask.texels.iter().map(|t| t.x).collect())
        }
        None if depth.has_alpha => Some(depth.texels.iter().map(|t| t.w).collect()),
        None => None,
    };

    DepthMaskTexture::pack(depth.extent, &red, mask.as_deref(), range)
}

pub(crate) fn read_bytes(path: &std::path::Path) -> LifResult<Vec<u8>> {
    std::fs::read(path)
        .with_context(|| format!("read layer bytes from '{}'", path.display()))
        .map_err(LifError::from)
}
