pub mod depth;

pub use depth::{
    DEPTH_EDGE_MARGIN_TEXELS, DepthMaskTexture, InvDepthRange, MASK_DILATION_TEXELS,
    MASK_THRESHOLD,
};
