pub mod manifest;

pub use manifest::{
    LayerManifest, LifManifest, MAX_LAYERS, MAX_VIEWS, RotationManifest, ViewManifest,
};
