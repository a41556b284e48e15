pub mod composite;
pub mod kernel;
pub mod stereo;

pub use composite::{Accum, composite_front_to_back};
pub use kernel::{
    DEFAULT_FEATHER, Homography, KernelCamera, LayerSource, RAYCAST_ITERATIONS, RaySample,
    raycast, raycast_views, taper,
};
pub use stereo::{StereoThresholds, blend, blend_views, reconcile, stereo_weight};
