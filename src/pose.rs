pub mod convergence;
pub mod transform;

pub use convergence::{ConvergenceDepth, StereoMetadata};
pub use transform::{
    AxisConvention, KernelPose, RelativePose, SourceOrientation, observer_local,
    observer_local_affine, observer_local_mat3, roll_matrix, skew_matrix, slant_matrix,
};
