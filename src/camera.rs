pub mod observer;

pub use observer::{ObserverCamera, StereoRig, orbit_path};
