pub mod decode;
pub mod store;
pub mod texture;

pub use store::{LifProjector, PreparedLayer, PreparedLif, PreparedView, ViewFault, load_lif};
pub use texture::Texture;
