mod handler;
mod types;

pub use handler::{absolute_geometry, clip_to_root};
pub use types::AbsoluteGeometry;
