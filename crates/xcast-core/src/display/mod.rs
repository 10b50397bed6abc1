mod errors;
#[cfg(test)]
pub(crate) mod testing;
mod traits;
mod types;
pub mod x11;

pub use errors::DisplayError;
pub use traits::WindowSystem;
pub use types::{
    LocalGeometry, MapState, Screen, ScreenId, TitleProperty, TreeNode, Window, WindowAttributes,
    WindowId,
};
pub use x11::X11Display;
