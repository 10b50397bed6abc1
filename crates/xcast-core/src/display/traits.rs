use super::errors::DisplayError;
use super::types::{LocalGeometry, Screen, TitleProperty, TreeNode, WindowAttributes, WindowId};

/// Read-only access to one display connection's window hierarchy.
///
/// Every method queries the live server; nothing is cached, so results from
/// separate calls may disagree if windows change in between. Implementations
/// must report a window destroyed mid-query as [`DisplayError::WindowGone`].
pub trait WindowSystem: Send + Sync {
    /// Name of the display this connection belongs to, e.g. `":0"`.
    fn display_name(&self) -> &str;

    /// Screens served by this display.
    fn screens(&self) -> Vec<Screen>;

    /// Parent and children of `window`. The root has no parent.
    fn query_tree(&self, window: WindowId) -> Result<TreeNode, DisplayError>;

    fn attributes(&self, window: WindowId) -> Result<WindowAttributes, DisplayError>;

    /// Position relative to the parent, and size.
    fn local_geometry(&self, window: WindowId) -> Result<LocalGeometry, DisplayError>;

    /// Raw bytes of a title property, `None` if the window does not set it.
    fn title_property(
        &self,
        window: WindowId,
        property: TitleProperty,
    ) -> Result<Option<Vec<u8>>, DisplayError>;
}
