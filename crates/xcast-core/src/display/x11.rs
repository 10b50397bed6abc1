//! [`WindowSystem`] on top of x11rb's pure-Rust X11 connection.

use tracing::debug;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{self, AtomEnum, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;

use super::errors::DisplayError;
use super::traits::WindowSystem;
use super::types::{
    LocalGeometry, MapState, Screen, ScreenId, TitleProperty, TreeNode, WindowAttributes,
    WindowId,
};

/// An open connection to one X display.
pub struct X11Display {
    name: String,
    conn: RustConnection,
    net_wm_name: xproto::Atom,
}

impl std::fmt::Debug for X11Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Display")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl X11Display {
    /// Connect to the named display, e.g. `":0"`.
    ///
    /// A malformed name, a missing socket and a refused connection all
    /// come back as [`DisplayError::DisplayUnavailable`].
    pub fn open(name: &str) -> Result<Self, DisplayError> {
        let (conn, _default_screen) =
            x11rb::connect(Some(name)).map_err(|e| DisplayError::DisplayUnavailable {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        let mut display = Self {
            name: name.to_string(),
            conn,
            net_wm_name: x11rb::NONE,
        };
        display.net_wm_name = display.intern(TitleProperty::NetWmName.atom_name())?;

        let screen_count = display.conn.setup().roots.len();
        debug!(
            event = "core.display.open_completed",
            display = name,
            screens = screen_count
        );
        Ok(display)
    }

    fn intern(&self, atom_name: &str) -> Result<xproto::Atom, DisplayError> {
        let reply = self
            .conn
            .intern_atom(false, atom_name.as_bytes())
            .map_err(|e| self.lost(e))?
            .reply()
            .map_err(|e| match e {
                ReplyError::ConnectionError(e) => self.lost(e),
                ReplyError::X11Error(e) => DisplayError::ConnectionLost {
                    name: self.name.clone(),
                    message: format!("{:?}", e.error_kind),
                },
            })?;
        Ok(reply.atom)
    }

    fn lost(&self, error: ConnectionError) -> DisplayError {
        DisplayError::ConnectionLost {
            name: self.name.clone(),
            message: error.to_string(),
        }
    }

    /// Protocol errors on a window request mean the window no longer exists.
    fn reply_error(&self, window: WindowId, error: ReplyError) -> DisplayError {
        match error {
            ReplyError::X11Error(_) => DisplayError::WindowGone { id: window },
            ReplyError::ConnectionError(e) => self.lost(e),
        }
    }

    fn property_atom(&self, property: TitleProperty) -> xproto::Atom {
        match property {
            TitleProperty::NetWmName => self.net_wm_name,
            TitleProperty::WmName => AtomEnum::WM_NAME.into(),
        }
    }
}

impl WindowSystem for X11Display {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn screens(&self) -> Vec<Screen> {
        self.conn
            .setup()
            .roots
            .iter()
            .enumerate()
            .map(|(index, root)| Screen {
                id: ScreenId::new(&self.name, index),
                root: WindowId(root.root),
                width: root.width_in_pixels.into(),
                height: root.height_in_pixels.into(),
            })
            .collect()
    }

    fn query_tree(&self, window: WindowId) -> Result<TreeNode, DisplayError> {
        let reply = self
            .conn
            .query_tree(window.0)
            .map_err(|e| self.lost(e))?
            .reply()
            .map_err(|e| self.reply_error(window, e))?;

        Ok(TreeNode {
            parent: (reply.parent != x11rb::NONE).then_some(WindowId(reply.parent)),
            children: reply.children.into_iter().map(WindowId).collect(),
        })
    }

    fn attributes(&self, window: WindowId) -> Result<WindowAttributes, DisplayError> {
        let reply = self
            .conn
            .get_window_attributes(window.0)
            .map_err(|e| self.lost(e))?
            .reply()
            .map_err(|e| self.reply_error(window, e))?;

        let map_state = if reply.map_state == xproto::MapState::VIEWABLE {
            MapState::Viewable
        } else if reply.map_state == xproto::MapState::UNVIEWABLE {
            MapState::Unviewable
        } else {
            MapState::Unmapped
        };

        Ok(WindowAttributes { map_state })
    }

    fn local_geometry(&self, window: WindowId) -> Result<LocalGeometry, DisplayError> {
        let reply = self
            .conn
            .get_geometry(window.0)
            .map_err(|e| self.lost(e))?
            .reply()
            .map_err(|e| self.reply_error(window, e))?;

        Ok(LocalGeometry {
            x: reply.x.into(),
            y: reply.y.into(),
            width: reply.width.into(),
            height: reply.height.into(),
        })
    }

    fn title_property(
        &self,
        window: WindowId,
        property: TitleProperty,
    ) -> Result<Option<Vec<u8>>, DisplayError> {
        let reply = self
            .conn
            .get_property(
                false,
                window.0,
                self.property_atom(property),
                AtomEnum::ANY,
                0,
                u32::MAX,
            )
            .map_err(|e| self.lost(e))?
            .reply()
            .map_err(|e| self.reply_error(window, e))?;

        if reply.type_ == x11rb::NONE {
            return Ok(None);
        }
        Ok(Some(reply.value))
    }
}
