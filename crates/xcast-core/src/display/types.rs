use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol-level window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::str::FromStr for WindowId {
    type Err = std::num::ParseIntError;

    /// Accepts decimal (`27262983`) or hex (`0x1a00007`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).map(WindowId),
            None => s.parse().map(WindowId),
        }
    }
}

/// Full screen identifier: display name plus screen index, e.g. `":0.0"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(String);

impl ScreenId {
    pub fn new(display: &str, screen_index: usize) -> Self {
        Self(format!("{}.{}", display, screen_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The display part, e.g. `":0"` for `":0.1"`.
    pub fn display_name(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((display, index)) if index.chars().all(|c| c.is_ascii_digit()) => display,
            _ => &self.0,
        }
    }
}

impl From<&str> for ScreenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One capturable display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub id: ScreenId,
    pub root: WindowId,
    pub width: u32,
    pub height: u32,
}

/// Geometry relative to the parent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapState {
    Unmapped,
    /// Mapped, but an ancestor is unmapped.
    Unviewable,
    Viewable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub map_state: MapState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub parent: Option<WindowId>,
    pub children: Vec<WindowId>,
}

/// Window title properties, in lookup preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleProperty {
    /// `_NET_WM_NAME` (EWMH, UTF-8)
    NetWmName,
    /// `WM_NAME` (ICCCM)
    WmName,
}

impl TitleProperty {
    pub const PREFERENCE: [TitleProperty; 2] = [TitleProperty::NetWmName, TitleProperty::WmName];

    pub fn atom_name(&self) -> &'static str {
        match self {
            TitleProperty::NetWmName => "_NET_WM_NAME",
            TitleProperty::WmName => "WM_NAME",
        }
    }
}

/// A window snapshot from one discovery pass.
///
/// Never updated in place; rediscovery produces new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    pub parent: Option<WindowId>,
    pub title: Option<String>,
    pub map_state: MapState,
    pub local: LocalGeometry,
    /// Owning screen, for lookup only.
    pub screen: ScreenId,
}

impl Window {
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_id_parse_hex_and_decimal() {
        assert_eq!("0x1a00007".parse::<WindowId>().unwrap(), WindowId(0x1a00007));
        assert_eq!("27262983".parse::<WindowId>().unwrap(), WindowId(27262983));
        assert!("window".parse::<WindowId>().is_err());
    }

    #[test]
    fn test_window_id_display_is_hex() {
        assert_eq!(WindowId(255).to_string(), "0xff");
    }

    #[test]
    fn test_screen_id_display_name() {
        let id = ScreenId::new(":1", 2);
        assert_eq!(id.as_str(), ":1.2");
        assert_eq!(id.display_name(), ":1");
        assert_eq!(ScreenId::from(":0").display_name(), ":0");
    }

    #[test]
    fn test_map_state_serializes_lowercase() {
        let json = serde_json::to_string(&MapState::Viewable).unwrap();
        assert_eq!(json, "\"viewable\"");
    }
}
