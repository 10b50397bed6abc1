use serde::{Deserialize, Serialize};

use crate::display::Window;
use crate::geometry::AbsoluteGeometry;

/// Exclusion rules applied to every visited window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFilter {
    /// A window is dropped only when both clipped dimensions are below this.
    pub min_size: u32,
}

impl WindowFilter {
    pub const DEFAULT_MIN_SIZE: u32 = 64;

    pub fn new(min_size: u32) -> Self {
        Self { min_size }
    }

    /// Large in one dimension is enough.
    pub fn is_large_enough(&self, geometry: &AbsoluteGeometry) -> bool {
        geometry.width >= self.min_size || geometry.height >= self.min_size
    }
}

impl Default for WindowFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_SIZE)
    }
}

/// A window that passed every filter, with its resolved on-screen rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub window: Window,
    pub geometry: AbsoluteGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(width: u32, height: u32) -> AbsoluteGeometry {
        AbsoluteGeometry {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_filter_needs_only_one_large_dimension() {
        let filter = WindowFilter::default();
        assert!(filter.is_large_enough(&geometry(800, 20)));
        assert!(filter.is_large_enough(&geometry(20, 800)));
        assert!(filter.is_large_enough(&geometry(64, 64)));
        assert!(!filter.is_large_enough(&geometry(63, 63)));
        assert!(!filter.is_large_enough(&geometry(0, 0)));
    }

    #[test]
    fn test_zero_threshold_keeps_empty_windows() {
        let filter = WindowFilter::new(0);
        assert!(filter.is_large_enough(&geometry(0, 0)));
    }
}
