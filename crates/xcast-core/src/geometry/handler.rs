use tracing::debug;

use crate::display::{DisplayError, LocalGeometry, WindowId, WindowSystem};

use super::types::AbsoluteGeometry;

/// Compute a window's absolute on-screen rectangle, clipped to its screen.
///
/// Sums the local offsets of the window and every ancestor up to and
/// including the root, then clips against the root's bounds. Fails with
/// [`DisplayError::WindowGone`] if any window on the way up disappears;
/// callers should skip the window rather than abort.
pub fn absolute_geometry<S: WindowSystem + ?Sized>(
    system: &S,
    window: WindowId,
) -> Result<AbsoluteGeometry, DisplayError> {
    let own = system.local_geometry(window)?;

    let (mut x, mut y) = (i64::from(own.x), i64::from(own.y));
    let mut current = window;
    let mut root = own;
    let mut depth = 0usize;

    while let Some(parent) = system.query_tree(current)?.parent {
        let geometry = system.local_geometry(parent)?;
        x += i64::from(geometry.x);
        y += i64::from(geometry.y);
        root = geometry;
        current = parent;
        depth += 1;
    }

    let clipped = clip_to_root((x, y), own, root);
    debug!(
        event = "core.geometry.resolve_completed",
        window_id = %window,
        depth = depth,
        geometry = %clipped
    );
    Ok(clipped)
}

/// Clip a window at absolute `position` with the size of `window` to `root`.
///
/// The origin is pulled onto the screen, then the size is cut at the far
/// edges. Sizes that would go negative become zero.
pub fn clip_to_root(
    position: (i64, i64),
    window: LocalGeometry,
    root: LocalGeometry,
) -> AbsoluteGeometry {
    let (x, width) = clip_axis(position.0, window.width, root.x, root.width);
    let (y, height) = clip_axis(position.1, window.height, root.y, root.height);
    AbsoluteGeometry {
        x,
        y,
        width,
        height,
    }
}

fn clip_axis(position: i64, size: u32, root_position: i32, root_size: u32) -> (i32, u32) {
    let root_start = i64::from(root_position);
    let root_end = root_start + i64::from(root_size);

    let start = position.clamp(root_start, root_end);
    let available = root_end - start;
    let length = i64::from(size).min(available).max(0);

    // Both values lie within the root's i32/u32 ranges after clamping
    (start as i32, length as u32)
}
