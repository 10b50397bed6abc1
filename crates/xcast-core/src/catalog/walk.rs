use tracing::{debug, info, warn};

use crate::display::{DisplayError, MapState, Screen, TitleProperty, Window, WindowId, WindowSystem};
use crate::geometry::absolute_geometry;

use super::types::{CatalogEntry, WindowFilter};

/// Walk `screen`'s window tree lazily, yielding windows that pass `filter`.
///
/// Each call starts a fresh walk of the live hierarchy. Nothing is queried
/// until the iterator is advanced.
pub fn list_windows<'a, S: WindowSystem + ?Sized>(
    system: &'a S,
    screen: &Screen,
    filter: WindowFilter,
) -> CatalogWalk<'a, S> {
    debug!(
        event = "core.catalog.list_started",
        screen = %screen.id,
        min_size = filter.min_size
    );
    CatalogWalk {
        system,
        screen: screen.clone(),
        filter,
        pending: vec![screen.root],
        stats: WalkStats::default(),
        finished: false,
    }
}

/// Read a window's title, preferring `_NET_WM_NAME` over `WM_NAME`.
///
/// Invalid UTF-8 is replaced, never rejected. An empty property counts as
/// absent so the next one is tried.
pub fn window_title<S: WindowSystem + ?Sized>(
    system: &S,
    window: WindowId,
) -> Result<Option<String>, DisplayError> {
    for property in TitleProperty::PREFERENCE {
        match system.title_property(window, property)? {
            Some(bytes) if !bytes.is_empty() => {
                return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
            }
            _ => continue,
        }
    }
    Ok(None)
}

/// Snapshot a single window without applying any filter.
pub fn describe_window<S: WindowSystem + ?Sized>(
    system: &S,
    screen: &Screen,
    window: WindowId,
) -> Result<CatalogEntry, DisplayError> {
    let node = system.query_tree(window)?;
    let attributes = system.attributes(window)?;
    let title = window_title(system, window)?;
    let local = system.local_geometry(window)?;
    let geometry = absolute_geometry(system, window)?;

    Ok(CatalogEntry {
        window: Window {
            id: window,
            parent: node.parent,
            title,
            map_state: attributes.map_state,
            local,
            screen: screen.id.clone(),
        },
        geometry,
    })
}

#[derive(Debug, Default, Clone, Copy)]
struct WalkStats {
    visited: usize,
    gone: usize,
    unmapped: usize,
    untitled: usize,
    too_small: usize,
    returned: usize,
}

/// Iterator returned by [`list_windows`].
///
/// Uses an explicit stack, so hierarchy depth never grows the call stack.
/// Once exhausted it stays exhausted.
pub struct CatalogWalk<'a, S: WindowSystem + ?Sized> {
    system: &'a S,
    screen: Screen,
    filter: WindowFilter,
    pending: Vec<WindowId>,
    stats: WalkStats,
    finished: bool,
}

impl<S: WindowSystem + ?Sized> CatalogWalk<'_, S> {
    fn visit(&mut self, id: WindowId) -> Result<Option<CatalogEntry>, DisplayError> {
        let node = self.system.query_tree(id)?;
        // Reversed so children come off the stack in stacking order
        self.pending.extend(node.children.iter().rev().copied());

        if id == self.screen.root {
            return Ok(None);
        }
        self.stats.visited += 1;

        let attributes = self.system.attributes(id)?;
        if attributes.map_state != MapState::Viewable {
            self.stats.unmapped += 1;
            return Ok(None);
        }

        let Some(title) = window_title(self.system, id)? else {
            self.stats.untitled += 1;
            return Ok(None);
        };

        let local = self.system.local_geometry(id)?;
        let geometry = absolute_geometry(self.system, id)?;
        if !self.filter.is_large_enough(&geometry) {
            self.stats.too_small += 1;
            return Ok(None);
        }

        Ok(Some(CatalogEntry {
            window: Window {
                id,
                parent: node.parent,
                title: Some(title),
                map_state: attributes.map_state,
                local,
                screen: self.screen.id.clone(),
            },
            geometry,
        }))
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let stats = self.stats;
        info!(
            event = "core.catalog.list_completed",
            screen = %self.screen.id,
            visited = stats.visited,
            returned = stats.returned,
            gone = stats.gone,
            unmapped = stats.unmapped,
            untitled = stats.untitled,
            too_small = stats.too_small
        );
    }
}

impl<S: WindowSystem + ?Sized> Iterator for CatalogWalk<'_, S> {
    type Item = CatalogEntry;

    fn next(&mut self) -> Option<CatalogEntry> {
        while let Some(id) = self.pending.pop() {
            match self.visit(id) {
                Ok(Some(entry)) => {
                    self.stats.returned += 1;
                    return Some(entry);
                }
                Ok(None) => {}
                Err(DisplayError::WindowGone { id: gone }) => {
                    debug!(
                        event = "core.catalog.window_skipped",
                        window_id = %id,
                        gone_id = %gone,
                        reason = "window_gone"
                    );
                    self.stats.gone += 1;
                }
                Err(e) => {
                    warn!(
                        event = "core.catalog.list_aborted",
                        screen = %self.screen.id,
                        window_id = %id,
                        error = %e
                    );
                    self.pending.clear();
                }
            }
        }

        self.finish();
        None
    }
}

impl<S: WindowSystem + ?Sized> std::iter::FusedIterator for CatalogWalk<'_, S> {}
