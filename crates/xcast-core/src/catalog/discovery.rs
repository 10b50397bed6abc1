use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::display::{DisplayError, Screen, ScreenId, WindowId, WindowSystem, X11Display};

use super::types::{CatalogEntry, WindowFilter};
use super::walk::{CatalogWalk, describe_window, list_windows};

/// Open `:0`, `:1`, ... in order until one cannot be opened.
///
/// The first gap ends the probe. Later displays are never tried, even if
/// they exist.
pub fn probe_displays<D, F>(mut connect: F) -> Vec<D>
where
    F: FnMut(&str) -> Result<D, DisplayError>,
{
    let mut displays = Vec::new();

    for index in 0.. {
        let name = format!(":{}", index);
        match connect(&name) {
            Ok(display) => displays.push(display),
            Err(DisplayError::DisplayUnavailable { message, .. }) => {
                debug!(
                    event = "core.catalog.probe_stopped",
                    display = %name,
                    reason = %message
                );
                break;
            }
            Err(e) => {
                warn!(
                    event = "core.catalog.probe_failed",
                    display = %name,
                    error = %e
                );
                break;
            }
        }
    }

    displays
}

/// Every screen of every display, keyed by screen id.
pub fn list_screens<S: WindowSystem>(displays: &[S]) -> BTreeMap<ScreenId, Screen> {
    displays
        .iter()
        .flat_map(|display| display.screens())
        .map(|screen| (screen.id.clone(), screen))
        .collect()
}

/// The set of displays opened for one discovery pass.
///
/// Screens and windows are read from the live connections on every call.
/// Dropping the value closes the connections.
#[derive(Debug)]
pub struct Discovery<S: WindowSystem = X11Display> {
    displays: Vec<S>,
}

impl Discovery<X11Display> {
    /// Probe sequential displays starting at `:0`.
    pub fn probe() -> Self {
        info!(event = "core.catalog.discovery_started", mode = "probe");
        let discovery = Self::from_displays(probe_displays(X11Display::open));
        discovery.log_completed();
        discovery
    }

    /// Open only the named displays. Names that fail to open are skipped.
    pub fn connect<N: AsRef<str>>(names: &[N]) -> Self {
        info!(event = "core.catalog.discovery_started", mode = "named");
        let displays = names
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter_map(|name| match X11Display::open(name) {
                Ok(display) => Some(display),
                Err(e) => {
                    debug!(
                        event = "core.catalog.display_skipped",
                        display = name,
                        error = %e
                    );
                    None
                }
            })
            .collect();
        let discovery = Self::from_displays(displays);
        discovery.log_completed();
        discovery
    }
}

impl<S: WindowSystem> Discovery<S> {
    pub fn from_displays(displays: Vec<S>) -> Self {
        Self { displays }
    }

    pub fn displays(&self) -> &[S] {
        &self.displays
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    pub fn screens(&self) -> BTreeMap<ScreenId, Screen> {
        list_screens(&self.displays)
    }

    /// The display serving `screen` and the screen itself.
    pub fn display_for(&self, screen: &ScreenId) -> Result<(&S, Screen), DisplayError> {
        self.displays
            .iter()
            .filter(|display| display.display_name() == screen.display_name())
            .find_map(|display| {
                display
                    .screens()
                    .into_iter()
                    .find(|candidate| &candidate.id == screen)
                    .map(|found| (display, found))
            })
            .ok_or_else(|| DisplayError::ScreenNotFound {
                screen: screen.to_string(),
            })
    }

    /// Lazy walk of one screen's windows.
    pub fn windows(
        &self,
        screen: &ScreenId,
        filter: WindowFilter,
    ) -> Result<CatalogWalk<'_, S>, DisplayError> {
        let (display, screen) = self.display_for(screen)?;
        Ok(list_windows(display, &screen, filter))
    }

    /// Look up one window by id, without filtering.
    ///
    /// A window that does not exist, or vanishes during the lookup, is
    /// reported as [`DisplayError::WindowNotFound`].
    pub fn find_window(
        &self,
        screen: &ScreenId,
        window: WindowId,
    ) -> Result<CatalogEntry, DisplayError> {
        let (display, screen) = self.display_for(screen)?;
        describe_window(display, &screen, window).map_err(|e| match e {
            DisplayError::WindowGone { .. } => DisplayError::WindowNotFound {
                screen: screen.id.to_string(),
                id: window,
            },
            other => other,
        })
    }

    fn log_completed(&self) {
        info!(
            event = "core.catalog.discovery_completed",
            displays = self.displays.len(),
            screens = self.displays.iter().map(|d| d.screens().len()).sum::<usize>()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::FakeDisplay;

    #[test]
    fn test_probe_stops_at_first_gap() {
        let available = [":0", ":1", ":3"];
        let mut attempts = Vec::new();

        let displays = probe_displays(|name| {
            attempts.push(name.to_string());
            if available.contains(&name) {
                Ok(FakeDisplay::new(name, 800, 600))
            } else {
                Err(DisplayError::DisplayUnavailable {
                    name: name.to_string(),
                    message: "no socket".to_string(),
                })
            }
        });

        let names: Vec<_> = displays.iter().map(|d| d.display_name().to_string()).collect();
        assert_eq!(names, vec![":0", ":1"]);
        assert_eq!(attempts, vec![":0", ":1", ":2"]);
    }

    #[test]
    fn test_probe_with_no_displays_is_empty() {
        let displays: Vec<FakeDisplay> = probe_displays(|name| {
            Err(DisplayError::DisplayUnavailable {
                name: name.to_string(),
                message: "refused".to_string(),
            })
        });
        assert!(displays.is_empty());
    }

    #[test]
    fn test_list_screens_keys_by_screen_id() {
        let displays = vec![
            FakeDisplay::new(":0", 1920, 1080),
            FakeDisplay::new(":1", 1280, 720),
        ];

        let screens = list_screens(&displays);
        let keys: Vec<_> = screens.keys().map(|id| id.as_str()).collect();
        assert_eq!(keys, vec![":0.0", ":1.0"]);
        assert_eq!(screens[&ScreenId::from(":1.0")].width, 1280);
    }

    #[test]
    fn test_display_for_unknown_screen() {
        let discovery = Discovery::from_displays(vec![FakeDisplay::new(":0", 800, 600)]);

        let result = discovery.display_for(&ScreenId::from(":0.4"));
        assert!(matches!(result, Err(DisplayError::ScreenNotFound { .. })));
        assert!(discovery.display_for(&ScreenId::from(":0.0")).is_ok());
    }

    #[test]
    fn test_find_window_missing_is_not_found() {
        let display = FakeDisplay::new(":0", 800, 600);
        display.add(10, display.root(), (0, 0, 100, 100), Some("present"));
        let discovery = Discovery::from_displays(vec![display]);
        let screen = ScreenId::from(":0.0");

        let found = discovery.find_window(&screen, WindowId(10)).unwrap();
        assert_eq!(found.window.title.as_deref(), Some("present"));

        let missing = discovery.find_window(&screen, WindowId(77));
        assert!(matches!(
            missing,
            Err(DisplayError::WindowNotFound { id: WindowId(77), .. })
        ));
    }

    #[test]
    fn test_windows_walks_requested_screen() {
        let first = FakeDisplay::new(":0", 800, 600);
        first.add(10, first.root(), (0, 0, 100, 100), Some("on zero"));
        let second = FakeDisplay::new(":1", 800, 600);
        second.add(20, second.root(), (0, 0, 100, 100), Some("on one"));
        let discovery = Discovery::from_displays(vec![first, second]);

        let titles: Vec<_> = discovery
            .windows(&ScreenId::from(":1.0"), WindowFilter::default())
            .unwrap()
            .map(|entry| entry.window.title_or_empty().to_string())
            .collect();
        assert_eq!(titles, vec!["on one"]);
    }
}
