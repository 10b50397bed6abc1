use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::catalog::{Discovery, WindowFilter};
use crate::display::{ScreenId, WindowId, WindowSystem};
use crate::ffmpeg::{OutputSize, compile_capture_with, screenshot_spec};
use crate::process::{BatchJob, run_bounded};

use super::errors::ThumbnailError;
use super::types::{ThumbnailJob, ThumbnailKey, ThumbnailSettings};

/// Generates window thumbnails into its own cache directory.
#[derive(Debug, Clone)]
pub struct ThumbnailPipeline {
    settings: ThumbnailSettings,
}

impl ThumbnailPipeline {
    pub fn new(settings: ThumbnailSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ThumbnailSettings {
        &self.settings
    }

    pub fn cache_dir(&self) -> &Path {
        &self.settings.cache_dir
    }

    /// Create the cache directory and any missing parents.
    pub fn prepare(&self) -> Result<(), ThumbnailError> {
        std::fs::create_dir_all(self.cache_dir()).map_err(|source| ThumbnailError::CacheDir {
            action: "create",
            path: self.cache_dir().to_path_buf(),
            source,
        })
    }

    /// Remove the cache directory and everything in it.
    pub fn cleanup(&self) -> Result<(), ThumbnailError> {
        match std::fs::remove_dir_all(self.cache_dir()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ThumbnailError::CacheDir {
                action: "remove",
                path: self.cache_dir().to_path_buf(),
                source,
            }),
        }
    }

    /// `<cache>/<screen-id>.<window-id>.png`
    pub fn path_for(&self, screen: &ScreenId, window: WindowId) -> PathBuf {
        self.cache_dir()
            .join(format!("{}.{}.png", screen, window))
    }

    /// One job per interesting window on every screen.
    ///
    /// Windows whose command cannot be compiled are logged and left out.
    pub fn jobs<S: WindowSystem>(&self, discovery: &Discovery<S>) -> Vec<ThumbnailJob> {
        let filter = WindowFilter::new(self.settings.min_window_size);
        let size = OutputSize::new(self.settings.width, self.settings.height);
        let mut jobs = Vec::new();

        for screen_id in discovery.screens().keys() {
            let walk = match discovery.windows(screen_id, filter) {
                Ok(walk) => walk,
                Err(e) => {
                    warn!(
                        event = "core.thumbnails.screen_skipped",
                        screen = %screen_id,
                        error = %e
                    );
                    continue;
                }
            };

            for entry in walk {
                let path = self.path_for(screen_id, entry.window.id);
                let spec = screenshot_spec(screen_id, entry.geometry, &path, Some(size));
                match compile_capture_with(&spec, &self.settings.capture) {
                    Ok(command) => jobs.push(ThumbnailJob {
                        key: ThumbnailKey {
                            screen: screen_id.clone(),
                            window: entry.window.id,
                        },
                        path,
                        command,
                    }),
                    Err(e) => warn!(
                        event = "core.thumbnails.job_skipped",
                        screen = %screen_id,
                        window_id = %entry.window.id,
                        error = %e
                    ),
                }
            }
        }

        jobs
    }

    /// Capture a thumbnail of every interesting window.
    ///
    /// Runs at most `concurrency` ffmpeg processes at once and returns the
    /// thumbnails that were written. Failed captures are logged and left out.
    pub fn create_all<S: WindowSystem>(
        &self,
        discovery: &Discovery<S>,
    ) -> Result<BTreeMap<ThumbnailKey, PathBuf>, ThumbnailError> {
        info!(
            event = "core.thumbnails.create_started",
            cache_dir = %self.cache_dir().display(),
            concurrency = self.settings.concurrency
        );
        self.prepare()?;

        let jobs = self.jobs(discovery);
        let mut paths: BTreeMap<ThumbnailKey, PathBuf> = jobs
            .iter()
            .map(|job| (job.key.clone(), job.path.clone()))
            .collect();
        let batch = jobs
            .into_iter()
            .map(|job| BatchJob {
                key: job.key,
                command: job.command,
            })
            .collect();

        let report = run_bounded(batch, self.settings.concurrency, self.settings.poll_interval);

        let mut thumbnails = BTreeMap::new();
        for outcome in report.outcomes {
            let Some(path) = paths.remove(&outcome.key) else {
                continue;
            };
            match outcome.result {
                Ok(()) => {
                    thumbnails.insert(outcome.key, path);
                }
                Err(e) => warn!(
                    event = "core.thumbnails.capture_failed",
                    screen = %outcome.key.screen,
                    window_id = %outcome.key.window,
                    error = %e
                ),
            }
        }

        info!(
            event = "core.thumbnails.create_completed",
            created = thumbnails.len(),
            peak_running = report.peak_running
        );
        Ok(thumbnails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::FakeDisplay;
    use crate::ffmpeg::CaptureSettings;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn settings(cache_dir: PathBuf, capture: CaptureSettings) -> ThumbnailSettings {
        ThumbnailSettings {
            cache_dir,
            width: 320,
            height: 180,
            concurrency: 2,
            poll_interval: Duration::from_millis(10),
            min_window_size: 64,
            capture,
        }
    }

    /// An "ffmpeg" that creates its last argument, failing for windows
    /// whose output name contains `0x66`.
    fn fake_ffmpeg(dir: &Path) -> String {
        let script = dir.join("fake-ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor last; do :; done\ncase \"$last\" in *0x66*) echo nope >&2; exit 1;; esac\ntouch \"$last\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().into_owned()
    }

    fn discovery() -> Discovery<FakeDisplay> {
        let display = FakeDisplay::new(":0", 1920, 1080);
        display.add(0x64, display.root(), (0, 0, 800, 600), Some("Editor"));
        display.add(0x65, display.root(), (100, 100, 640, 480), Some("Browser"));
        display.add(0x66, display.root(), (200, 200, 640, 480), Some("Broken"));
        display.add(0x67, display.root(), (0, 0, 16, 16), Some("Tiny"));
        Discovery::from_displays(vec![display])
    }

    #[test]
    fn test_path_for_uses_screen_and_window_ids() {
        let pipeline = ThumbnailPipeline::new(settings(
            PathBuf::from("/tmp/xcast/thumbs"),
            CaptureSettings::default(),
        ));
        assert_eq!(
            pipeline.path_for(&ScreenId::from(":0.0"), WindowId(0x1a00007)),
            PathBuf::from("/tmp/xcast/thumbs/:0.0.0x1a00007.png")
        );
    }

    #[test]
    fn test_prepare_and_cleanup() {
        let temp = tempfile::tempdir().unwrap();
        let cache = temp.path().join("nested").join("thumbs");
        let pipeline = ThumbnailPipeline::new(settings(cache.clone(), CaptureSettings::default()));

        pipeline.prepare().unwrap();
        assert!(cache.is_dir());
        std::fs::write(cache.join("old.png"), b"png").unwrap();

        pipeline.cleanup().unwrap();
        assert!(!cache.exists());
        // Already gone is fine
        pipeline.cleanup().unwrap();
    }

    #[test]
    fn test_jobs_cover_interesting_windows_only() {
        let temp = tempfile::tempdir().unwrap();
        let pipeline = ThumbnailPipeline::new(settings(
            temp.path().to_path_buf(),
            CaptureSettings::default(),
        ));

        let jobs = pipeline.jobs(&discovery());
        let windows: Vec<u32> = jobs.iter().map(|job| job.key.window.0).collect();
        assert_eq!(windows, vec![0x64, 0x65, 0x66]);

        let editor = &jobs[0];
        assert_eq!(editor.path, temp.path().join(":0.0.0x64.png"));
        assert_eq!(
            editor.command.arg_after("-vf"),
            Some("scale=width=320:height=180:force_original_aspect_ratio=decrease")
        );
        assert_eq!(editor.command.args.last().map(String::as_str), editor.path.to_str());
    }

    #[test]
    fn test_create_all_returns_written_thumbnails() {
        let temp = tempfile::tempdir().unwrap();
        let capture = CaptureSettings {
            ffmpeg_binary: fake_ffmpeg(temp.path()),
            ..CaptureSettings::default()
        };
        let pipeline = ThumbnailPipeline::new(settings(temp.path().join("thumbs"), capture));

        let thumbnails = pipeline.create_all(&discovery()).unwrap();

        let windows: Vec<u32> = thumbnails.keys().map(|key| key.window.0).collect();
        assert_eq!(windows, vec![0x64, 0x65]);
        assert!(thumbnails.values().all(|path| path.is_file()));
    }
}
