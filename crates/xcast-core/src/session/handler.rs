use tracing::{error, info};

use crate::ffmpeg::{CaptureCommand, CaptureSettings, CaptureSpec, compile_capture_with};
use crate::process::{OutputMode, ProcessError, ProcessState, Supervisor};
use crate::v4l2::LoopbackDevice;

use super::errors::SessionError;
use super::types::{StreamSession, StreamSettings, StreamSource};

impl StreamSession {
    pub fn new(device: LoopbackDevice, settings: StreamSettings, capture: CaptureSettings) -> Self {
        Self {
            device,
            source: None,
            settings,
            capture,
        }
    }

    pub fn with_source(mut self, source: StreamSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Supervisor slot for this device.
    pub fn slot(&self) -> String {
        self.device.path.to_string_lossy().into_owned()
    }

    pub fn spec(&self) -> Result<CaptureSpec, SessionError> {
        let source = self.source.as_ref().ok_or_else(|| SessionError::NoSource {
            device: self.slot(),
        })?;

        Ok(CaptureSpec::new(
            source.screen.clone(),
            source.geometry.into(),
            self.device.path.clone(),
        )
        .with_size(self.settings.size)
        .with_fps(self.settings.fps)
        .with_scale(self.settings.scale)
        .with_pad(self.settings.pad))
    }

    /// The command `start` would run. Launches nothing.
    pub fn command_preview(&self) -> Result<CaptureCommand, SessionError> {
        Ok(compile_capture_with(&self.spec()?, &self.capture)?)
    }

    /// Start streaming into the device. Returns the ffmpeg pid.
    pub fn start(&self, supervisor: &Supervisor) -> Result<u32, SessionError> {
        let command = self.command_preview()?;
        let slot = self.slot();
        info!(
            event = "core.session.start_started",
            device = %slot,
            label = %self.device.label
        );

        match supervisor.launch(&slot, &command, OutputMode::Capture) {
            Ok(pid) => {
                info!(event = "core.session.start_completed", device = %slot, pid = pid);
                Ok(pid)
            }
            Err(e) => {
                error!(event = "core.session.start_failed", device = %slot, error = %e);
                Err(e.into())
            }
        }
    }

    /// Stop the device's stream and wait for ffmpeg to exit.
    ///
    /// Returns `None` when the device was never started.
    pub fn stop(&self, supervisor: &Supervisor) -> Result<Option<ProcessState>, SessionError> {
        match supervisor.stop(&self.slot()) {
            Ok(state) => Ok(Some(state)),
            Err(ProcessError::SlotNotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stop, then start again with the current source and settings.
    pub fn restart(&self, supervisor: &Supervisor) -> Result<u32, SessionError> {
        // Compile first so a bad spec leaves the running stream alone
        self.command_preview()?;
        self.stop(supervisor)?;
        self.start(supervisor)
    }

    /// `None` when the device was never started.
    pub fn state(&self, supervisor: &Supervisor) -> Option<ProcessState> {
        supervisor.poll(&self.slot()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{ScreenId, WindowId};
    use crate::geometry::AbsoluteGeometry;
    use std::path::PathBuf;

    fn session(ffmpeg: &str) -> StreamSession {
        StreamSession::new(
            LoopbackDevice {
                label: "Desktop".to_string(),
                path: PathBuf::from("/dev/video7"),
            },
            StreamSettings {
                fps: 30,
                size: None,
                scale: true,
                pad: true,
            },
            CaptureSettings {
                ffmpeg_binary: ffmpeg.to_string(),
                ..CaptureSettings::default()
            },
        )
        .with_source(StreamSource {
            screen: ScreenId::from(":0.0"),
            window: Some(WindowId(0x1a00007)),
            geometry: AbsoluteGeometry {
                x: 10,
                y: 20,
                width: 801,
                height: 599,
            },
        })
    }

    #[test]
    fn test_preview_targets_device() {
        let command = session("ffmpeg").command_preview().unwrap();
        assert_eq!(command.args.last().map(String::as_str), Some("/dev/video7"));
        assert_eq!(command.arg_after("-framerate"), Some("30"));
        assert_eq!(command.arg_after("-i"), Some(":0.0+10,20"));
        assert_eq!(
            command.arg_after("-vf"),
            Some("pad=width=802:height=600:x=(ow-iw)/2:y=(oh-ih)/2")
        );
    }

    #[test]
    fn test_no_source_is_an_error() {
        let mut session = session("ffmpeg");
        session.source = None;
        assert!(matches!(
            session.command_preview(),
            Err(SessionError::NoSource { .. })
        ));
    }

    #[test]
    fn test_start_stop_restart_lifecycle() {
        // Stands in for ffmpeg and runs until signalled
        let temp = tempfile::tempdir().unwrap();
        let fake = temp.path().join("fake-ffmpeg");
        std::fs::write(&fake, "#!/bin/sh\nexec sleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let session = session(fake.to_str().unwrap());
        let supervisor = Supervisor::new();

        assert_eq!(session.state(&supervisor), None);
        assert_eq!(session.stop(&supervisor).unwrap(), None);

        let first = session.start(&supervisor).unwrap();
        assert_eq!(session.state(&supervisor), Some(ProcessState::Running));
        assert!(matches!(
            session.start(&supervisor),
            Err(SessionError::ProcessError {
                source: ProcessError::AlreadyRunning { .. }
            })
        ));

        let second = session.restart(&supervisor).unwrap();
        assert_ne!(first, second);
        assert_eq!(session.state(&supervisor), Some(ProcessState::Running));

        let stopped = session.stop(&supervisor).unwrap();
        assert!(matches!(stopped, Some(ProcessState::Exited { .. })));
    }
}
