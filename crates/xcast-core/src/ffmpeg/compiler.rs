use std::path::{Path, PathBuf};

use tracing::debug;

use crate::display::ScreenId;
use crate::geometry::AbsoluteGeometry;

use super::errors::CaptureError;
use super::types::{CaptureCommand, CaptureSettings, CaptureSpec, OutputSize};

/// Compile `spec` with default settings.
pub fn compile_capture(spec: &CaptureSpec) -> Result<CaptureCommand, CaptureError> {
    compile_capture_with(spec, &CaptureSettings::default())
}

/// Compile `spec` into an ffmpeg invocation. Pure and deterministic.
///
/// Filters are added only when the output size differs from the source:
/// `scale` fits the source inside the requested box when both axes change,
/// and `pad` centres the frame in the output box when the aspect ratios
/// differ. Streams round the output box up to even dimensions, and pad to
/// it whenever that rounding changed anything, regardless of `spec.pad`.
pub fn compile_capture_with(
    spec: &CaptureSpec,
    settings: &CaptureSettings,
) -> Result<CaptureCommand, CaptureError> {
    validate(spec, settings)?;

    let source = spec.source_size();
    let requested = spec.size.unwrap_or(source);
    let (output, forced_pad) = if spec.is_still() {
        (requested, false)
    } else {
        let even = requested.round_up_to_even();
        (even, even != requested)
    };

    let framerate = if spec.is_still() {
        settings.screenshot_framerate
    } else {
        spec.fps
    };

    let mut args = vec![
        "-loglevel".to_string(),
        settings.log_level.clone(),
        "-f".to_string(),
        settings.grab_format.clone(),
        "-framerate".to_string(),
        framerate.to_string(),
        "-s".to_string(),
        source.to_string(),
        "-i".to_string(),
        format!("{}+{},{}", spec.screen, spec.source.x, spec.source.y),
    ];

    let filters = filter_chain(spec, source, requested, output, forced_pad);
    if !filters.is_empty() {
        args.push("-vf".to_string());
        args.push(filters.join(", "));
    }

    let target = output_path(&spec.output)?;
    if spec.is_still() {
        args.extend(["-vframes", "1", "-y"].map(String::from));
    } else {
        args.extend(
            [
                "-vcodec", "rawvideo", "-pix_fmt", "yuv420p", "-threads", "0", "-f", "v4l2",
            ]
            .map(String::from),
        );
    }
    args.push(target);

    debug!(
        event = "core.ffmpeg.compile_completed",
        screen = %spec.screen,
        source = %source,
        output = %output,
        fps = spec.fps,
        filters = filters.len()
    );

    Ok(CaptureCommand {
        program: settings.ffmpeg_binary.clone(),
        args,
    })
}

fn validate(spec: &CaptureSpec, settings: &CaptureSettings) -> Result<(), CaptureError> {
    if spec.source.x < 0 || spec.source.y < 0 {
        return Err(CaptureError::invalid(
            "source",
            format!(
                "origin must not be negative, got {},{}",
                spec.source.x, spec.source.y
            ),
        ));
    }
    if spec.source.width == 0 || spec.source.height == 0 {
        return Err(CaptureError::invalid(
            "source",
            format!("size must be non-zero, got {}", spec.source_size()),
        ));
    }
    if let Some(size) = spec.size
        && (size.width == 0 || size.height == 0)
    {
        return Err(CaptureError::invalid(
            "size",
            format!("must be non-zero, got {}", size),
        ));
    }
    if spec.is_still() && settings.screenshot_framerate == 0 {
        return Err(CaptureError::invalid(
            "screenshot_framerate",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn filter_chain(
    spec: &CaptureSpec,
    source: OutputSize,
    requested: OutputSize,
    output: OutputSize,
    forced_pad: bool,
) -> Vec<String> {
    let mut filters = Vec::new();
    if output == source {
        return filters;
    }

    // A one-axis change would distort, so only scale when both differ
    if spec.scale && requested.width != source.width && requested.height != source.height {
        filters.push(format!(
            "scale=width={}:height={}:force_original_aspect_ratio=decrease",
            requested.width, requested.height
        ));
    }

    if forced_pad || (spec.pad && !source.same_aspect_as(&output)) {
        filters.push(format!(
            "pad=width={}:height={}:x=(ow-iw)/2:y=(oh-ih)/2",
            output.width, output.height
        ));
    }

    filters
}

fn output_path(path: &Path) -> Result<String, CaptureError> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        CaptureError::invalid(
            "output",
            format!("must be valid UTF-8, got '{}'", path.display()),
        )
    })
}

/// A still of `geometry`, optionally fitted into `scale_to`, never padded.
pub fn screenshot_spec(
    screen: &ScreenId,
    geometry: AbsoluteGeometry,
    path: impl Into<PathBuf>,
    scale_to: Option<OutputSize>,
) -> CaptureSpec {
    CaptureSpec::new(screen.clone(), geometry.into(), path)
        .with_size(scale_to)
        .with_pad(false)
}

/// A continuous stream of `geometry` at its own size into `device`.
pub fn stream_spec(
    screen: &ScreenId,
    geometry: AbsoluteGeometry,
    fps: u32,
    device: impl Into<PathBuf>,
) -> CaptureSpec {
    CaptureSpec::new(screen.clone(), geometry.into(), device)
        .with_fps(fps)
        .with_scale(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::SourceRect;

    fn spec(width: u32, height: u32) -> CaptureSpec {
        CaptureSpec::new(
            ScreenId::from(":0.0"),
            SourceRect {
                x: 0,
                y: 0,
                width,
                height,
            },
            "/tmp/out.png",
        )
    }

    #[test]
    fn test_full_screen_still_has_no_filters() {
        let command = compile_capture(&spec(1920, 1080)).unwrap();

        assert_eq!(command.program, "ffmpeg");
        assert_eq!(
            command.args,
            vec![
                "-loglevel",
                "error",
                "-f",
                "x11grab",
                "-framerate",
                "120",
                "-s",
                "1920x1080",
                "-i",
                ":0.0+0,0",
                "-vframes",
                "1",
                "-y",
                "/tmp/out.png",
            ]
        );
        assert!(command.arg_after("-vf").is_none());
    }

    #[test]
    fn test_scale_only_when_pad_disabled() {
        let command = compile_capture(
            &spec(800, 600)
                .with_size(Some(OutputSize::new(400, 300)))
                .with_pad(false),
        )
        .unwrap();

        assert_eq!(
            command.arg_after("-vf"),
            Some("scale=width=400:height=300:force_original_aspect_ratio=decrease")
        );
    }

    #[test]
    fn test_same_aspect_needs_no_pad_even_when_enabled() {
        let command =
            compile_capture(&spec(800, 600).with_size(Some(OutputSize::new(400, 300)))).unwrap();

        let filters = command.arg_after("-vf").unwrap();
        assert!(filters.starts_with("scale="));
        assert!(!filters.contains("pad="));
    }

    #[test]
    fn test_scale_precedes_pad() {
        let command =
            compile_capture(&spec(1920, 1080).with_size(Some(OutputSize::new(320, 240)))).unwrap();

        assert_eq!(
            command.arg_after("-vf"),
            Some(
                "scale=width=320:height=240:force_original_aspect_ratio=decrease, \
                 pad=width=320:height=240:x=(ow-iw)/2:y=(oh-ih)/2"
            )
        );
    }

    #[test]
    fn test_one_axis_change_does_not_scale() {
        let command =
            compile_capture(&spec(800, 600).with_size(Some(OutputSize::new(800, 450)))).unwrap();

        let filters = command.arg_after("-vf").unwrap();
        assert!(!filters.contains("scale="));
        assert_eq!(filters, "pad=width=800:height=450:x=(ow-iw)/2:y=(oh-ih)/2");
    }

    #[test]
    fn test_scale_disabled_keeps_pad() {
        let command = compile_capture(
            &spec(1920, 1080)
                .with_size(Some(OutputSize::new(320, 240)))
                .with_scale(false),
        )
        .unwrap();

        assert_eq!(
            command.arg_after("-vf"),
            Some("pad=width=320:height=240:x=(ow-iw)/2:y=(oh-ih)/2")
        );
    }

    #[test]
    fn test_odd_stream_rounded_and_padded() {
        let command = compile_capture(
            &spec(801, 599)
                .with_fps(30)
                .with_pad(false)
                .with_scale(false),
        )
        .unwrap();

        assert_eq!(command.arg_after("-framerate"), Some("30"));
        assert_eq!(command.arg_after("-s"), Some("801x599"));
        assert_eq!(
            command.arg_after("-vf"),
            Some("pad=width=802:height=600:x=(ow-iw)/2:y=(oh-ih)/2")
        );
    }

    #[test]
    fn test_even_stream_output_args() {
        let mut stream = spec(1280, 720).with_fps(25);
        stream.output = "/dev/video4".into();
        let command = compile_capture(&stream).unwrap();

        assert!(command.arg_after("-vf").is_none());
        let tail: Vec<&str> = command.args[10..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "-vcodec",
                "rawvideo",
                "-pix_fmt",
                "yuv420p",
                "-threads",
                "0",
                "-f",
                "v4l2",
                "/dev/video4"
            ]
        );
    }

    #[test]
    fn test_odd_requested_stream_size_scales_then_pads_to_even() {
        let command = compile_capture(
            &spec(1920, 1080)
                .with_fps(30)
                .with_size(Some(OutputSize::new(641, 361))),
        )
        .unwrap();

        assert_eq!(
            command.arg_after("-vf"),
            Some(
                "scale=width=641:height=361:force_original_aspect_ratio=decrease, \
                 pad=width=642:height=362:x=(ow-iw)/2:y=(oh-ih)/2"
            )
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let input = spec(1366, 768)
            .with_fps(30)
            .with_size(Some(OutputSize::new(640, 480)));
        assert_eq!(
            compile_capture(&input).unwrap(),
            compile_capture(&input).unwrap()
        );
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            compile_capture(&spec(0, 600)),
            Err(CaptureError::InvalidSpec { field, .. }) if field == "source"
        ));
        assert!(matches!(
            compile_capture(&spec(800, 600).with_size(Some(OutputSize::new(0, 300)))),
            Err(CaptureError::InvalidSpec { field, .. }) if field == "size"
        ));
    }

    #[test]
    fn test_negative_origin_rejected() {
        let mut negative = spec(800, 600);
        negative.source.x = -5;
        assert!(compile_capture(&negative).is_err());
    }

    #[test]
    fn test_custom_settings() {
        let settings = CaptureSettings {
            ffmpeg_binary: "/opt/ffmpeg/bin/ffmpeg".to_string(),
            log_level: "warning".to_string(),
            screenshot_framerate: 60,
            ..CaptureSettings::default()
        };
        let command = compile_capture_with(&spec(100, 100), &settings).unwrap();

        assert_eq!(command.program, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(command.arg_after("-loglevel"), Some("warning"));
        assert_eq!(command.arg_after("-framerate"), Some("60"));
        assert_eq!(command.to_argv()[0], "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn test_screenshot_and_stream_helpers() {
        let screen = ScreenId::from(":1.0");
        let geometry = AbsoluteGeometry {
            x: 40,
            y: 30,
            width: 801,
            height: 599,
        };

        let still = screenshot_spec(&screen, geometry, "/tmp/t.png", Some(OutputSize::new(320, 180)));
        assert!(still.is_still());
        assert!(!still.pad);
        assert_eq!(
            compile_capture(&still).unwrap().arg_after("-i"),
            Some(":1.0+40,30")
        );

        let stream = stream_spec(&screen, geometry, 30, "/dev/video0");
        let command = compile_capture(&stream).unwrap();
        assert_eq!(
            command.arg_after("-vf"),
            Some("pad=width=802:height=600:x=(ow-iw)/2:y=(oh-ih)/2")
        );
    }
}
