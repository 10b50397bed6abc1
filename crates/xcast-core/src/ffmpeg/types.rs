use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::display::ScreenId;
use crate::geometry::AbsoluteGeometry;

use super::errors::CaptureError;

/// Screen region to grab, in screen-absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<AbsoluteGeometry> for SourceRect {
    fn from(geometry: AbsoluteGeometry) -> Self {
        Self {
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
        }
    }
}

impl FromStr for SourceRect {
    type Err = CaptureError;

    /// Parses `X,Y,W,H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        let [x, y, width, height] = parts.as_slice() else {
            return Err(CaptureError::invalid(
                "rect",
                format!("must be X,Y,W,H, got '{}'", s),
            ));
        };
        Ok(Self {
            x: parse_field("x", x)?,
            y: parse_field("y", y)?,
            width: parse_field("width", width)?,
            height: parse_field("height", height)?,
        })
    }
}

/// Output frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions rounded up to the next even number.
    pub fn round_up_to_even(self) -> Self {
        Self {
            width: self.width.saturating_add(self.width % 2),
            height: self.height.saturating_add(self.height % 2),
        }
    }

    /// Aspect ratio equality without floating point.
    pub fn same_aspect_as(&self, other: &OutputSize) -> bool {
        u64::from(self.width) * u64::from(other.height)
            == u64::from(other.width) * u64::from(self.height)
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for OutputSize {
    type Err = CaptureError;

    /// Parses `WxH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((width, height)) = s.split_once(['x', 'X']) else {
            return Err(CaptureError::invalid(
                "size",
                format!("must be WxH, got '{}'", s),
            ));
        };
        Ok(Self {
            width: parse_field("output_width", width)?,
            height: parse_field("output_height", height)?,
        })
    }
}

/// Everything needed to compile one ffmpeg invocation.
///
/// `fps == 0` means a single still frame written to a file; anything else
/// is a continuous raw stream written to a v4l2 device node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSpec {
    pub screen: ScreenId,
    pub source: SourceRect,
    pub output: PathBuf,
    /// Defaults to the source size.
    pub size: Option<OutputSize>,
    pub fps: u32,
    pub scale: bool,
    pub pad: bool,
}

impl CaptureSpec {
    /// A still capture of `source` at its own size, scaling and padding enabled.
    pub fn new(screen: ScreenId, source: SourceRect, output: impl Into<PathBuf>) -> Self {
        Self {
            screen,
            source,
            output: output.into(),
            size: None,
            fps: 0,
            scale: true,
            pad: true,
        }
    }

    pub fn with_size(mut self, size: Option<OutputSize>) -> Self {
        self.size = size;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_pad(mut self, pad: bool) -> Self {
        self.pad = pad;
        self
    }

    pub fn is_still(&self) -> bool {
        self.fps == 0
    }

    pub fn source_size(&self) -> OutputSize {
        OutputSize::new(self.source.width, self.source.height)
    }

    /// Build a spec from free-text entries.
    ///
    /// Blank output dimensions fall back to the source size. Any other
    /// value that is not an integer is rejected with the field's name.
    pub fn from_fields(fields: &CaptureFields<'_>) -> Result<Self, CaptureError> {
        let source = SourceRect {
            x: parse_field("x", fields.x)?,
            y: parse_field("y", fields.y)?,
            width: parse_field("width", fields.width)?,
            height: parse_field("height", fields.height)?,
        };

        let output_width = parse_optional_field("output_width", fields.output_width)?;
        let output_height = parse_optional_field("output_height", fields.output_height)?;
        let size = match (output_width, output_height) {
            (None, None) => None,
            (width, height) => Some(OutputSize::new(
                width.unwrap_or(source.width),
                height.unwrap_or(source.height),
            )),
        };

        if fields.output.trim().is_empty() {
            return Err(CaptureError::invalid("output", "must not be empty"));
        }

        Ok(Self {
            screen: ScreenId::from(fields.screen.trim()),
            source,
            output: PathBuf::from(fields.output.trim()),
            size,
            fps: parse_field("fps", fields.fps)?,
            scale: fields.scale,
            pad: fields.pad,
        })
    }
}

/// Unparsed capture settings as typed into a form or given on a command line.
#[derive(Debug, Clone, Copy)]
pub struct CaptureFields<'a> {
    pub screen: &'a str,
    pub x: &'a str,
    pub y: &'a str,
    pub width: &'a str,
    pub height: &'a str,
    pub output: &'a str,
    pub output_width: &'a str,
    pub output_height: &'a str,
    pub fps: &'a str,
    pub scale: bool,
    pub pad: bool,
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, CaptureError> {
    value
        .trim()
        .parse()
        .map_err(|_| CaptureError::invalid(field, format!("must be an integer, got '{}'", value)))
}

fn parse_optional_field<T: FromStr>(field: &str, value: &str) -> Result<Option<T>, CaptureError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_field(field, value).map(Some)
}

/// Settings shared by every compiled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub ffmpeg_binary: String,
    pub log_level: String,
    /// Input rate for stills. Only one frame is kept.
    pub screenshot_framerate: u32,
    /// ffmpeg input device.
    pub grab_format: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            log_level: "error".to_string(),
            screenshot_framerate: 120,
            grab_format: "x11grab".to_string(),
        }
    }
}

/// A compiled invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CaptureCommand {
    /// Program followed by its arguments.
    pub fn to_argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Value following `flag`, if the flag is present.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|index| self.args.get(index + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for CaptureCommand {
    /// Shell-style preview. Tokens with special characters are single-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self.to_argv().iter().map(|t| shell_quote(t)).collect();
        f.write_str(&tokens.join(" "))
    }
}

fn shell_quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>() -> CaptureFields<'a> {
        CaptureFields {
            screen: ":0.0",
            x: "10",
            y: "20",
            width: "800",
            height: "600",
            output: "/tmp/shot.png",
            output_width: "",
            output_height: "",
            fps: "0",
            scale: true,
            pad: true,
        }
    }

    #[test]
    fn test_from_fields_parses_integers() {
        let spec = CaptureSpec::from_fields(&fields()).unwrap();
        assert_eq!(
            spec.source,
            SourceRect {
                x: 10,
                y: 20,
                width: 800,
                height: 600
            }
        );
        assert_eq!(spec.size, None);
        assert!(spec.is_still());
        assert_eq!(spec.screen.as_str(), ":0.0");
    }

    #[test]
    fn test_from_fields_rejects_non_integer_naming_field() {
        let bad = CaptureFields {
            width: "80.5",
            ..fields()
        };
        match CaptureSpec::from_fields(&bad) {
            Err(CaptureError::InvalidSpec { field, .. }) => assert_eq!(field, "width"),
            other => panic!("expected InvalidSpec, got {:?}", other),
        }

        let bad = CaptureFields { fps: "fast", ..fields() };
        match CaptureSpec::from_fields(&bad) {
            Err(CaptureError::InvalidSpec { field, .. }) => assert_eq!(field, "fps"),
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_from_fields_partial_output_size_uses_source_for_missing_axis() {
        let partial = CaptureFields {
            output_width: "400",
            ..fields()
        };
        let spec = CaptureSpec::from_fields(&partial).unwrap();
        assert_eq!(spec.size, Some(OutputSize::new(400, 600)));
    }

    #[test]
    fn test_from_fields_rejects_blank_output() {
        let blank = CaptureFields {
            output: "  ",
            ..fields()
        };
        assert!(matches!(
            CaptureSpec::from_fields(&blank),
            Err(CaptureError::InvalidSpec { field, .. }) if field == "output"
        ));
    }

    #[test]
    fn test_rect_and_size_parsing() {
        let rect: SourceRect = "0,0,1920,1080".parse().unwrap();
        assert_eq!(rect.width, 1920);
        assert!("0,0,1920".parse::<SourceRect>().is_err());

        let size: OutputSize = "640x480".parse().unwrap();
        assert_eq!(size, OutputSize::new(640, 480));
        assert!("640".parse::<OutputSize>().is_err());
        assert!("640xabc".parse::<OutputSize>().is_err());
    }

    #[test]
    fn test_round_up_to_even() {
        assert_eq!(
            OutputSize::new(801, 599).round_up_to_even(),
            OutputSize::new(802, 600)
        );
        assert_eq!(
            OutputSize::new(800, 600).round_up_to_even(),
            OutputSize::new(800, 600)
        );
    }

    #[test]
    fn test_same_aspect() {
        assert!(OutputSize::new(800, 600).same_aspect_as(&OutputSize::new(400, 300)));
        assert!(!OutputSize::new(1920, 1080).same_aspect_as(&OutputSize::new(400, 300)));
    }

    #[test]
    fn test_display_quotes_special_tokens() {
        let command = CaptureCommand {
            program: "ffmpeg".to_string(),
            args: vec![
                "-vf".to_string(),
                "scale=width=4:height=3, pad=x=(ow-iw)/2".to_string(),
                "/tmp/it's.png".to_string(),
            ],
        };
        assert_eq!(
            command.to_string(),
            r"ffmpeg -vf 'scale=width=4:height=3, pad=x=(ow-iw)/2' '/tmp/it'\''s.png'"
        );
    }
}
