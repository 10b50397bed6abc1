use std::process::{Command, Stdio};

use tracing::debug;

const UNKNOWN_VERSION: &str = "<Unknown>";

/// Installed ffmpeg version, or `None` when `binary` cannot be run.
pub fn ffmpeg_version(binary: &str) -> Option<String> {
    let path = match which::which(binary) {
        Ok(path) => path,
        Err(e) => {
            debug!(
                event = "core.ffmpeg.version_not_found",
                binary = binary,
                error = %e
            );
            return None;
        }
    };

    let output = Command::new(&path)
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        debug!(
            event = "core.ffmpeg.version_failed",
            binary = %path.display(),
            exit_code = output.status.code()
        );
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(parse_version_line(stdout.lines().next().unwrap_or_default()))
}

/// Version token from a line like `ffmpeg version 6.1.1 Copyright ...`.
pub fn parse_version_line(line: &str) -> String {
    let mut words = line.split(' ');
    match (words.next(), words.next(), words.next()) {
        (Some(_), Some("version"), Some(version)) if !version.is_empty() => version.to_string(),
        _ => UNKNOWN_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_version() {
        assert_eq!(
            parse_version_line("ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023"),
            "6.1.1-3ubuntu5"
        );
    }

    #[test]
    fn test_parse_unexpected_format() {
        assert_eq!(parse_version_line("avconv 12"), "<Unknown>");
        assert_eq!(parse_version_line(""), "<Unknown>");
    }

    #[test]
    fn test_missing_binary_is_none() {
        assert_eq!(ffmpeg_version("xcast-no-such-ffmpeg-binary"), None);
    }
}
