use std::collections::BTreeMap;
use std::path::PathBuf;

use xcast_core::catalog::CatalogEntry;
use xcast_core::thumbnails::ThumbnailKey;
use xcast_core::v4l2::LoopbackDevice;
use xcast_core::{Screen, ScreenId};

const MAX_COLUMN_WIDTH: usize = 50;

/// Box-drawn table whose columns fit their widest cell.
pub struct TableFormatter {
    headers: Vec<&'static str>,
    widths: Vec<usize>,
}

impl TableFormatter {
    pub fn new(headers: &[&'static str], rows: &[Vec<String>]) -> Self {
        let widths = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                rows.iter()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_COLUMN_WIDTH)
            })
            .collect();

        Self {
            headers: headers.to_vec(),
            widths,
        }
    }

    pub fn print_table(&self, rows: &[Vec<String>]) {
        println!("{}", self.border('┌', '┬', '┐'));
        let headers: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        println!("{}", self.row(&headers));
        println!("{}", self.border('├', '┼', '┤'));
        for row in rows {
            println!("{}", self.row(row));
        }
        println!("{}", self.border('└', '┴', '┘'));
    }

    fn border(&self, left: char, middle: char, right: char) -> String {
        let segments: Vec<String> = self.widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}", left, segments.join(&middle.to_string()), right)
    }

    fn row(&self, cells: &[String]) -> String {
        let cells: Vec<String> = self
            .widths
            .iter()
            .enumerate()
            .map(|(column, width)| {
                let cell = cells.get(column).map(String::as_str).unwrap_or("");
                format!(" {} ", truncate(cell, *width))
            })
            .collect();
        format!("│{}│", cells.join("│"))
    }
}

pub fn print_screens_table(screens: &BTreeMap<ScreenId, Screen>) {
    let rows: Vec<Vec<String>> = screens
        .values()
        .map(|screen| {
            vec![
                screen.id.to_string(),
                format!("{}x{}", screen.width, screen.height),
                screen.root.to_string(),
            ]
        })
        .collect();
    TableFormatter::new(&["Screen", "Size", "Root"], &rows).print_table(&rows);
}

pub fn print_windows_table(entries: &[CatalogEntry]) {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.window.screen.to_string(),
                entry.window.id.to_string(),
                entry.window.title_or_empty().to_string(),
                entry.geometry.to_string(),
            ]
        })
        .collect();
    TableFormatter::new(&["Screen", "Window", "Title", "Geometry"], &rows).print_table(&rows);
}

pub fn print_devices_table(devices: &[LoopbackDevice]) {
    let rows: Vec<Vec<String>> = devices
        .iter()
        .map(|device| vec![device.label.clone(), device.path.display().to_string()])
        .collect();
    TableFormatter::new(&["Label", "Device"], &rows).print_table(&rows);
}

pub fn print_thumbnails_table(thumbnails: &BTreeMap<ThumbnailKey, PathBuf>) {
    let rows: Vec<Vec<String>> = thumbnails
        .iter()
        .map(|(key, path)| {
            vec![
                key.screen.to_string(),
                key.window.to_string(),
                path.display().to_string(),
            ]
        })
        .collect();
    TableFormatter::new(&["Screen", "Window", "Thumbnail"], &rows).print_table(&rows);
}

/// Truncate a string to a maximum display width, adding "..." if truncated.
///
/// Uses character count (not byte count) to safely handle UTF-8 strings
/// including emoji and multi-byte characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        format!("{:<width$}", s, width = max_len)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_len)
    }
}
