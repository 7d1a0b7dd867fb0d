mod pdf;

pub use pdf::PdfReport;

use crate::{
    data::{ActivityNode, Parameter, Script},
    diagram::Condition,
    error::Result,
};
use std::path::Path;

/// Rendered diagram plus everything listed below it.
#[derive(Debug, Clone, Copy)]
pub struct ReportData<'a> {
    pub image: &'a Path,
    pub conditions: &'a [Condition],
    pub nodes: &'a [ActivityNode],
    pub parameters: &'a [Parameter],
    pub scripts: &'a [Script],
}

/// Writes a report document.
pub trait ReportComposer {
    fn compose(&self, data: &ReportData<'_>, output: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Landscape when the diagram is wider than `threshold` pixels.
pub fn diagram_orientation(image_width: u32, threshold: u32) -> Orientation {
    if image_width > threshold {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Page geometry, fonts and table columns. Lengths in millimetres, font sizes and column widths in points.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    /// Diagram height relative to its width, at most.
    pub diagram_height_ratio: f32,

    pub heading_font_size: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
    pub script_font_size: f32,

    pub condition_columns: [f32; 2],
    pub node_columns: [f32; 3],
    pub parameter_columns: [f32; 3],

    pub max_value_length: usize,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            // A4
            page_width: 210.0,
            page_height: 297.0,
            margin: 10.0,
            diagram_height_ratio: 1.2,
            heading_font_size: 14.0,
            header_font_size: 10.0,
            body_font_size: 8.0,
            script_font_size: 8.0,
            condition_columns: [30.0, 430.0],
            node_columns: [150.0, 80.0, 230.0],
            parameter_columns: [150.0, 120.0, 190.0],
            max_value_length: 50,
        }
    }
}

impl ReportLayout {
    pub fn page_size(&self, orientation: Orientation) -> (f32, f32) {
        match orientation {
            Orientation::Portrait => (self.page_width, self.page_height),
            Orientation::Landscape => (self.page_height, self.page_width),
        }
    }
}

const ELLIPSIS: &str = "...";

/// Shorten `value` to `max_length` characters, the last three being `...`.
pub fn truncate_value(value: &str, max_length: usize) -> String {
    if value.chars().count() <= max_length {
        return value.to_string();
    }
    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = value.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Break `text` into lines of at most `max_chars` characters.
///
/// Existing line breaks are kept. Long lines break at the last space that fits,
/// or mid-word when there is none. Tabs become four spaces.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for line in text.replace('\t', "    ").lines() {
        let mut rest: Vec<char> = line.trim_end().chars().collect();
        if rest.is_empty() {
            lines.push(String::new());
            continue;
        }
        while rest.len() > max_chars {
            let split = rest[..=max_chars]
                .iter()
                .rposition(|ch| *ch == ' ')
                .filter(|position| *position > 0)
                .unwrap_or(max_chars);
            lines.push(rest[..split].iter().collect::<String>().trim_end().to_string());
            rest.drain(..split);
            if rest.first() == Some(&' ') {
                rest.remove(0);
            }
        }
        lines.push(rest.into_iter().collect());
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
