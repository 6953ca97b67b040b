//! Paginated form layout.
//!
//! [`primitives`] measure and draw single widgets, [`canvas`] collects the
//! drawn pages and writes the PDF, and [`generator`] walks a property tree and
//! decides where everything goes.

pub mod canvas;
pub mod generator;
pub mod metrics;
pub mod primitives;

pub use canvas::{Canvas, ImageAsset, ImageEncoding, Rect, Widget};
pub use generator::{output_stem, unique_output_path, Generator, Instruction, Phase, RenderCursor};
pub use primitives::Primitive;

/// Page geometry, type sizes and spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    /// No widget may extend below this y.
    pub margin_bottom: f32,
    pub body_size: f32,
    pub heading_size: f32,
    pub title_size: f32,
    pub small_size: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
    /// Height of one line of a text input.
    pub field_height: f32,
    pub narrow_field_width: f32,
    pub medium_field_width: f32,
    /// Space after every input widget.
    pub widget_gap: f32,
    /// Space between a label and its input.
    pub label_gap: f32,
    /// Space after structural blocks (header, notes, certification).
    pub section_gap: f32,
    /// Horizontal indent per nesting level.
    pub indent_step: f32,
    pub max_indent: f32,
    pub logo_height: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        // US Letter
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin_left: 50.0,
            margin_right: 50.0,
            margin_top: 50.0,
            margin_bottom: 60.0,
            body_size: 10.0,
            heading_size: 12.0,
            title_size: 16.0,
            small_size: 8.0,
            line_spacing: 1.25,
            field_height: 18.0,
            narrow_field_width: 150.0,
            medium_field_width: 300.0,
            widget_gap: 8.0,
            label_gap: 2.0,
            section_gap: 12.0,
            indent_step: 12.0,
            max_indent: 60.0,
            logo_height: 40.0,
        }
    }
}

impl LayoutSettings {
    /// y of the first line on a fresh page.
    pub fn top(&self) -> f32 {
        self.page_height - self.margin_top
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn leading(&self, size: f32) -> f32 {
        size * self.line_spacing
    }

    /// y of the footer's top edge, inside the bottom margin.
    pub fn footer_top(&self) -> f32 {
        self.margin_bottom - 16.0
    }

    /// Indent for a field nested `depth` levels deep.
    pub fn indent(&self, depth: usize) -> f32 {
        (depth as f32 * self.indent_step).min(self.max_indent)
    }
}
