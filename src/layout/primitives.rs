//! Drawing primitives.
//!
//! Each primitive draws one cohesive unit (a labelled input, a structural
//! block) at a given y and returns the y below it. `height` measures the same
//! displacement without touching a canvas, so for every primitive
//! `y - p.draw(canvas, settings, y) == p.height(settings)`.

use crate::config::{CertificationConfig, EffectiveDateConfig, FontStyle, TopNoteConfig};
use crate::layout::canvas::{Canvas, ImageAsset, Rect, Widget};
use crate::layout::metrics::{text_width, wrap_text};
use crate::layout::LayoutSettings;
use crate::schema::title_case;

/// Enums with at most this many options render as radio buttons.
pub const MAX_RADIO_OPTIONS: usize = 4;

/// Side of a checkbox or radio button.
const BUTTON_SIZE: f32 = 10.0;
/// Space between a button and its text.
const BUTTON_TEXT_GAP: f32 = 4.0;
/// Space between radio options on a row.
const OPTION_GAP: f32 = 14.0;
/// Space between the header block and its rule.
const RULE_GAP: f32 = 6.0;
/// Gutter between the two top-note columns.
const COLUMN_GAP: f32 = 12.0;

/// Something the generator can measure and then draw.
pub trait Primitive {
    /// Vertical space consumed by `draw`.
    fn height(&self, settings: &LayoutSettings) -> f32;

    /// Draw with the top edge at `y`; returns the y below the drawing.
    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32;
}

/// Width available to something starting at `x`.
fn available_width(settings: &LayoutSettings, x: f32) -> f32 {
    (settings.page_width - settings.margin_right - x).max(BUTTON_SIZE * 2.0)
}

/// Lowercase ASCII name safe for PDF field names.
fn slug(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Word-wrapped text.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f32,
    pub font: FontStyle,
    /// Font size; the body size when unset.
    pub size: Option<f32>,
}

impl Label {
    pub fn new(text: impl Into<String>, x: f32) -> Self {
        Self {
            text: text.into(),
            x,
            font: FontStyle::Regular,
            size: None,
        }
    }

    pub fn font(mut self, font: FontStyle) -> Self {
        self.font = font;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    fn font_size(&self, settings: &LayoutSettings) -> f32 {
        self.size.unwrap_or(settings.body_size)
    }

    fn lines(&self, settings: &LayoutSettings) -> Vec<String> {
        wrap_text(
            &self.text,
            self.font,
            self.font_size(settings),
            available_width(settings, self.x),
        )
    }
}

impl Primitive for Label {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.lines(settings).len() as f32 * settings.leading(self.font_size(settings))
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let size = self.font_size(settings);
        let leading = settings.leading(size);
        let lines = self.lines(settings);
        for (i, line) in lines.iter().enumerate() {
            let baseline = y - i as f32 * leading - size;
            canvas.text(self.x, baseline, self.font, size, line);
        }
        y - lines.len() as f32 * leading
    }
}

/// Vertical whitespace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacer(pub f32);

impl Primitive for Spacer {
    fn height(&self, _settings: &LayoutSettings) -> f32 {
        self.0
    }

    fn draw(&self, _canvas: &mut Canvas, _settings: &LayoutSettings, y: f32) -> f32 {
        y - self.0
    }
}

/// Primitives drawn one below the other.
#[derive(Default)]
pub struct Stack {
    parts: Vec<Box<dyn Primitive>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, part: impl Primitive + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Primitive for Stack {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.parts.iter().map(|p| p.height(settings)).sum()
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        self.parts
            .iter()
            .fold(y, |y, part| part.draw(canvas, settings, y))
    }
}

fn label_height(label: &Option<Label>, settings: &LayoutSettings) -> f32 {
    match label {
        Some(label) => label.height(settings) + settings.label_gap,
        None => 0.0,
    }
}

fn draw_label(label: &Option<Label>, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
    match label {
        Some(label) => label.draw(canvas, settings, y) - settings.label_gap,
        None => y,
    }
}

/// Width and line count of a text input, picked from the expected text length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSize {
    pub width: f32,
    pub lines: usize,
}

impl FieldSize {
    /// Under 30 characters: narrow. Under 60: medium. Otherwise the full
    /// available width with one line per 400 characters.
    pub fn for_length(length: usize, settings: &LayoutSettings, available: f32) -> Self {
        let (width, lines) = if length < 30 {
            (settings.narrow_field_width, 1)
        } else if length < 60 {
            (settings.medium_field_width, 1)
        } else {
            (available, (length / 400).max(1))
        };
        Self {
            width: width.min(available),
            lines,
        }
    }

    pub fn multiline(&self) -> bool {
        self.lines > 1
    }
}

/// Optional label above a fillable text input.
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub name: String,
    pub label: Option<Label>,
    pub x: f32,
    /// Expected length of the value in characters.
    pub length: usize,
}

impl TextField {
    pub fn new(name: impl Into<String>, x: f32, length: usize) -> Self {
        Self {
            name: name.into(),
            label: None,
            x,
            length,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn size(&self, settings: &LayoutSettings) -> FieldSize {
        FieldSize::for_length(self.length, settings, available_width(settings, self.x))
    }

    fn input_height(&self, settings: &LayoutSettings) -> f32 {
        settings.field_height * self.size(settings).lines as f32
    }
}

impl Primitive for TextField {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        label_height(&self.label, settings) + self.input_height(settings) + settings.widget_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let y = draw_label(&self.label, canvas, settings, y);
        let size = self.size(settings);
        let h = self.input_height(settings);
        canvas.add_widget(Widget::Text {
            name: self.name.clone(),
            rect: Rect::new(self.x, y - h, size.width, h),
            multiline: size.multiline(),
        });
        y - h - settings.widget_gap
    }
}

/// Checkbox with its label to the right.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckBox {
    pub name: String,
    pub label: String,
    pub x: f32,
    pub font: FontStyle,
}

impl CheckBox {
    pub fn new(name: impl Into<String>, label: impl Into<String>, x: f32) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            x,
            font: FontStyle::Regular,
        }
    }

    fn text(&self) -> Label {
        Label::new(self.label.clone(), self.x + BUTTON_SIZE + BUTTON_TEXT_GAP).font(self.font)
    }
}

impl Primitive for CheckBox {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.text().height(settings).max(BUTTON_SIZE) + settings.widget_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        canvas.add_widget(Widget::CheckBox {
            name: self.name.clone(),
            rect: Rect::new(self.x, y - BUTTON_SIZE, BUTTON_SIZE, BUTTON_SIZE),
        });
        self.text().draw(canvas, settings, y);
        y - self.height(settings)
    }
}

/// Mutually exclusive options laid out left to right, wrapping onto new rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioGroup {
    pub name: String,
    pub label: Option<Label>,
    pub options: Vec<String>,
    pub x: f32,
}

impl RadioGroup {
    /// Row index and x offset of each option.
    fn positions(&self, settings: &LayoutSettings) -> Vec<(usize, f32)> {
        let available = available_width(settings, self.x);
        let mut row = 0;
        let mut offset = 0.0;
        self.options
            .iter()
            .map(|option| {
                let width = BUTTON_SIZE
                    + BUTTON_TEXT_GAP
                    + text_width(option, FontStyle::Regular, settings.body_size);
                if offset > 0.0 && offset + width > available {
                    row += 1;
                    offset = 0.0;
                }
                let position = (row, offset);
                offset += width + OPTION_GAP;
                position
            })
            .collect()
    }

    fn row_height(settings: &LayoutSettings) -> f32 {
        settings.leading(settings.body_size).max(BUTTON_SIZE) + 2.0
    }

    fn rows(&self, settings: &LayoutSettings) -> usize {
        self.positions(settings)
            .last()
            .map(|(row, _)| row + 1)
            .unwrap_or(0)
    }
}

impl Primitive for RadioGroup {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        label_height(&self.label, settings)
            + self.rows(settings) as f32 * Self::row_height(settings)
            + settings.widget_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let y = draw_label(&self.label, canvas, settings, y);
        let row_height = Self::row_height(settings);
        let mut buttons = Vec::with_capacity(self.options.len());

        for (option, (row, offset)) in self.options.iter().zip(self.positions(settings)) {
            let top = y - row as f32 * row_height;
            let x = self.x + offset;
            let rect = Rect::new(x, top - BUTTON_SIZE, BUTTON_SIZE, BUTTON_SIZE);
            canvas.text(
                x + BUTTON_SIZE + BUTTON_TEXT_GAP,
                top - settings.body_size,
                FontStyle::Regular,
                settings.body_size,
                option,
            );
            buttons.push((option.clone(), rect));
        }
        canvas.add_widget(Widget::RadioGroup {
            name: self.name.clone(),
            options: buttons,
        });
        y - self.rows(settings) as f32 * row_height - settings.widget_gap
    }
}

/// Combo box. A blank first option is added when none of the options is blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Dropdown {
    pub name: String,
    pub label: Option<Label>,
    pub options: Vec<String>,
    pub x: f32,
}

impl Dropdown {
    pub fn new(name: impl Into<String>, label: Option<Label>, mut options: Vec<String>, x: f32) -> Self {
        if !options.iter().any(|o| o.trim().is_empty()) {
            options.insert(0, String::new());
        }
        Self {
            name: name.into(),
            label,
            options,
            x,
        }
    }

    fn width(&self, settings: &LayoutSettings) -> f32 {
        let widest = self
            .options
            .iter()
            .map(|o| text_width(o, FontStyle::Regular, settings.body_size))
            .fold(0.0, f32::max);
        let available = available_width(settings, self.x);
        (widest + 24.0).max(settings.narrow_field_width).min(available)
    }
}

impl Primitive for Dropdown {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        label_height(&self.label, settings) + settings.field_height + settings.widget_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let y = draw_label(&self.label, canvas, settings, y);
        let h = settings.field_height;
        canvas.add_widget(Widget::ComboBox {
            name: self.name.clone(),
            rect: Rect::new(self.x, y - h, self.width(settings), h),
            options: self.options.clone(),
        });
        y - h - settings.widget_gap
    }
}

/// Widget chosen for an enumerated field.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Radio(RadioGroup),
    Dropdown(Dropdown),
}

/// Radio buttons for short option lists, a dropdown otherwise.
pub fn selection(name: impl Into<String>, label: Option<Label>, options: Vec<String>, x: f32) -> Selection {
    if options.len() <= MAX_RADIO_OPTIONS {
        Selection::Radio(RadioGroup {
            name: name.into(),
            label,
            options,
            x,
        })
    } else {
        Selection::Dropdown(Dropdown::new(name, label, options, x))
    }
}

impl Primitive for Selection {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        match self {
            Selection::Radio(r) => r.height(settings),
            Selection::Dropdown(d) => d.height(settings),
        }
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        match self {
            Selection::Radio(r) => r.draw(canvas, settings, y),
            Selection::Dropdown(d) => d.draw(canvas, settings, y),
        }
    }
}

/// Form title with an optional logo on the left and the filing fee below.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub title: String,
    pub logo: Option<ImageAsset>,
    pub fee: f64,
}

impl Header {
    fn title_x(&self, settings: &LayoutSettings) -> f32 {
        match &self.logo {
            Some(logo) => settings.margin_left + logo.scaled_width(settings.logo_height) + 10.0,
            None => settings.margin_left,
        }
    }

    fn title(&self, settings: &LayoutSettings) -> Label {
        Label::new(self.title.clone(), self.title_x(settings))
            .font(FontStyle::Bold)
            .size(settings.title_size)
    }

    fn fee_line(&self, settings: &LayoutSettings) -> Label {
        Label::new(format!("Filing fee: ${:.2}", self.fee), self.title_x(settings))
            .size(settings.small_size)
    }

    fn block_height(&self, settings: &LayoutSettings) -> f32 {
        let text = self.title(settings).height(settings) + self.fee_line(settings).height(settings);
        match self.logo {
            Some(_) => text.max(settings.logo_height),
            None => text,
        }
    }
}

impl Primitive for Header {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.block_height(settings) + RULE_GAP + settings.section_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        if let Some(logo) = &self.logo {
            let width = logo.scaled_width(settings.logo_height);
            canvas.image(
                logo,
                Rect::new(settings.margin_left, y - settings.logo_height, width, settings.logo_height),
            );
        }
        let below_title = self.title(settings).draw(canvas, settings, y);
        self.fee_line(settings).draw(canvas, settings, below_title);

        let rule_y = y - self.block_height(settings) - RULE_GAP / 2.0;
        canvas.line(
            settings.margin_left,
            rule_y,
            settings.page_width - settings.margin_right,
            rule_y,
            0.75,
        );
        y - self.height(settings)
    }
}

/// Two paragraphs side by side under the header.
#[derive(Debug, Clone, PartialEq)]
pub struct TopNote {
    pub left: String,
    pub right: String,
}

impl From<&TopNoteConfig> for TopNote {
    fn from(config: &TopNoteConfig) -> Self {
        Self {
            left: config.left.clone(),
            right: config.right.clone(),
        }
    }
}

impl TopNote {
    fn columns(&self, settings: &LayoutSettings) -> (Vec<String>, Vec<String>) {
        let width = (settings.content_width() - COLUMN_GAP) / 2.0;
        (
            wrap_text(&self.left, FontStyle::Regular, settings.small_size, width),
            wrap_text(&self.right, FontStyle::Regular, settings.small_size, width),
        )
    }
}

impl Primitive for TopNote {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        let (left, right) = self.columns(settings);
        left.len().max(right.len()) as f32 * settings.leading(settings.small_size)
            + settings.section_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let size = settings.small_size;
        let leading = settings.leading(size);
        let right_x = settings.margin_left + (settings.content_width() + COLUMN_GAP) / 2.0;
        let (left, right) = self.columns(settings);

        for (x, lines) in [(settings.margin_left, &left), (right_x, &right)] {
            for (i, line) in lines.iter().enumerate() {
                canvas.text(x, y - i as f32 * leading - size, FontStyle::Regular, size, line);
            }
        }
        y - self.height(settings)
    }
}

/// Footer text drawn in the bottom margin.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub text: String,
}

impl Primitive for Footer {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        settings.leading(settings.small_size)
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let size = settings.small_size;
        canvas.text(settings.margin_left, y - size, FontStyle::Regular, size, &self.text);
        y - self.height(settings)
    }
}

/// "Page N", right-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageNumber {
    pub page: usize,
}

impl Primitive for PageNumber {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        settings.leading(settings.small_size)
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        let size = settings.small_size;
        let text = format!("Page {}", self.page);
        let x = settings.page_width - settings.margin_right - text_width(&text, FontStyle::Regular, size);
        canvas.text(x, y - size, FontStyle::Regular, size, &text);
        y - self.height(settings)
    }
}

/// Signature block: statement, one input per configured field, and a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Certification {
    pub statement: String,
    pub fields: Vec<String>,
    pub date_format: String,
}

impl From<&CertificationConfig> for Certification {
    fn from(config: &CertificationConfig) -> Self {
        Self {
            statement: config.statement.clone(),
            fields: config.fields.clone(),
            date_format: config.date_format.clone(),
        }
    }
}

impl Certification {
    fn stack(&self, settings: &LayoutSettings) -> Stack {
        let x = settings.margin_left;
        let mut stack = Stack::new()
            .push(
                Label::new("Certification", x)
                    .font(FontStyle::Bold)
                    .size(settings.heading_size),
            )
            .push(Spacer(settings.label_gap))
            .push(Label::new(self.statement.clone(), x))
            .push(Spacer(settings.widget_gap));

        for field in &self.fields {
            stack = stack.push(
                TextField::new(format!("certification_{}", slug(field)), x, 40)
                    .with_label(Label::new(field.clone(), x)),
            );
        }
        stack
            .push(
                TextField::new("certification_date", x, 10)
                    .with_label(Label::new(format!("Date ({})", self.date_format), x)),
            )
            .push(Spacer(settings.section_gap))
    }
}

impl Primitive for Certification {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.stack(settings).height(settings)
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        self.stack(settings).draw(canvas, settings, y)
    }
}

/// Date on which the filing takes effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveDate {
    pub label: String,
    pub date_format: String,
}

impl From<&EffectiveDateConfig> for EffectiveDate {
    fn from(config: &EffectiveDateConfig) -> Self {
        Self {
            label: config.label.clone(),
            date_format: config.date_format.clone(),
        }
    }
}

impl EffectiveDate {
    fn stack(&self, settings: &LayoutSettings) -> Stack {
        let x = settings.margin_left;
        Stack::new()
            .push(
                Label::new(self.label.clone(), x)
                    .font(FontStyle::Bold)
                    .size(settings.heading_size),
            )
            .push(Spacer(settings.label_gap))
            .push(
                Label::new(format!("Format: {}", self.date_format), x)
                    .font(FontStyle::Italic)
                    .size(settings.small_size),
            )
            .push(Spacer(settings.label_gap))
            .push(TextField::new("effective_date", x, 10))
            .push(Spacer(settings.section_gap))
    }
}

impl Primitive for EffectiveDate {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.stack(settings).height(settings)
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        self.stack(settings).draw(canvas, settings, y)
    }
}

/// One entry of the instructions appendix.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionBlock {
    pub field: String,
    pub description: Option<String>,
    pub examples: Vec<String>,
}

impl InstructionBlock {
    fn stack(&self, settings: &LayoutSettings) -> Stack {
        let x = settings.margin_left;
        let mut stack = Stack::new().push(Label::new(title_case(&self.field), x).font(FontStyle::Bold));
        if let Some(description) = &self.description {
            stack = stack.push(Label::new(description.clone(), x));
        }
        if !self.examples.is_empty() {
            stack = stack.push(Label::new("Examples:", x).font(FontStyle::Italic));
            for example in &self.examples {
                stack = stack.push(Label::new(
                    format!("\u{2022} {}", example),
                    x + settings.indent_step,
                ));
            }
        }
        stack.push(Spacer(settings.widget_gap))
    }
}

impl Primitive for InstructionBlock {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.stack(settings).height(settings)
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        self.stack(settings).draw(canvas, settings, y)
    }
}

/// Literal marker drawn in place of a field whose reference did not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMarker {
    pub field: String,
    pub target: String,
    pub reason: String,
    pub x: f32,
}

impl ErrorMarker {
    fn label(&self) -> Label {
        Label::new(
            format!(
                "{}: unresolved reference \"{}\" ({})",
                self.field, self.target, self.reason
            ),
            self.x,
        )
        .font(FontStyle::Italic)
    }
}

impl Primitive for ErrorMarker {
    fn height(&self, settings: &LayoutSettings) -> f32 {
        self.label().height(settings) + settings.widget_gap
    }

    fn draw(&self, canvas: &mut Canvas, settings: &LayoutSettings, y: f32) -> f32 {
        self.label().draw(canvas, settings, y) - settings.widget_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LayoutSettings {
        LayoutSettings::default()
    }

    fn assert_lockstep(p: &dyn Primitive) {
        let s = settings();
        let mut canvas = Canvas::new(s.page_width, s.page_height);
        let y = s.top();
        let end = p.draw(&mut canvas, &s, y);
        assert!(
            ((y - end) - p.height(&s)).abs() < 0.001,
            "drew {} but measured {}",
            y - end,
            p.height(&s)
        );
    }

    fn options(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Option {}", i)).collect()
    }

    #[test]
    fn measurement_matches_drawing() {
        let s = settings();
        let x = s.margin_left;
        let long = "word ".repeat(80);

        assert_lockstep(&Label::new(long.clone(), x));
        assert_lockstep(&Label::new("", x));
        assert_lockstep(&Spacer(7.5));
        assert_lockstep(&TextField::new("a", x, 10).with_label(Label::new("Name", x)));
        assert_lockstep(&TextField::new("b", x + 24.0, 900));
        assert_lockstep(&CheckBox::new("c", "I agree to the terms", x));
        assert_lockstep(&selection("d", Some(Label::new("Colour", x)), options(3), x));
        assert_lockstep(&selection("e", None, options(12), x));
        assert_lockstep(&RadioGroup {
            name: "f".into(),
            label: None,
            options: (0..4).map(|_| "A rather long option label".to_string()).collect(),
            x,
        });
        assert_lockstep(&Header {
            title: "Notice of Change of Business Name".into(),
            logo: None,
            fee: 30.0,
        });
        assert_lockstep(&TopNote {
            left: long.clone(),
            right: "Short".into(),
        });
        assert_lockstep(&Footer { text: "Footer".into() });
        assert_lockstep(&PageNumber { page: 3 });
        assert_lockstep(&Certification::from(&CertificationConfig::default()));
        assert_lockstep(&EffectiveDate::from(&EffectiveDateConfig::default()));
        assert_lockstep(&InstructionBlock {
            field: "legal_name".into(),
            description: Some(long),
            examples: vec!["Acme Ltd.".into(), "Widgets Inc.".into()],
        });
        assert_lockstep(&ErrorMarker {
            field: "owner".into(),
            target: "missing#/x".into(),
            reason: "unknown schema id".into(),
            x,
        });
    }

    #[test]
    fn field_size_tiers() {
        let s = settings();
        let available = s.content_width();

        let narrow = FieldSize::for_length(29, &s, available);
        assert_eq!((narrow.width, narrow.lines), (s.narrow_field_width, 1));

        let medium = FieldSize::for_length(30, &s, available);
        assert_eq!((medium.width, medium.lines), (s.medium_field_width, 1));

        let wide = FieldSize::for_length(60, &s, available);
        assert_eq!((wide.width, wide.lines), (available, 1));
        assert!(!wide.multiline());

        let tall = FieldSize::for_length(1200, &s, available);
        assert_eq!(tall.lines, 3);
        assert!(tall.multiline());
    }

    #[test]
    fn short_enums_become_radio_groups() {
        for n in 2..=4 {
            assert!(matches!(selection("f", None, options(n), 0.0), Selection::Radio(_)));
        }
    }

    #[test]
    fn long_enums_become_dropdowns_with_blank_first() {
        let Selection::Dropdown(d) = selection("f", None, options(5), 0.0) else {
            panic!("expected dropdown");
        };
        assert_eq!(d.options.len(), 6);
        assert_eq!(d.options[0], "");

        let mut with_blank = options(5);
        with_blank.push(String::new());
        let Selection::Dropdown(d) = selection("f", None, with_blank, 0.0) else {
            panic!("expected dropdown");
        };
        assert_eq!(d.options.len(), 6);
        assert_eq!(d.options[0], "Option 1");
    }

    #[test]
    fn radio_options_wrap_onto_rows() {
        let s = settings();
        let group = RadioGroup {
            name: "g".into(),
            label: None,
            options: (0..4).map(|_| "x".repeat(40)).collect(),
            x: s.margin_left,
        };
        assert!(group.rows(&s) > 1);
    }

    #[test]
    fn text_field_widget_is_placed() {
        let s = settings();
        let mut canvas = Canvas::new(s.page_width, s.page_height);
        TextField::new("notes", s.margin_left, 1000).draw(&mut canvas, &s, s.top());
        let widgets: Vec<_> = canvas.widgets().collect();
        assert_eq!(widgets.len(), 1);
        match widgets[0].1 {
            Widget::Text { name, multiline, .. } => {
                assert_eq!(name, "notes");
                assert!(*multiline);
            }
            other => panic!("unexpected widget {:?}", other),
        }
    }

    #[test]
    fn slug_names() {
        assert_eq!(slug("Name of authorized person"), "name_of_authorized_person");
        assert_eq!(slug("Title"), "title");
    }
}
