//! Walks a property tree and lays it out across pages.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::{FontStyle, FormConfig, Module, RenderConfig, SectionEntry};
use crate::error::RenderError;
use crate::layout::canvas::{Canvas, ImageAsset};
use crate::layout::primitives::{
    selection, Certification, CheckBox, EffectiveDate, ErrorMarker, Footer, Header,
    InstructionBlock, Label, PageNumber, Primitive, Spacer, TextField, TopNote,
};
use crate::layout::LayoutSettings;
use crate::path::{FieldPath, Segment};
use crate::schema::{title_case, FieldDescriptor, NodeMap, SchemaNode, JUMP_KEYS, TEXT_TYPES};

/// Keywords whose object values are never rendered as fields.
const NON_FIELD_KEYS: &[&str] = &[
    "definitions",
    "$defs",
    "else",
    "not",
    "anyOf",
    "oneOf",
    "dependencies",
    "dependentSchemas",
    "patternProperties",
    "propertyNames",
    "contains",
    "const",
    "default",
    "additionalProperties",
];

/// Generation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Header,
    Body,
    Instructions,
    Finalized,
}

/// Help text collected for the instructions appendix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instruction {
    pub description: Option<String>,
    pub examples: Vec<String>,
}

/// Mutable state of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCursor {
    pub y: f32,
    /// 1-based page being drawn.
    pub page: usize,
    /// Field paths already drawn.
    pub rendered: HashSet<String>,
    /// Keyed by simple field name, in first-seen order.
    pub instructions: IndexMap<String, Instruction>,
    pub page_breaks: usize,
}

impl RenderCursor {
    fn new(settings: &LayoutSettings) -> Self {
        Self {
            y: settings.top(),
            page: 1,
            rendered: HashSet::new(),
            instructions: IndexMap::new(),
            page_breaks: 0,
        }
    }
}

/// Lays out one form.
pub struct Generator<'a> {
    form: String,
    config: &'a FormConfig,
    fee: f64,
    settings: &'a LayoutSettings,
    canvas: Canvas,
    cursor: RenderCursor,
    phase: Phase,
    modules_drawn: HashSet<Module>,
}

impl<'a> Generator<'a> {
    pub fn new(
        form: impl Into<String>,
        config: &'a FormConfig,
        fee: f64,
        settings: &'a LayoutSettings,
    ) -> Self {
        Self {
            form: form.into(),
            config,
            fee,
            settings,
            canvas: Canvas::new(settings.page_width, settings.page_height),
            cursor: RenderCursor::new(settings),
            phase: Phase::Idle,
            modules_drawn: HashSet::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> &RenderCursor {
        &self.cursor
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    /// Draw `primitive` at the cursor, starting a new page first when it
    /// would cross the bottom margin.
    pub fn place(&mut self, primitive: &dyn Primitive) {
        let height = primitive.height(self.settings);
        // A primitive taller than a page is drawn at the top rather than
        // breaking forever.
        if self.cursor.y - height < self.settings.margin_bottom && self.cursor.y < self.settings.top() {
            self.break_page();
        }
        self.cursor.y = primitive.draw(&mut self.canvas, self.settings, self.cursor.y);
    }

    /// Lay out `tree` and close the last page.
    pub fn render(&mut self, tree: &SchemaNode) -> Result<(), RenderError> {
        if self.phase != Phase::Idle {
            warn!("form {} already rendered", self.form);
            return Ok(());
        }
        let config = self.config;

        self.phase = Phase::Header;
        if self.wants_header() {
            self.draw_module(Module::Header)?;
        }
        if config.has_module(Module::TopNote) && !in_section_order(config, Module::TopNote) {
            self.draw_module(Module::TopNote)?;
        }

        self.phase = Phase::Body;
        if config.is_empty() {
            if let Some(map) = tree.as_object() {
                self.render_children(map, &FieldPath::root(), 0);
            }
        } else {
            self.walk_configured(tree)?;
        }

        self.phase = Phase::Instructions;
        self.render_instructions();

        self.draw_footer();
        self.canvas.show_page();
        self.phase = Phase::Finalized;
        debug!(
            "form {} laid out on {} page(s)",
            self.form,
            self.canvas.page_count()
        );
        Ok(())
    }

    fn wants_header(&self) -> bool {
        self.config.is_empty()
            || self.config.has_module(Module::Header)
            || in_section_order(self.config, Module::Header)
    }

    fn title(&self) -> String {
        self.config
            .title
            .clone()
            .unwrap_or_else(|| title_case(&self.form))
    }

    fn walk_configured(&mut self, tree: &SchemaNode) -> Result<(), RenderError> {
        let config = self.config;

        for entry in &config.section_order {
            match entry {
                SectionEntry::Module(module) => self.draw_module(*module)?,
                SectionEntry::Field(path) => match lookup_field(tree, path) {
                    Some(node) => {
                        let depth = path.fields().count().saturating_sub(1);
                        self.render_field(path, node, depth);
                    }
                    None => warn!("form {}: section {} not found in schema", self.form, path),
                },
            }
        }

        // Anything the section order did not reach.
        if let Some(map) = tree.as_object() {
            self.render_children(map, &FieldPath::root(), 0);
        }

        for module in [Module::EffectiveDate, Module::Certification] {
            if config.has_module(module) {
                self.draw_module(module)?;
            }
        }
        Ok(())
    }

    fn draw_module(&mut self, module: Module) -> Result<(), RenderError> {
        if !self.modules_drawn.insert(module) {
            return Ok(());
        }
        let config = self.config;
        match module {
            Module::Header => {
                let logo = match &config.logo {
                    Some(path) => Some(ImageAsset::load(path)?),
                    None => None,
                };
                let header = Header {
                    title: self.title(),
                    logo,
                    fee: self.fee,
                };
                self.place(&header);
            }
            Module::TopNote => match &config.top_note {
                Some(note) => self.place(&TopNote::from(note)),
                None => warn!("form {}: top_note module has no text", self.form),
            },
            // Drawn on every page when the page is finished.
            Module::Footer => {}
            Module::Certification => {
                let cert = config.certification.clone().unwrap_or_default();
                self.place(&Certification::from(&cert));
            }
            Module::EffectiveDate => {
                let date = config.effective_date.clone().unwrap_or_default();
                self.place(&EffectiveDate::from(&date));
            }
        }
        Ok(())
    }

    fn render_children(&mut self, map: &NodeMap, parent: &FieldPath, depth: usize) {
        for (name, node) in field_children(map) {
            self.render_field(&parent.child(name), node, depth);
        }
    }

    fn render_field(&mut self, path: &FieldPath, node: &SchemaNode, depth: usize) {
        if !self.cursor.rendered.insert(path.to_string()) {
            return;
        }
        let settings = self.settings;
        let x = settings.margin_left + settings.indent(depth);

        let map = match node {
            SchemaNode::Object(map) => map,
            SchemaNode::Ref(r) => {
                let reason = r.error.clone().unwrap_or_else(|| "unresolved".to_string());
                self.place(&ErrorMarker {
                    field: path.to_string(),
                    target: r.target.clone(),
                    reason,
                    x,
                });
                return;
            }
            SchemaNode::Array(items) => {
                for item in items {
                    if let Some(map) = item.as_object() {
                        self.render_children(map, path, depth);
                    }
                }
                return;
            }
            SchemaNode::Leaf(_) => return,
        };

        let config = self.config;
        let render = config.render_config(path);
        let label = self.label_for(path, map, render);
        let name = self.widget_name(path);
        let children = field_children(map);
        let field_type = map.field_type();

        if children.is_empty() && field_type != Some("array") {
            self.record_instruction(path, map);
        }

        if let Some(options) = map.enum_options().filter(|o| !o.is_empty()) {
            self.place(&selection(name, Some(label), options, x));
            return;
        }

        match field_type {
            Some("boolean") => {
                let mut checkbox = CheckBox::new(name, label.text, x);
                checkbox.font = label.font;
                self.place(&checkbox);
            }
            Some("array") => {
                let reps = render.and_then(|r| r.reps).unwrap_or(1);
                match map.get("items") {
                    Some(item) => {
                        self.place(&label.font(group_font(render)));
                        for i in 0..reps {
                            self.render_field(&path.index(i), item, depth + 1);
                        }
                    }
                    None => self.place(&TextField::new(name, x, field_length(map)).with_label(label)),
                }
            }
            _ if !children.is_empty() => {
                let mut heading = label.font(group_font(render));
                if depth == 0 && heading.size.is_none() {
                    heading = heading.size(settings.heading_size);
                }
                self.place(&heading);
                self.place(&Spacer(settings.label_gap));
                for (child, node) in children {
                    self.render_field(&path.child(child), node, depth + 1);
                }
            }
            Some("object") => self.place(&label.font(group_font(render))),
            Some(t) if !TEXT_TYPES.contains(&t) => {
                debug!("field {} has type {}; rendering as text", path, t);
                self.place(&TextField::new(name, x, field_length(map)).with_label(label));
            }
            _ => self.place(&TextField::new(name, x, field_length(map)).with_label(label)),
        }
    }

    /// Label text from the render config, the schema title, or the field name.
    fn label_for(&self, path: &FieldPath, map: &NodeMap, render: Option<&RenderConfig>) -> Label {
        let settings = self.settings;
        let depth = path.fields().count().saturating_sub(1);
        let x = settings.margin_left + settings.indent(depth);

        let base = render
            .and_then(|r| r.label.clone())
            .or_else(|| map.title().map(str::to_string))
            .unwrap_or_else(|| title_case(path.last_field().unwrap_or(&self.form)));
        let text = match path.segments().last() {
            Some(Segment::Index(i)) => format!("{} #{}", base, i + 1),
            _ => base,
        };

        let mut label = Label::new(text, x);
        if let Some(font) = render.and_then(|r| r.font) {
            label = label.font(font);
        }
        if let Some(size) = render.and_then(|r| r.font_size) {
            label = label.size(size);
        }
        label
    }

    fn widget_name(&self, path: &FieldPath) -> String {
        if path.is_root() {
            output_stem(&self.form)
        } else {
            path.field_name()
        }
    }

    fn record_instruction(&mut self, path: &FieldPath, map: &NodeMap) {
        let description = map.description().map(str::to_string);
        let examples = map.examples();
        if description.is_none() && examples.is_empty() {
            return;
        }
        // Keyed by simple name: the first field with that name keeps the entry
        let key = path.last_field().unwrap_or(&self.form).to_string();
        self.cursor
            .instructions
            .entry(key)
            .or_insert(Instruction {
                description,
                examples,
            });
    }

    fn render_instructions(&mut self) {
        if self.cursor.instructions.is_empty() {
            return;
        }
        if self.cursor.y < self.settings.top() {
            self.break_page();
        }
        let settings = self.settings;
        self.place(
            &Label::new("Instructions", settings.margin_left)
                .font(FontStyle::Bold)
                .size(settings.title_size),
        );
        self.place(&Spacer(settings.section_gap));

        let entries: Vec<(String, Instruction)> = self
            .cursor
            .instructions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (field, instruction) in entries {
            self.place(&InstructionBlock {
                field,
                description: instruction.description,
                examples: instruction.examples,
            });
        }
    }

    fn draw_footer(&mut self) {
        let settings = self.settings;
        let y = settings.footer_top();
        if self.config.is_empty() || self.config.has_module(Module::Footer) {
            let text = self
                .config
                .footer
                .as_ref()
                .map(|f| f.text.clone())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.title());
            Footer { text }.draw(&mut self.canvas, settings, y);
        }
        PageNumber {
            page: self.cursor.page,
        }
        .draw(&mut self.canvas, settings, y);
    }

    fn break_page(&mut self) {
        debug!(
            "form {}: page break after page {} at y={:.1}",
            self.form, self.cursor.page, self.cursor.y
        );
        self.draw_footer();
        self.canvas.show_page();
        self.cursor.page += 1;
        self.cursor.page_breaks += 1;
        self.cursor.y = self.settings.top();
    }
}

fn in_section_order(config: &FormConfig, module: Module) -> bool {
    config
        .section_order
        .iter()
        .any(|e| *e == SectionEntry::Module(module))
}

fn group_font(render: Option<&RenderConfig>) -> FontStyle {
    render.and_then(|r| r.font).unwrap_or(FontStyle::Bold)
}

/// Expected value length: `maxLength`, else the longest example.
fn field_length(map: &NodeMap) -> usize {
    map.max_length().unwrap_or_else(|| {
        map.examples()
            .iter()
            .map(|e| e.chars().count())
            .max()
            .unwrap_or(0)
    })
}

/// Named children of a field, looking through jump keys.
fn field_children(map: &NodeMap) -> Vec<(&str, &SchemaNode)> {
    let mut children = Vec::new();
    for (key, node) in map {
        if JUMP_KEYS.contains(&key.as_str()) {
            match node {
                SchemaNode::Object(inner) => children.extend(field_children(inner)),
                SchemaNode::Array(items) => {
                    for item in items.iter().filter_map(SchemaNode::as_object) {
                        children.extend(field_children(item));
                    }
                }
                _ => {}
            }
            continue;
        }
        if NON_FIELD_KEYS.contains(&key.as_str()) {
            continue;
        }
        if matches!(node, SchemaNode::Object(_) | SchemaNode::Ref(_)) {
            children.push((key.as_str(), node));
        }
    }
    children
}

fn find_child<'t>(node: &'t SchemaNode, name: &str) -> Option<&'t SchemaNode> {
    let map = node.as_object()?;
    if let Some(child) = map.get(name) {
        return Some(child);
    }
    JUMP_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(|inner| match inner {
            SchemaNode::Array(items) => items.iter().find_map(|i| find_child(i, name)),
            other => find_child(other, name),
        })
}

/// Find the node for a field path, looking through jump keys.
fn lookup_field<'t>(tree: &'t SchemaNode, path: &FieldPath) -> Option<&'t SchemaNode> {
    let mut current = tree;
    for segment in path.segments() {
        current = match segment {
            Segment::Field(name) => find_child(current, name)?,
            Segment::Index(_) => current.get("items").unwrap_or(current),
        };
    }
    Some(current)
}

/// File stem for a form id.
pub fn output_stem(form: &str) -> String {
    let stem: String = form
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "form".to_string()
    } else {
        stem
    }
}

/// `dir/stem.pdf`, or `dir/stem_N.pdf` with the first free N.
pub fn unique_output_path(dir: &Path, stem: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.pdf", stem));
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{}_{}.pdf", stem, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
