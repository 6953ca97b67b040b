//! Page canvas: content operations and interactive widgets, written out with lopdf.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ColorType, GenericImageView, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::config::FontStyle;
use crate::error::RenderError;
use crate::layout::metrics::{encode_win_ansi, font_resource};

/// Axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    fn to_object(self) -> Object {
        Object::Array(vec![
            real(self.x),
            real(self.y),
            real(self.x + self.width),
            real(self.y + self.height),
        ])
    }
}

/// A fillable form field placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Text {
        name: String,
        rect: Rect,
        multiline: bool,
    },
    CheckBox {
        name: String,
        rect: Rect,
    },
    RadioGroup {
        name: String,
        /// Option label and the rect of its button.
        options: Vec<(String, Rect)>,
    },
    ComboBox {
        name: String,
        rect: Rect,
        options: Vec<String>,
    },
}

impl Widget {
    pub fn name(&self) -> &str {
        match self {
            Widget::Text { name, .. }
            | Widget::CheckBox { name, .. }
            | Widget::RadioGroup { name, .. }
            | Widget::ComboBox { name, .. } => name,
        }
    }

    fn set_name(&mut self, new_name: String) {
        match self {
            Widget::Text { name, .. }
            | Widget::CheckBox { name, .. }
            | Widget::RadioGroup { name, .. }
            | Widget::ComboBox { name, .. } => *name = new_name,
        }
    }

    /// Rects occupied on the page.
    pub fn rects(&self) -> Vec<Rect> {
        match self {
            Widget::Text { rect, .. } | Widget::CheckBox { rect, .. } | Widget::ComboBox { rect, .. } => {
                vec![*rect]
            }
            Widget::RadioGroup { options, .. } => options.iter().map(|(_, r)| *r).collect(),
        }
    }
}

/// How an image's bytes are stored in the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// The original JPEG file, embedded as-is with `DCTDecode`.
    Dct,
    /// Decoded 8-bit samples, compressed with `FlateDecode` on output.
    Raw,
}

/// An image drawn on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub encoding: ImageEncoding,
}

impl ImageAsset {
    /// Load an image file. JPEGs are kept as they are; other formats are
    /// decoded to gray or RGB samples.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Asset` if the file cannot be read and
    /// `RenderError::Image` if it cannot be decoded.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|_| RenderError::Asset {
            path: path.to_path_buf(),
        })?;
        Self::from_bytes(path, data)
    }

    fn from_bytes(path: &Path, data: Vec<u8>) -> Result<Self, RenderError> {
        let invalid = |message: String| RenderError::Image {
            path: path.to_path_buf(),
            message,
        };

        let reader = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| invalid(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| invalid("unrecognised image format".to_string()))?;
        let decoded = reader.decode().map_err(|e| invalid(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        let gray = matches!(
            decoded.color(),
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
        );

        if format == ImageFormat::Jpeg {
            return Ok(Self {
                path: path.to_path_buf(),
                data,
                width,
                height,
                color_space: if gray { "DeviceGray" } else { "DeviceRGB" },
                encoding: ImageEncoding::Dct,
            });
        }

        let (samples, color_space) = if gray {
            (decoded.to_luma8().into_raw(), "DeviceGray")
        } else {
            (decoded.to_rgb8().into_raw(), "DeviceRGB")
        };
        Ok(Self {
            path: path.to_path_buf(),
            data: samples,
            width,
            height,
            color_space,
            encoding: ImageEncoding::Raw,
        })
    }

    /// Width when scaled to `height` points tall.
    pub fn scaled_width(&self, height: f32) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 * height / self.height as f32
    }

    fn to_stream(&self) -> Result<Stream, RenderError> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(self.width as i64),
            "Height" => Object::Integer(self.height as i64),
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => Object::Integer(8),
        };
        match self.encoding {
            ImageEncoding::Dct => {
                dict.set("Filter", "DCTDecode");
                Ok(Stream::new(dict, self.data.clone()))
            }
            ImageEncoding::Raw => {
                let mut stream = Stream::new(dict, self.data.clone());
                stream.compress()?;
                Ok(stream)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Page {
    operations: Vec<Operation>,
    widgets: Vec<Widget>,
}

/// Drawing surface collecting finished pages.
///
/// Coordinates are PDF points with the origin at the bottom-left corner.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: f32,
    height: f32,
    finished: Vec<Page>,
    current: Page,
    images: Vec<ImageAsset>,
    field_names: HashSet<String>,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            finished: Vec::new(),
            current: Page::default(),
            images: Vec::new(),
            field_names: HashSet::new(),
        }
    }

    /// Draw one line of text with its baseline at `y`.
    pub fn text(&mut self, x: f32, y: f32, font: FontStyle, size: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        let ops = &mut self.current.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font_resource(font).as_bytes().to_vec()), real(size)],
        ));
        ops.push(Operation::new("Td", vec![real(x), real(y)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        let ops = &mut self.current.operations;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("w", vec![real(width)]));
        ops.push(Operation::new("m", vec![real(x1), real(y1)]));
        ops.push(Operation::new("l", vec![real(x2), real(y2)]));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f32) {
        let ops = &mut self.current.operations;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("w", vec![real(width)]));
        ops.push(Operation::new(
            "re",
            vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
        ));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Draw an image scaled into `rect`.
    pub fn image(&mut self, asset: &ImageAsset, rect: Rect) {
        let index = match self.images.iter().position(|a| a.path == asset.path) {
            Some(i) => i,
            None => {
                self.images.push(asset.clone());
                self.images.len() - 1
            }
        };
        let ops = &mut self.current.operations;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                real(rect.width),
                real(0.0),
                real(0.0),
                real(rect.height),
                real(rect.x),
                real(rect.y),
            ],
        ));
        ops.push(Operation::new(
            "Do",
            vec![Object::Name(image_name(index).into_bytes())],
        ));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Place a form field, renaming it if the name is already taken.
    pub fn add_widget(&mut self, mut widget: Widget) -> String {
        let base = if widget.name().is_empty() {
            "field".to_string()
        } else {
            widget.name().to_string()
        };
        let mut name = base.clone();
        let mut n = 2;
        while self.field_names.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        self.field_names.insert(name.clone());
        widget.set_name(name.clone());
        self.current.widgets.push(widget);
        name
    }

    /// Finish the current page and start a new one.
    pub fn show_page(&mut self) {
        self.finished.push(std::mem::take(&mut self.current));
    }

    /// Number of finished pages.
    pub fn page_count(&self) -> usize {
        self.finished.len()
    }

    /// 1-based number of the page being drawn.
    pub fn current_page_number(&self) -> usize {
        self.finished.len() + 1
    }

    pub fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// All widgets with the 0-based index of their page.
    pub fn widgets(&self) -> impl Iterator<Item = (usize, &Widget)> {
        self.finished
            .iter()
            .chain(std::iter::once(&self.current))
            .enumerate()
            .flat_map(|(i, page)| page.widgets.iter().map(move |w| (i, w)))
    }

    /// Text drawn on a page, one entry per text run.
    pub fn page_text(&self, index: usize) -> Vec<String> {
        let page = if index < self.finished.len() {
            &self.finished[index]
        } else if index == self.finished.len() {
            &self.current
        } else {
            return Vec::new();
        };
        page.operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    /// Assemble a PDF document with an interactive form.
    pub fn to_document(&self) -> Result<Document, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let helvetica = doc.add_object(standard_font("Helvetica"));
        let helvetica_bold = doc.add_object(standard_font("Helvetica-Bold"));
        let helvetica_oblique = doc.add_object(standard_font("Helvetica-Oblique"));
        let zapf = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "ZapfDingbats",
        });

        let mut xobjects = Dictionary::new();
        for (i, asset) in self.images.iter().enumerate() {
            let image_id = doc.add_object(asset.to_stream()?);
            xobjects.set(image_name(i), image_id);
        }

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => helvetica,
                "F2" => helvetica_bold,
                "F3" => helvetica_oblique,
            },
            "XObject" => xobjects,
        };
        let fonts = FormFonts {
            helvetica,
            zapf,
        };

        let mut kids = Vec::new();
        let mut fields = Vec::new();
        let mut pages: Vec<&Page> = self.finished.iter().collect();
        if !self.current.operations.is_empty() || !self.current.widgets.is_empty() {
            pages.push(&self.current);
        }

        for page in pages {
            let page_id = doc.new_object_id();
            let content = Content {
                operations: page.operations.clone(),
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

            let mut annots = Vec::new();
            for widget in &page.widgets {
                write_widget(&mut doc, widget, page_id, &fonts, &mut annots, &mut fields)?;
            }

            doc.objects.insert(
                page_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => Rect::new(0.0, 0.0, self.width, self.height).to_object(),
                    "Contents" => content_id,
                    "Resources" => resources.clone(),
                    "Annots" => annots.into_iter().map(Object::Reference).collect::<Vec<_>>(),
                }),
            );
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(count),
            }),
        );

        let acro_form = doc.add_object(dictionary! {
            "Fields" => fields.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "NeedAppearances" => true,
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "DR" => dictionary! {
                "Font" => dictionary! {
                    "Helv" => helvetica,
                    "ZaDb" => zapf,
                },
            },
        });
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acro_form,
        });
        doc.trailer.set("Root", catalog);
        Ok(doc)
    }

    /// Serialise the PDF to memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.to_document()?;
        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(|source| RenderError::Io {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        Ok(out)
    }

    /// Write the PDF to `path`.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

struct FormFonts {
    helvetica: ObjectId,
    zapf: ObjectId,
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn standard_font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Export value for a radio option: alphanumerics only, unique within the group.
fn export_name(option: &str, index: usize, used: &mut HashSet<String>) -> String {
    let cleaned: String = option
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let name = if cleaned.is_empty() || used.contains(&cleaned) || cleaned == "Off" {
        format!("opt{}", index + 1)
    } else {
        cleaned
    };
    used.insert(name.clone());
    name
}

/// Form XObject used as a widget appearance.
fn appearance(
    doc: &mut Document,
    rect: Rect,
    fonts: &FormFonts,
    glyph: Option<&str>,
) -> Result<ObjectId, RenderError> {
    let mut operations = Vec::new();
    if let Some(glyph) = glyph {
        let size = rect.height * 0.8;
        operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"ZaDb".to_vec()), real(size)]),
            Operation::new(
                "Td",
                vec![real(rect.width * 0.15), real(rect.height * 0.2)],
            ),
            Operation::new("Tj", vec![Object::string_literal(glyph)]),
            Operation::new("ET", vec![]),
        ];
    }
    let bytes = Content { operations }.encode()?;
    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => Rect::new(0.0, 0.0, rect.width, rect.height).to_object(),
            "Resources" => dictionary! {
                "Font" => dictionary! { "ZaDb" => fonts.zapf },
            },
        },
        bytes,
    )))
}

fn write_widget(
    doc: &mut Document,
    widget: &Widget,
    page_id: ObjectId,
    fonts: &FormFonts,
    annots: &mut Vec<ObjectId>,
    fields: &mut Vec<ObjectId>,
) -> Result<(), RenderError> {
    let border = dictionary! {
        "BC" => vec![real(0.4)],
        "BG" => vec![real(1.0)],
    };

    match widget {
        Widget::Text {
            name,
            rect,
            multiline,
        } => {
            let flags = if *multiline { 1 << 12 } else { 0 };
            let id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "FT" => "Tx",
                "T" => Object::string_literal(name.as_str()),
                "Rect" => rect.to_object(),
                "F" => Object::Integer(4),
                "P" => page_id,
                "Ff" => Object::Integer(flags),
                "DA" => Object::string_literal(format!("/Helv {} Tf 0 g", if *multiline { 10 } else { 0 })),
                "MK" => border,
            });
            annots.push(id);
            fields.push(id);
        }
        Widget::CheckBox { name, rect } => {
            let on = appearance(doc, *rect, fonts, Some("4"))?;
            let off = appearance(doc, *rect, fonts, None)?;
            let id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "FT" => "Btn",
                "T" => Object::string_literal(name.as_str()),
                "Rect" => rect.to_object(),
                "F" => Object::Integer(4),
                "P" => page_id,
                "V" => "Off",
                "AS" => "Off",
                "DA" => Object::string_literal("/ZaDb 0 Tf 0 g"),
                "MK" => dictionary! {
                    "BC" => vec![real(0.0)],
                    "CA" => Object::string_literal("4"),
                },
                "AP" => dictionary! {
                    "N" => dictionary! { "Yes" => on, "Off" => off },
                },
            });
            annots.push(id);
            fields.push(id);
        }
        Widget::RadioGroup { name, options } => {
            let parent_id = doc.new_object_id();
            let mut kids = Vec::new();
            let mut used = HashSet::new();
            for (i, (label, rect)) in options.iter().enumerate() {
                let export = export_name(label, i, &mut used);
                let on = appearance(doc, *rect, fonts, Some("l"))?;
                let off = appearance(doc, *rect, fonts, None)?;
                let mut normal = Dictionary::new();
                normal.set(export.as_bytes().to_vec(), on);
                normal.set("Off", off);
                let kid = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "Parent" => parent_id,
                    "Rect" => rect.to_object(),
                    "F" => Object::Integer(4),
                    "P" => page_id,
                    "AS" => "Off",
                    "TU" => Object::string_literal(label.as_str()),
                    "MK" => dictionary! {
                        "BC" => vec![real(0.0)],
                        "CA" => Object::string_literal("l"),
                    },
                    "AP" => dictionary! { "N" => normal },
                });
                annots.push(kid);
                kids.push(Object::Reference(kid));
            }
            doc.objects.insert(
                parent_id,
                Object::Dictionary(dictionary! {
                    "FT" => "Btn",
                    // Radio | NoToggleToOff
                    "Ff" => Object::Integer((1 << 15) | (1 << 14)),
                    "T" => Object::string_literal(name.as_str()),
                    "V" => "Off",
                    "DA" => Object::string_literal("/ZaDb 0 Tf 0 g"),
                    "Kids" => kids,
                }),
            );
            fields.push(parent_id);
        }
        Widget::ComboBox {
            name,
            rect,
            options,
        } => {
            let opts: Vec<Object> = options
                .iter()
                .map(|o| Object::String(encode_win_ansi(o), StringFormat::Literal))
                .collect();
            let first = options.first().cloned().unwrap_or_default();
            let id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "FT" => "Ch",
                // Combo
                "Ff" => Object::Integer(1 << 17),
                "T" => Object::string_literal(name.as_str()),
                "Rect" => rect.to_object(),
                "F" => Object::Integer(4),
                "P" => page_id,
                "Opt" => opts,
                "V" => Object::String(encode_win_ansi(&first), StringFormat::Literal),
                "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
                "MK" => border,
            });
            annots.push(id);
            fields.push(id);
        }
    }
    Ok(())
}
