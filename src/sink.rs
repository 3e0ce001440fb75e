//! Page-level drawing seam. Layout code only ever talks to a `PageSink`;
//! the PDF backend and the recording double used by tests both implement it.
//!
//! Coordinates are millimetres from the top-left corner of the page.

use crate::assets::RasterImage;
use crate::fonts::{FontStyle, PT_PER_MM};

/// Fraction of the em box above the baseline.
pub const ASCENT: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub(crate) fn components(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontStyle,
    /// Points.
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self {
            font: FontStyle::Regular,
            size,
            color: Rgb::BLACK,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            font: FontStyle::Bold,
            size,
            color: Rgb::BLACK,
        }
    }

    pub fn with_color(self, color: Rgb) -> Self {
        Self { color, ..self }
    }

    /// Height of the em box in millimetres.
    pub fn em_mm(&self) -> f32 {
        self.size / PT_PER_MM
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Single line of already-normalised text; the position is the top of its em box.
    Text { text: String, style: TextStyle },
    Rect { width: f32, height: f32, fill: Rgb },
    /// Horizontal line.
    Rule { width: f32, thickness: f32, color: Rgb },
    Image { key: String, width: f32, height: f32 },
}

impl Primitive {
    /// `(width, height)` in millimetres.
    pub fn extent(&self) -> (f32, f32) {
        match self {
            Primitive::Text { text, style } => (
                crate::fonts::text_width_mm(text, style.font, style.size),
                style.em_mm(),
            ),
            Primitive::Rect { width, height, .. } => (*width, *height),
            Primitive::Rule {
                width, thickness, ..
            } => (*width, *thickness),
            Primitive::Image { width, height, .. } => (*width, *height),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Primitive::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

pub trait PageSink {
    /// Append a blank page; subsequent `place` calls may target it.
    fn new_page(&mut self);

    fn page_count(&self) -> usize;

    /// Draw `primitive` on the zero-based `page`.
    fn place(&mut self, page: usize, at: Point, primitive: Primitive);

    /// Make `image` available to `Primitive::Image { key, .. }`.
    fn register_image(&mut self, key: &str, image: &RasterImage);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placed {
    pub at: Point,
    pub primitive: Primitive,
}

/// Keeps every placed primitive, page by page, without encoding anything.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub pages: Vec<Vec<Placed>>,
    pub images: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text primitives in drawing order, with their zero-based page index.
    pub fn texts(&self) -> impl Iterator<Item = (usize, &Placed, &str)> {
        self.pages.iter().enumerate().flat_map(|(page, placed)| {
            placed
                .iter()
                .filter_map(move |p| p.primitive.as_text().map(|t| (page, p, t)))
        })
    }

    pub fn page_texts(&self, page: usize) -> Vec<&str> {
        self.pages
            .get(page)
            .map(|placed| {
                placed
                    .iter()
                    .filter_map(|p| p.primitive.as_text())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|(_, _, t)| t.contains(needle))
    }

    /// First page and y position where `needle` appears exactly.
    pub fn find_text(&self, needle: &str) -> Option<(usize, f32)> {
        self.texts()
            .find(|(_, _, t)| *t == needle)
            .map(|(page, p, _)| (page, p.at.y))
    }
}

impl PageSink for RecordingSink {
    fn new_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn place(&mut self, page: usize, at: Point, primitive: Primitive) {
        if let Some(placed) = self.pages.get_mut(page) {
            placed.push(Placed { at, primitive });
        }
    }

    fn register_image(&mut self, key: &str, _image: &RasterImage) {
        self.images.push(key.to_string());
    }
}
