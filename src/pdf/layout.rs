use std::collections::HashSet;

use crate::assets::{ImageCache, fit_box};
use crate::error::{Error, Result};
use crate::fonts::{FontStyle, text_width_mm};
use crate::options::PageGeometry;
use crate::sink::{PageSink, Point, Primitive, Rgb, TextStyle};
use crate::text::normalize_text;

/// Line pitch as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Align {
    Left,
    Center,
    Right,
}

pub fn line_height(style: &TextStyle) -> f32 {
    style.em_mm() * LINE_SPACING
}

/// Running layout state for one render call: the cursor, the page geometry
/// and the decoded assets. Created by the orchestrator and threaded through
/// every renderer.
pub struct LayoutContext<'a, S: PageSink> {
    sink: &'a mut S,
    images: &'a ImageCache,
    registered: HashSet<String>,
    geometry: PageGeometry,
    cursor_y: f32,
    current_page: usize,
}

impl<'a, S: PageSink> LayoutContext<'a, S> {
    /// Opens the first page.
    pub fn new(sink: &'a mut S, images: &'a ImageCache, geometry: PageGeometry) -> Self {
        sink.new_page();
        let current_page = sink.page_count() - 1;
        Self {
            sink,
            images,
            registered: HashSet::new(),
            geometry,
            cursor_y: geometry.margin,
            current_page,
        }
    }

    pub fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn margin(&self) -> f32 {
        self.geometry.margin
    }

    pub fn content_width(&self) -> f32 {
        self.geometry.content_width()
    }

    pub fn bottom_bound(&self) -> f32 {
        self.geometry.bottom_bound()
    }

    pub fn new_page(&mut self) {
        self.sink.new_page();
        self.current_page = self.sink.page_count() - 1;
        self.cursor_y = self.geometry.margin;
        log::debug!("page break -> page {}", self.current_page + 1);
    }

    /// Start a new page unless `needed` mm still fit above the bottom bound.
    /// Returns whether a break happened. A block taller than a whole page is
    /// rejected instead of being retried forever.
    pub fn ensure_space(&mut self, needed: f32) -> Result<bool> {
        if self.cursor_y + needed <= self.bottom_bound() {
            return Ok(false);
        }
        let capacity = self.geometry.capacity();
        if needed > capacity {
            return Err(Error::LayoutOverflow { needed, capacity });
        }
        self.new_page();
        Ok(true)
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor_y += dy.max(0.0);
    }

    /// Move down by `dy` without crossing onto the footer band.
    pub fn gap(&mut self, dy: f32) {
        self.cursor_y = (self.cursor_y + dy.max(0.0)).min(self.bottom_bound());
    }

    fn place(&mut self, at: Point, primitive: Primitive) {
        self.sink.place(self.current_page, at, primitive);
    }

    /// Draw one line of text with its em box top at `y`.
    pub fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) {
        let text = normalize_text(text);
        if text.trim().is_empty() {
            return;
        }
        self.place(Point::new(x, y), Primitive::Text { text, style });
    }

    /// Draw one line aligned inside `[x, x + width]`.
    pub fn text_in(&mut self, x: f32, y: f32, width: f32, text: &str, style: TextStyle, align: Align) {
        let text = normalize_text(text);
        let w = text_width_mm(&text, style.font, style.size);
        let x = match align {
            Align::Left => x,
            Align::Center => x + (width - w) / 2.0,
            Align::Right => x + width - w,
        };
        self.text(x, y, &text, style);
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
        self.place(Point::new(x, y), Primitive::Rect { width, height, fill });
    }

    pub fn rule(&mut self, x: f32, y: f32, width: f32, thickness: f32, color: Rgb) {
        self.place(
            Point::new(x, y),
            Primitive::Rule {
                width,
                thickness,
                color,
            },
        );
    }

    /// Draw the cached image for `url` fitted into `max_w x max_h`. Returns
    /// the drawn size, or `None` when the asset is unavailable.
    pub fn image(&mut self, url: &str, x: f32, y: f32, max_w: f32, max_h: f32) -> Option<(f32, f32)> {
        let images = self.images;
        let img = images.get(url)?;
        let (width, height) = fit_box(img.width, img.height, max_w, max_h);
        if self.registered.insert(url.to_string()) {
            self.sink.register_image(url, img);
        }
        self.place(
            Point::new(x, y),
            Primitive::Image {
                key: url.to_string(),
                width,
                height,
            },
        );
        Some((width, height))
    }
}

/// Greedy word wrap to `max_width` mm. Words longer than a line are split
/// between characters. Always returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, font: FontStyle, size: f32, max_width: f32) -> Vec<String> {
    let text = normalize_text(text);
    let space_w = text_width_mm(" ", font, size);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0f32;

    for word in text.split_whitespace() {
        let ww = text_width_mm(word, font, size);
        let proposed = if current.is_empty() {
            ww
        } else {
            current_w + space_w + ww
        };
        if proposed <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_w = proposed;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_w = 0.0;
        }
        if ww <= max_width {
            current.push_str(word);
            current_w = ww;
            continue;
        }
        for ch in word.chars() {
            let cw = text_width_mm(ch.encode_utf8(&mut [0; 4]), font, size);
            if !current.is_empty() && current_w + cw > max_width {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }
            current.push(ch);
            current_w += cw;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("alpha beta gamma delta", FontStyle::Regular, 10.0, 20.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, FontStyle::Regular, 10.0) <= 20.0);
            assert!(!line.starts_with(' '));
        }
        assert_eq!(lines.join(" "), "alpha beta gamma delta");
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        let long = "x".repeat(200);
        let lines = wrap_text(&long, FontStyle::Bold, 10.0, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), long);
    }

    #[test]
    fn empty_text_gives_one_empty_line() {
        assert_eq!(wrap_text("   ", FontStyle::Regular, 9.0, 50.0), vec![String::new()]);
    }
}
