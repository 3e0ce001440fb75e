use std::collections::HashMap;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::assets::RasterImage;
use crate::error::{Error, Result};
use crate::fonts::{PT_PER_MM, register_fonts, to_winansi_bytes};
use crate::options::PageGeometry;
use crate::sink::{ASCENT, PageSink, Point, Primitive};

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// `PageSink` backed by pdf-writer content streams. Pages are kept as open
/// content streams until `finish`, so late passes (the footer) can still
/// draw on any of them.
pub struct PdfSink {
    geometry: PageGeometry,
    pages: Vec<Content>,
    images: Vec<(String, RasterImage)>,
    image_names: HashMap<String, String>,
    missing_image: Option<String>,
    compress: bool,
    title: Option<String>,
}

impl PdfSink {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            images: Vec::new(),
            image_names: HashMap::new(),
            missing_image: None,
            compress: true,
            title: None,
        }
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Serialise all pages, fonts and images into a PDF file.
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(key) = self.missing_image {
            return Err(Error::UnknownImage(key));
        }

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let info_id = alloc();

        let fonts = register_fonts(&mut pdf, &mut alloc);

        let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
        for (key, img) in &self.images {
            let Some(pdf_name) = self.image_names.get(key) else {
                continue;
            };
            let xobj_ref = alloc();

            let rgb_data: Vec<u8> = img
                .rgba
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if img.has_alpha() {
                let alpha_data: Vec<u8> = img.rgba.chunks_exact(4).map(|p| p[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(img.width as i32);
                mask.height(img.height as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(img.width as i32);
            xobj.height(img.height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
            drop(xobj);

            image_xobjects.push((pdf_name.clone(), xobj_ref));
        }

        let n = self.pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        for (i, c) in self.pages.into_iter().enumerate() {
            let raw = c.finish();
            if self.compress {
                let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
                pdf.stream(content_ids[i], &compressed)
                    .filter(Filter::FlateDecode);
            } else {
                pdf.stream(content_ids[i], raw.as_slice());
            }
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        let media_box = Rect::new(0.0, 0.0, pt(self.geometry.width), pt(self.geometry.height));
        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(media_box)
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut font_dict = resources.fonts();
                for (style, font_ref) in &fonts {
                    font_dict.pair(Name(style.pdf_name().as_bytes()), *font_ref);
                }
            }
            if !image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        {
            let mut info = pdf.document_info(info_id);
            if let Some(title) = &self.title {
                info.title(TextStr(title.as_str()));
            }
            info.producer(TextStr(concat!("contract-pdf ", env!("CARGO_PKG_VERSION"))));
        }

        Ok(pdf.finish())
    }
}

impl PageSink for PdfSink {
    fn new_page(&mut self) {
        self.pages.push(Content::new());
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn place(&mut self, page: usize, at: Point, primitive: Primitive) {
        let page_h = self.geometry.height;
        let flip = |y_mm: f32| pt(page_h - y_mm);
        let x = pt(at.x);

        let image_name = match &primitive {
            Primitive::Image { key, .. } => match self.image_names.get(key) {
                Some(name) => Some(name.clone()),
                None => {
                    log::error!("image {key} placed before registration");
                    if self.missing_image.is_none() {
                        self.missing_image = Some(key.clone());
                    }
                    return;
                }
            },
            _ => None,
        };

        let Some(content) = self.pages.get_mut(page) else {
            log::error!("draw on page {page} which does not exist");
            return;
        };

        match primitive {
            Primitive::Text { text, style } => {
                let (r, g, b) = style.color.components();
                let baseline = flip(at.y + style.em_mm() * ASCENT);
                content.save_state();
                content.set_fill_rgb(r, g, b);
                content.begin_text();
                content.set_font(Name(style.font.pdf_name().as_bytes()), style.size);
                content.next_line(x, baseline);
                content.show(Str(&to_winansi_bytes(&text)));
                content.end_text();
                content.restore_state();
            }
            Primitive::Rect {
                width,
                height,
                fill,
            } => {
                let (r, g, b) = fill.components();
                content.save_state();
                content.set_fill_rgb(r, g, b);
                content.rect(x, flip(at.y + height), pt(width), pt(height));
                content.fill_nonzero();
                content.restore_state();
            }
            Primitive::Rule {
                width,
                thickness,
                color,
            } => {
                let (r, g, b) = color.components();
                let y = flip(at.y + thickness / 2.0);
                content.save_state();
                content.set_stroke_rgb(r, g, b);
                content.set_line_width(pt(thickness));
                content.move_to(x, y);
                content.line_to(x + pt(width), y);
                content.stroke();
                content.restore_state();
            }
            Primitive::Image { width, height, .. } => {
                let Some(name) = image_name else {
                    return;
                };
                content.save_state();
                content.transform([pt(width), 0.0, 0.0, pt(height), x, flip(at.y + height)]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }

    fn register_image(&mut self, key: &str, image: &RasterImage) {
        if self.image_names.contains_key(key) {
            return;
        }
        let name = format!("Im{}", self.images.len() + 1);
        self.image_names.insert(key.to_string(), name);
        self.images.push((key.to_string(), image.clone()));
    }
}
