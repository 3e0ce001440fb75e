use crate::fonts::text_width_mm;
use crate::model::AgencyInfo;
use crate::options::PageGeometry;
use crate::sink::{PageSink, Point, Primitive, TextStyle};
use crate::text::{join_present, normalize_text};

use super::style::{FOOTER_SIZE, MUTED, RULE_GREY};

const MIN_FOOTER_SIZE: f32 = 5.0;
/// Room kept between the identity line and the page marker, mm.
const MARKER_GAP: f32 = 4.0;

/// Identity fields that are present, joined in a single line.
pub fn identity_line(agency: &AgencyInfo) -> String {
    let tagged = |prefix: &str, value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("{prefix} {s}"))
    };
    let siret = tagged("SIRET", &agency.siret);
    let tva = tagged("TVA", &agency.tva_number);
    let rcs = tagged("RCS", &agency.rcs);
    join_present(
        [
            Some(agency.name.as_str()),
            siret.as_deref(),
            tva.as_deref(),
            rcs.as_deref(),
        ],
        " - ",
    )
}

/// Cut `text` so that it fits `max_width` mm, ending with an ellipsis.
fn truncate_to_width(text: &str, style: &TextStyle, max_width: f32) -> String {
    if text_width_mm(text, style.font, style.size) <= max_width {
        return text.to_string();
    }
    let mut out = text.to_string();
    while !out.is_empty() {
        out.pop();
        let candidate = format!("{}...", out.trim_end());
        if text_width_mm(&candidate, style.font, style.size) <= max_width {
            return candidate;
        }
    }
    String::new()
}

pub fn page_marker(page: usize, total: usize) -> String {
    format!("Page {page}/{total}")
}

/// Stamp every page with the identity line and `Page i/N`. Runs once, after
/// all content exists, because N is only known then. Both lines sit in the
/// reserved band above the bottom margin, whatever the content cursor did.
pub fn stamp_footers<S: PageSink>(sink: &mut S, geometry: &PageGeometry, agency: &AgencyInfo) -> usize {
    let total = sink.page_count();
    let band_top = geometry.bottom_bound();
    let left = geometry.margin;
    let width = geometry.content_width();
    let identity = normalize_text(&identity_line(agency));

    let style = TextStyle::regular(FOOTER_SIZE).with_color(MUTED);
    let text_y = band_top + (geometry.footer_reserve - style.em_mm()) / 2.0 + 0.5;

    for page in 0..total {
        let marker = page_marker(page + 1, total);
        let marker_w = text_width_mm(&marker, style.font, style.size);

        sink.place(
            page,
            Point::new(left, band_top + 0.5),
            Primitive::Rule {
                width,
                thickness: 0.2,
                color: RULE_GREY,
            },
        );

        if !identity.is_empty() {
            // Shrink rather than overlap the page marker.
            let room = width - 2.0 * (marker_w + MARKER_GAP);
            let natural = text_width_mm(&identity, style.font, style.size);
            let size = if natural > room && natural > 0.0 {
                (style.size * room / natural).max(MIN_FOOTER_SIZE)
            } else {
                style.size
            };
            let id_style = TextStyle { size, ..style };
            let line = truncate_to_width(&identity, &id_style, room.max(0.0));
            let id_w = text_width_mm(&line, id_style.font, size);
            if !line.is_empty() {
                sink.place(
                    page,
                    Point::new(left + (width - id_w) / 2.0, text_y),
                    Primitive::Text {
                        text: line,
                        style: id_style,
                    },
                );
            }
        }

        sink.place(
            page,
            Point::new(left + width - marker_w, text_y),
            Primitive::Text {
                text: marker,
                style,
            },
        );
    }
    log::debug!("stamped footers on {total} page(s)");
    total
}
