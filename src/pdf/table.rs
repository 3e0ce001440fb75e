use crate::error::Result;
use crate::sink::{PageSink, Rgb, TextStyle};

use super::layout::{Align, LayoutContext, line_height, wrap_text};
use super::style::{ACCENT, BODY_SIZE, RULE_GREY, TABLE_HEAD_TEXT};

/// Inner padding of every cell, mm.
const CELL_PADDING: f32 = 1.8;

pub struct Column {
    pub header: String,
    /// Relative width hint; hints are scaled to fill the content width.
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub fn new(header: &str, width: f32, align: Align) -> Self {
        Self {
            header: header.to_string(),
            width,
            align,
        }
    }
}

/// Scale width hints so that they sum to `total`. Missing or non-positive
/// hints share the width equally.
fn resolve_widths(columns: &[Column], total: f32) -> Vec<f32> {
    let hint_sum: f32 = columns.iter().map(|c| c.width.max(0.0)).sum();
    if hint_sum <= 0.0 {
        return vec![total / columns.len().max(1) as f32; columns.len()];
    }
    columns
        .iter()
        .map(|c| c.width.max(0.0) * total / hint_sum)
        .collect()
}

struct RowLayout {
    height: f32,
    cell_lines: Vec<Vec<String>>,
}

fn layout_row(cells: &[String], widths: &[f32], style: &TextStyle) -> RowLayout {
    let line_h = line_height(style);
    let cell_lines: Vec<Vec<String>> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let text = cells.get(i).map(String::as_str).unwrap_or("");
            wrap_text(text, style.font, style.size, (w - 2.0 * CELL_PADDING).max(1.0))
        })
        .collect();
    let max_lines = cell_lines.iter().map(Vec::len).max().unwrap_or(1);
    RowLayout {
        height: max_lines as f32 * line_h + 2.0 * CELL_PADDING,
        cell_lines,
    }
}

fn draw_row<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    layout: &RowLayout,
    columns: &[Column],
    widths: &[f32],
    style: TextStyle,
    band: Option<Rgb>,
) {
    let top = ctx.cursor_y();
    let left = ctx.margin();
    let total: f32 = widths.iter().sum();
    if let Some(fill) = band {
        ctx.rect(left, top, total, layout.height, fill);
    }

    let line_h = line_height(&style);
    let mut x = left;
    for ((col, w), lines) in columns.iter().zip(widths).zip(&layout.cell_lines) {
        for (li, line) in lines.iter().enumerate() {
            let y = top + CELL_PADDING + li as f32 * line_h + (line_h - style.em_mm()) / 2.0;
            ctx.text_in(
                x + CELL_PADDING,
                y,
                w - 2.0 * CELL_PADDING,
                line,
                style,
                col.align,
            );
        }
        x += w;
    }

    if band.is_none() {
        ctx.rule(left, top + layout.height - 0.2, total, 0.2, RULE_GREY);
    }
    ctx.advance(layout.height);
}

/// Render a header band followed by `rows`, repeating the header on every
/// page the table spills onto. Returns the cursor position below the table.
pub fn render_table<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    columns: &[Column],
    rows: &[Vec<String>],
) -> Result<f32> {
    let widths = resolve_widths(columns, ctx.content_width());
    let head_style = TextStyle::bold(BODY_SIZE).with_color(TABLE_HEAD_TEXT);
    let body_style = TextStyle::regular(BODY_SIZE);

    let headers: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
    let head = layout_row(&headers, &widths, &head_style);
    let body: Vec<RowLayout> = rows
        .iter()
        .map(|cells| layout_row(cells, &widths, &body_style))
        .collect();

    let first_h = body.first().map_or(0.0, |r| r.height);
    ctx.ensure_space(head.height + first_h)?;
    draw_row(ctx, &head, columns, &widths, head_style, Some(ACCENT));

    for (ri, row) in body.iter().enumerate() {
        if ctx.cursor_y() + row.height > ctx.bottom_bound() {
            log::debug!(
                "table row {ri} ({:.1} mm) continues on a new page",
                row.height
            );
            ctx.ensure_space(head.height + row.height)?;
            draw_row(ctx, &head, columns, &widths, head_style, Some(ACCENT));
        }
        draw_row(ctx, row, columns, &widths, body_style, None);
    }

    Ok(ctx.cursor_y())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_fill_the_total_width() {
        let cols = [
            Column::new("A", 1.0, Align::Left),
            Column::new("B", 3.0, Align::Right),
        ];
        let w = resolve_widths(&cols, 170.0);
        assert!((w[0] - 42.5).abs() < 1e-4);
        assert!((w[1] - 127.5).abs() < 1e-4);
    }

    #[test]
    fn zero_hints_share_equally() {
        let cols = [
            Column::new("A", 0.0, Align::Left),
            Column::new("B", 0.0, Align::Left),
        ];
        assert_eq!(resolve_widths(&cols, 100.0), vec![50.0, 50.0]);
    }
}
