mod footer;
mod layout;
mod sections;
mod style;
mod table;
mod writer;

use crate::assets::ImageCache;
use crate::error::Result;
use crate::model::{AgencyInfo, Contract};
use crate::options::RenderOptions;
use crate::sink::PageSink;

pub use footer::{identity_line, page_marker, stamp_footers};
pub use layout::{Align, LayoutContext, line_height, wrap_text};
pub use table::{Column, render_table};
pub use writer::PdfSink;

/// Lay out every section of `contract` on `sink`, then stamp the footers.
/// Section order is fixed; sections without data are skipped. Returns the
/// final page count.
pub fn render_contract_into<S: PageSink>(
    sink: &mut S,
    contract: &Contract,
    agency: &AgencyInfo,
    images: &ImageCache,
    opts: &RenderOptions,
) -> Result<usize> {
    {
        let mut ctx = LayoutContext::new(sink, images, opts.geometry);
        let kind = contract.variant.kind();

        sections::render_header(&mut ctx, contract, agency, opts)?;
        sections::render_parties(&mut ctx, &contract.variant)?;
        sections::render_project(&mut ctx, &contract.variant)?;
        sections::render_phases(&mut ctx, kind, &contract.phases)?;
        sections::render_financial_items(&mut ctx, contract)?;
        sections::render_totals(&mut ctx, &contract.totals)?;
        sections::render_payment_schedule(&mut ctx, &contract.payment_schedule, &contract.totals)?;
        if let Some(insurance) = &contract.insurance {
            sections::render_insurance(&mut ctx, insurance)?;
        }
        sections::render_clauses(&mut ctx, &contract.clauses)?;
        sections::render_signature(&mut ctx, contract, agency, opts)?;
    }
    Ok(stamp_footers(sink, &opts.geometry, agency))
}

/// Render `contract` to PDF bytes. `images` must already hold the decoded
/// logo and signature (missing entries fall back to text).
pub fn render(
    contract: &Contract,
    agency: &AgencyInfo,
    images: &ImageCache,
    opts: &RenderOptions,
) -> Result<Vec<u8>> {
    let t0 = std::time::Instant::now();
    let mut sink = PdfSink::new(opts.geometry)
        .with_compression(opts.compress)
        .with_title(format!("Contrat {}", contract.reference));

    let pages = render_contract_into(&mut sink, contract, agency, images, opts)?;
    let t_layout = t0.elapsed();

    let bytes = sink.finish()?;
    let t_total = t0.elapsed();

    log::info!(
        "Render phases: layout+footer={:.1}ms, serialise={:.1}ms, total={:.1}ms ({} page(s), {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        pages,
        bytes.len(),
    );
    Ok(bytes)
}
