//! One renderer per contract section. Every renderer checks for room with
//! `ensure_space` before each block it cannot split.

use crate::error::Result;
use crate::fonts::text_width_mm;
use crate::model::{
    AgencyInfo, Clause, CommunicationData, Contract, ContractKind, ContractVariant, Insurance, LineItem,
    MoeData, Party, PaymentStage, Phase, Project, Totals,
};
use crate::options::RenderOptions;
use crate::sink::{PageSink, TextStyle};
use crate::text::{
    format_currency, format_date_long, format_decimal, format_percent, join_present, titleize,
};

use super::layout::{Align, LayoutContext, line_height, wrap_text};
use super::style::{
    ACCENT, BAND_GREY, BODY_SIZE, DOC_TITLE_SIZE, MUTED, SECTION_TITLE_SIZE, SMALL_SIZE,
};
use super::table::{Column, render_table};

const SECTION_GAP: f32 = 6.0;
/// Room a title must leave below itself so it is never orphaned.
const KEEP_WITH_NEXT: f32 = 12.0;
const LABEL_WIDTH: f32 = 48.0;
const GUTTER: f32 = 8.0;
const BLOCK_PADDING: f32 = 3.0;

fn title_height() -> f32 {
    line_height(&TextStyle::bold(SECTION_TITLE_SIZE)) + 1.0 + 0.3 + 3.0
}

/// Upper-cased title with a thin divider. `keep_with` is the height of the
/// following block that must land on the same page.
fn section_title<S: PageSink>(ctx: &mut LayoutContext<'_, S>, title: &str, keep_with: f32) -> Result<()> {
    let style = TextStyle::bold(SECTION_TITLE_SIZE).with_color(ACCENT);
    ctx.ensure_space(title_height() + keep_with)?;
    let (x, y, w) = (ctx.margin(), ctx.cursor_y(), ctx.content_width());
    ctx.text(x, y, &title.to_uppercase(), style);
    ctx.advance(line_height(&style) + 1.0);
    let y = ctx.cursor_y();
    ctx.rule(x, y, w, 0.3, ACCENT);
    ctx.advance(0.3 + 3.0);
    Ok(())
}

/// Wrapped paragraph with a pagination check per physical line.
fn paragraph<S: PageSink>(ctx: &mut LayoutContext<'_, S>, text: &str, style: TextStyle) -> Result<()> {
    let line_h = line_height(&style);
    let (x, w) = (ctx.margin(), ctx.content_width());
    for line in wrap_text(text, style.font, style.size, w) {
        ctx.ensure_space(line_h)?;
        let y = ctx.cursor_y();
        ctx.text(x, y, &line, style);
        ctx.advance(line_h);
    }
    Ok(())
}

/// `Label    value` rows; the value wraps in the remaining width. Rows with
/// no value are skipped.
fn fields<S: PageSink>(ctx: &mut LayoutContext<'_, S>, rows: &[(&str, Option<String>)]) -> Result<()> {
    let label_style = TextStyle::bold(BODY_SIZE);
    let value_style = TextStyle::regular(BODY_SIZE);
    let line_h = line_height(&value_style);
    let x = ctx.margin();
    let value_w = ctx.content_width() - LABEL_WIDTH;

    for (label, value) in rows {
        let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let lines = wrap_text(value, value_style.font, value_style.size, value_w);
        ctx.ensure_space(lines.len() as f32 * line_h)?;
        let top = ctx.cursor_y();
        ctx.text(x, top, label, label_style);
        for (i, line) in lines.iter().enumerate() {
            ctx.text(x + LABEL_WIDTH, top + i as f32 * line_h, line, value_style);
        }
        ctx.advance(lines.len() as f32 * line_h);
    }
    Ok(())
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ---------------------------------------------------------------- header

pub(super) fn render_header<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    contract: &Contract,
    agency: &AgencyInfo,
    opts: &RenderOptions,
) -> Result<()> {
    let (left, top, width) = (ctx.margin(), ctx.cursor_y(), ctx.content_width());
    let (logo_w, logo_h) = opts.logo_box;

    let contact_style = TextStyle::regular(SMALL_SIZE).with_color(MUTED);
    let contact_h = line_height(&contact_style);
    let contact: Vec<String> = [
        agency.address.clone(),
        agency.city.clone(),
        agency.email.clone(),
        agency.phone.clone(),
    ]
    .into_iter()
    .flatten()
    .filter_map(|s| non_blank(&s))
    .collect();
    for (i, line) in contact.iter().enumerate() {
        ctx.text_in(left, top + i as f32 * contact_h, width, line, contact_style, Align::Right);
    }
    let contact_w = contact
        .iter()
        .map(|l| text_width_mm(l, contact_style.font, contact_style.size))
        .fold(0.0f32, f32::max);
    let brand_w = if contact.is_empty() {
        width
    } else {
        (width - contact_w - GUTTER).max(width / 3.0)
    };

    let logo = agency
        .logo()
        .and_then(|url| ctx.image(url, left, top, logo_w.min(brand_w), logo_h));
    let brand_h = match logo {
        Some((_, h)) => h,
        None => {
            // Wrapped so a long name stays clear of the contact column.
            let style = TextStyle::bold(14.0).with_color(ACCENT);
            let lines = wrap_text(&agency.name, style.font, style.size, brand_w);
            for (i, line) in lines.iter().enumerate() {
                ctx.text(left, top + i as f32 * line_height(&style), line, style);
            }
            lines.len() as f32 * line_height(&style)
        }
    };

    ctx.advance(brand_h.max(contact.len() as f32 * contact_h) + 8.0);

    let title = match &contract.variant {
        ContractVariant::Moe(_) => "CONTRAT DE MAÎTRISE D'ŒUVRE",
        ContractVariant::Communication(_) => "CONTRAT DE PRESTATIONS DE COMMUNICATION",
    };
    let title_style = TextStyle::bold(DOC_TITLE_SIZE).with_color(ACCENT);
    let sub_style = TextStyle::regular(BODY_SIZE).with_color(MUTED);
    ctx.ensure_space(line_height(&title_style) + line_height(&sub_style) + 4.0)?;
    let y = ctx.cursor_y();
    ctx.text_in(left, y, width, title, title_style, Align::Center);
    ctx.advance(line_height(&title_style) + 1.0);

    let subtitle = format!(
        "Référence : {}   |   Date : {}",
        contract.reference,
        format_date_long(contract.date)
    );
    let y = ctx.cursor_y();
    ctx.text_in(left, y, width, &subtitle, sub_style, Align::Center);
    ctx.advance(line_height(&sub_style) + 2.0);

    let y = ctx.cursor_y();
    ctx.rule(left, y, width, 0.6, ACCENT);
    ctx.advance(0.6);
    ctx.gap(SECTION_GAP);
    Ok(())
}

// ---------------------------------------------------------------- parties

fn party_lines(party: &Party) -> Vec<(String, TextStyle)> {
    let body = TextStyle::regular(BODY_SIZE);
    let mut lines = vec![(party.name.clone(), TextStyle::bold(BODY_SIZE))];
    let optional = [
        party.representative.as_ref().map(|r| format!("Représenté par {r}")),
        party.address.clone(),
        party.city.clone(),
        party.siret.as_ref().map(|s| format!("SIRET : {s}")),
        party.email.clone(),
        party.phone.as_ref().map(|p| format!("Tél. : {p}")),
    ];
    lines.extend(
        optional
            .into_iter()
            .flatten()
            .filter_map(|s| non_blank(&s))
            .map(|s| (s, body)),
    );
    lines
}

/// Two identity blocks side by side, drawn as one unsplittable unit.
fn party_pair<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    left: (&str, &Party),
    right: (&str, &Party),
) -> Result<()> {
    let col_w = (ctx.content_width() - GUTTER) / 2.0;
    let text_w = col_w - 2.0 * BLOCK_PADDING;
    let heading = TextStyle::bold(SMALL_SIZE).with_color(ACCENT);

    let wrap_block = |party: &Party| -> Vec<(String, TextStyle)> {
        party_lines(party)
            .into_iter()
            .flat_map(|(text, style)| {
                wrap_text(&text, style.font, style.size, text_w)
                    .into_iter()
                    .map(move |l| (l, style))
            })
            .collect()
    };
    let blocks = [(left.0, wrap_block(left.1)), (right.0, wrap_block(right.1))];

    let block_h = |lines: &[(String, TextStyle)]| -> f32 {
        line_height(&heading) + 1.0 + lines.iter().map(|(_, s)| line_height(s)).sum::<f32>()
    };
    let height = blocks
        .iter()
        .map(|(_, lines)| block_h(lines.as_slice()))
        .fold(0.0f32, f32::max)
        + 2.0 * BLOCK_PADDING;

    ctx.ensure_space(height)?;
    let top = ctx.cursor_y();
    for (i, (title, lines)) in blocks.iter().enumerate() {
        let x = ctx.margin() + i as f32 * (col_w + GUTTER);
        ctx.rect(x, top, col_w, height, BAND_GREY);
        let mut y = top + BLOCK_PADDING;
        ctx.text(x + BLOCK_PADDING, y, &title.to_uppercase(), heading);
        y += line_height(&heading) + 1.0;
        for (line, style) in lines {
            ctx.text(x + BLOCK_PADDING, y, line, *style);
            y += line_height(style);
        }
    }
    ctx.advance(height);
    Ok(())
}

fn render_parties_moe<S: PageSink>(ctx: &mut LayoutContext<'_, S>, data: &MoeData) -> Result<()> {
    section_title(ctx, "Parties", KEEP_WITH_NEXT)?;
    party_pair(
        ctx,
        ("Maître d'ouvrage", &data.owner),
        ("Maître d'œuvre", &data.designer),
    )
}

fn render_parties_communication<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    data: &CommunicationData,
) -> Result<()> {
    section_title(ctx, "Parties", KEEP_WITH_NEXT)?;
    party_pair(ctx, ("Le client", &data.client), ("L'agence", &data.agency))
}

pub(super) fn render_parties<S: PageSink>(ctx: &mut LayoutContext<'_, S>, variant: &ContractVariant) -> Result<()> {
    match variant {
        ContractVariant::Moe(data) => render_parties_moe(ctx, data)?,
        ContractVariant::Communication(data) => render_parties_communication(ctx, data)?,
    }
    paragraph(
        ctx,
        "Il a été convenu et arrêté ce qui suit :",
        TextStyle::regular(BODY_SIZE).with_color(MUTED),
    )?;
    ctx.gap(SECTION_GAP);
    Ok(())
}

// ---------------------------------------------------------------- project

fn location(project: &Project) -> Option<String> {
    non_blank(&join_present(
        [project.address.as_deref(), project.city.as_deref()],
        ", ",
    ))
}

fn render_project_moe<S: PageSink>(ctx: &mut LayoutContext<'_, S>, project: &Project) -> Result<()> {
    section_title(ctx, "Projet", KEEP_WITH_NEXT)?;
    fields(
        ctx,
        &[
            ("Opération", non_blank(&project.name)),
            ("Adresse du terrain", location(project)),
            ("Nature des travaux", project.project_type.clone()),
            (
                "Surface",
                project.surface.map(|s| format!("{} m²", format_decimal(s))),
            ),
            ("Enveloppe travaux HT", project.budget.map(format_currency)),
        ],
    )
}

fn render_project_communication<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    project: &Project,
) -> Result<()> {
    section_title(ctx, "Projet", KEEP_WITH_NEXT)?;
    fields(
        ctx,
        &[
            ("Projet", non_blank(&project.name)),
            ("Type de prestation", project.project_type.clone()),
            ("Lieu", location(project)),
            ("Budget de communication", project.budget.map(format_currency)),
        ],
    )
}

pub(super) fn render_project<S: PageSink>(ctx: &mut LayoutContext<'_, S>, variant: &ContractVariant) -> Result<()> {
    match variant {
        ContractVariant::Moe(data) => render_project_moe(ctx, &data.project)?,
        ContractVariant::Communication(data) => render_project_communication(ctx, &data.project)?,
    }
    ctx.gap(SECTION_GAP);
    Ok(())
}

// ---------------------------------------------------------------- phases

fn phase_status(phase: &Phase) -> &'static str {
    match (phase.included, phase.optional) {
        (_, true) => "En option",
        (true, false) => "Incluse",
        (false, false) => "Non incluse",
    }
}

pub(super) fn render_phases<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    kind: ContractKind,
    phases: &[Phase],
) -> Result<()> {
    if phases.is_empty() {
        return Ok(());
    }
    let title = match kind {
        ContractKind::Moe => "Phases de mission",
        ContractKind::Communication => "Phases du projet",
    };
    section_title(ctx, title, KEEP_WITH_NEXT)?;

    let columns = [
        Column::new("Code", 1.2, Align::Left),
        Column::new("Phase", 5.0, Align::Left),
        Column::new("Statut", 1.8, Align::Center),
        Column::new("Part", 1.2, Align::Right),
    ];
    let rows: Vec<Vec<String>> = phases
        .iter()
        .map(|p| {
            vec![
                p.code.clone(),
                p.name.clone(),
                phase_status(p).to_string(),
                format_percent(p.percentage),
            ]
        })
        .collect();
    render_table(ctx, &columns, &rows)?;

    let included: f64 = phases
        .iter()
        .filter(|p| p.included && !p.optional)
        .map(|p| p.percentage)
        .sum();
    ctx.gap(1.5);
    summary_line(
        ctx,
        &format!("Total des phases incluses : {}", format_percent(included)),
    )?;
    ctx.gap(SECTION_GAP);
    Ok(())
}

fn summary_line<S: PageSink>(ctx: &mut LayoutContext<'_, S>, text: &str) -> Result<()> {
    let style = TextStyle::regular(SMALL_SIZE).with_color(MUTED);
    ctx.ensure_space(line_height(&style))?;
    let (x, y, w) = (ctx.margin(), ctx.cursor_y(), ctx.content_width());
    ctx.text_in(x, y, w, text, style, Align::Right);
    ctx.advance(line_height(&style));
    Ok(())
}

// ---------------------------------------------------------------- fees

fn line_item_rows(items: &[LineItem]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|item| {
            let label = if item.is_optional {
                format!("{} (option)", item.label)
            } else {
                item.label.clone()
            };
            let amount = if item.is_offered {
                "Offert".to_string()
            } else {
                format_currency(item.amount_ht)
            };
            vec![label, format_decimal(item.quantity), amount]
        })
        .collect()
}

fn line_item_columns() -> [Column; 3] {
    [
        Column::new("Désignation", 6.0, Align::Left),
        Column::new("Qté", 1.0, Align::Right),
        Column::new("Montant HT", 2.0, Align::Right),
    ]
}

fn render_fee_moe<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    data: &MoeData,
    items: &[LineItem],
    totals: &Totals,
) -> Result<()> {
    section_title(ctx, "Détail des honoraires", KEEP_WITH_NEXT)?;
    render_table(ctx, &line_item_columns(), &line_item_rows(items))?;
    if let Some(budget) = data.project.budget.filter(|b| *b > 0.0) {
        ctx.gap(1.5);
        summary_line(
            ctx,
            &format!(
                "Taux d'honoraires : {} du montant prévisionnel des travaux",
                format_percent(totals.total_ht / budget * 100.0)
            ),
        )?;
    }
    Ok(())
}

fn render_fee_communication<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    items: &[LineItem],
) -> Result<()> {
    section_title(ctx, "Détail des prestations", KEEP_WITH_NEXT)?;
    render_table(ctx, &line_item_columns(), &line_item_rows(items))?;
    let offered = items.iter().filter(|i| i.is_offered).count();
    if offered > 0 {
        ctx.gap(1.5);
        summary_line(
            ctx,
            &format!("{offered} prestation(s) offerte(s), non facturée(s)"),
        )?;
    }
    Ok(())
}

pub(super) fn render_financial_items<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    contract: &Contract,
) -> Result<()> {
    if contract.line_items.is_empty() {
        return Ok(());
    }
    match &contract.variant {
        ContractVariant::Moe(data) => {
            render_fee_moe(ctx, data, &contract.line_items, &contract.totals)?
        }
        ContractVariant::Communication(_) => render_fee_communication(ctx, &contract.line_items)?,
    }
    ctx.gap(3.0);
    Ok(())
}

pub(super) fn render_totals<S: PageSink>(ctx: &mut LayoutContext<'_, S>, totals: &Totals) -> Result<()> {
    let label_style = TextStyle::regular(BODY_SIZE);
    let strong = TextStyle::bold(BODY_SIZE + 1.0);
    let row_h = line_height(&label_style) + 1.0;
    let strong_h = line_height(&strong) + 2.0;
    let block_w = 80.0;

    ctx.ensure_space(2.0 * row_h + strong_h)?;
    let x = ctx.margin() + ctx.content_width() - block_w;
    let inner = block_w - 2.0 * BLOCK_PADDING;

    let rows = [
        ("Total HT".to_string(), format_currency(totals.total_ht)),
        (
            format!("TVA ({})", format_percent(totals.tva_rate)),
            format_currency(totals.tva_amount),
        ),
    ];
    for (label, value) in &rows {
        let y = ctx.cursor_y() + 0.5;
        ctx.text(x + BLOCK_PADDING, y, label, label_style);
        ctx.text_in(x + BLOCK_PADDING, y, inner, value, label_style, Align::Right);
        ctx.advance(row_h);
    }

    let top = ctx.cursor_y();
    ctx.rect(x, top, block_w, strong_h, BAND_GREY);
    let y = top + 1.0;
    ctx.text(x + BLOCK_PADDING, y, "Total TTC", strong);
    ctx.text_in(
        x + BLOCK_PADDING,
        y,
        inner,
        &format_currency(totals.total_ttc),
        strong,
        Align::Right,
    );
    ctx.advance(strong_h);
    ctx.gap(SECTION_GAP);
    Ok(())
}

// ---------------------------------------------------------------- payment schedule

pub(super) fn render_payment_schedule<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    schedule: &[PaymentStage],
    totals: &Totals,
) -> Result<()> {
    if schedule.is_empty() {
        return Ok(());
    }
    section_title(ctx, "Échéancier de paiement", KEEP_WITH_NEXT)?;
    let columns = [
        Column::new("Étape", 2.2, Align::Left),
        Column::new("Phase", 1.1, Align::Left),
        Column::new("Description", 4.0, Align::Left),
        Column::new("Part", 1.0, Align::Right),
        Column::new("Montant HT", 1.8, Align::Right),
    ];
    let rows: Vec<Vec<String>> = schedule
        .iter()
        .map(|s| {
            vec![
                s.stage.clone(),
                s.phase_code.clone().unwrap_or_default(),
                s.description.clone(),
                format_percent(s.percentage),
                format_currency(s.percentage / 100.0 * totals.total_ht),
            ]
        })
        .collect();
    render_table(ctx, &columns, &rows)?;

    let total_pct: f64 = schedule.iter().map(|s| s.percentage).sum();
    ctx.gap(1.5);
    summary_line(
        ctx,
        &format!("Total échéancier : {}", format_percent(total_pct)),
    )?;
    ctx.gap(SECTION_GAP);
    Ok(())
}

// ---------------------------------------------------------------- insurance

pub(super) fn render_insurance<S: PageSink>(ctx: &mut LayoutContext<'_, S>, insurance: &Insurance) -> Result<()> {
    if insurance.is_empty() {
        return Ok(());
    }
    section_title(ctx, "Assurance professionnelle", KEEP_WITH_NEXT)?;
    paragraph(
        ctx,
        "Le prestataire déclare être titulaire d'une assurance responsabilité civile \
         professionnelle couvrant les missions objet du présent contrat.",
        TextStyle::regular(BODY_SIZE),
    )?;
    ctx.gap(1.5);
    fields(
        ctx,
        &[
            ("Compagnie", insurance.company.clone()),
            ("N° de police", insurance.policy_number.clone()),
        ],
    )?;
    ctx.gap(SECTION_GAP);
    Ok(())
}

// ---------------------------------------------------------------- clauses

/// Clause bodies are the one place that may split inside a logical block:
/// each physical line gets its own pagination check, so a clause can run
/// over any number of pages.
pub(super) fn render_clauses<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    clauses: &[Clause],
) -> Result<()> {
    if clauses.is_empty() {
        return Ok(());
    }
    let heading = TextStyle::bold(BODY_SIZE);
    let body = TextStyle::regular(BODY_SIZE);
    let body_h = line_height(&body);
    section_title(ctx, "Clauses contractuelles", line_height(&heading) + body_h)?;

    for clause in clauses {
        ctx.ensure_space(line_height(&heading) + 1.0 + body_h)?;
        let (x, y) = (ctx.margin(), ctx.cursor_y());
        ctx.text(x, y, &titleize(&clause.key), heading);
        ctx.advance(line_height(&heading) + 1.0);

        for (pi, para) in clause.text.split('\n').map(str::trim).enumerate() {
            if para.is_empty() {
                continue;
            }
            if pi > 0 {
                ctx.gap(1.0);
            }
            paragraph(ctx, para, body)?;
        }
        ctx.gap(3.0);
    }
    ctx.gap(SECTION_GAP - 3.0);
    Ok(())
}

// ---------------------------------------------------------------- signature

pub(super) fn render_signature<S: PageSink>(
    ctx: &mut LayoutContext<'_, S>,
    contract: &Contract,
    agency: &AgencyInfo,
    opts: &RenderOptions,
) -> Result<()> {
    let (client_role, client, provider_role) = match &contract.variant {
        ContractVariant::Moe(d) => ("Le maître d'ouvrage", &d.owner, "Le maître d'œuvre"),
        ContractVariant::Communication(d) => ("Le client", &d.client, "L'agence"),
    };
    let body = TextStyle::regular(BODY_SIZE);
    let bold = TextStyle::bold(BODY_SIZE);
    let note = TextStyle::regular(SMALL_SIZE).with_color(MUTED);
    let (_, sig_h) = opts.signature_box;
    let line_h = line_height(&body);
    let block_h = 2.0 * line_h + 2.0 * line_height(&note) + sig_h + 4.0;

    section_title(ctx, "Signature", line_h + 3.0 + block_h)?;

    let city = agency
        .city
        .as_deref()
        .or(contract.variant.provider().city.as_deref())
        .and_then(non_blank);
    let place = match city {
        Some(city) => format!(
            "Fait à {city}, le {}, en deux exemplaires originaux.",
            format_date_long(contract.date)
        ),
        None => format!(
            "Fait le {}, en deux exemplaires originaux.",
            format_date_long(contract.date)
        ),
    };
    let (left, top, width) = (ctx.margin(), ctx.cursor_y(), ctx.content_width());
    ctx.text(left, top, &place, body);
    ctx.advance(line_h + 3.0);

    let col_w = (width - GUTTER) / 2.0;
    let top = ctx.cursor_y();
    let provider_name = if agency.name.trim().is_empty() {
        contract.variant.provider().name.as_str()
    } else {
        agency.name.as_str()
    };
    let columns = [(client_role, client.name.as_str()), (provider_role, provider_name)];
    for (i, (role, name)) in columns.iter().enumerate() {
        let x = left + i as f32 * (col_w + GUTTER);
        let mut y = top;
        ctx.text(x, y, role, bold);
        y += line_h;
        ctx.text(x, y, name, body);
        y += line_h;
        ctx.text(x, y, "Lu et approuvé, bon pour accord", note);
        y += line_height(&note);
        ctx.text(x, y, "(date et signature)", note);
        y += line_height(&note) + 2.0;

        if i == 1 {
            let (max_w, max_h) = opts.signature_box;
            let drawn = agency
                .signature()
                .and_then(|url| ctx.image(url, x, y, max_w.min(col_w), max_h));
            if drawn.is_none() {
                ctx.text(x, y + 2.0, provider_name, TextStyle::bold(BODY_SIZE).with_color(ACCENT));
            }
        }
    }
    ctx.advance(block_h);
    Ok(())
}
