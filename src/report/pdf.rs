//! Draws a [Report] onto a single PDF page.
//!
//! The page is A4 wide and at least A4 tall, growing downwards so the whole
//! table fits on one page. PDF viewers refuse pages taller than 14400 units,
//! so past [MAX_PAGE_HEIGHT] the table is cut short with a note of how many
//! rows were left out. Coordinates in printpdf start at the bottom-left
//! corner, so the layout keeps a cursor measured from the top of the page.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect,
    Rgb, path::PaintMode,
};

use crate::{
    Error,
    chart::BAR_GRADIENT,
    report::{REPORT_TITLE, Report},
};

const PAGE_WIDTH: f32 = 210.0;
const MIN_PAGE_HEIGHT: f32 = 297.0;
/// 14400 PDF units of 1/72 inch, rounded down to whole millimetres.
const MAX_PAGE_HEIGHT: f32 = 5080.0;
const MARGIN: f32 = 15.0;
const BANNER_HEIGHT: f32 = 22.0;
const HEADING_HEIGHT: f32 = 30.0;
const CHART_HEIGHT: f32 = 70.0;
const CHART_LABEL_SPACE: f32 = 12.0;
const ROW_HEIGHT: f32 = 7.0;
const GRADIENT_SLICES: usize = 12;

const TABLE_COLUMNS: [(&str, f32); 4] = [
    ("Folio", MARGIN),
    ("Tipo", MARGIN + 40.0),
    ("Estado", MARGIN + 95.0),
    ("Fecha", MARGIN + 135.0),
];

const BANNER_COLOUR: (f32, f32, f32) = (0.114, 0.306, 0.847);
const TEXT_COLOUR: (f32, f32, f32) = (0.067, 0.094, 0.153);
const RULE_COLOUR: (f32, f32, f32) = (0.82, 0.84, 0.86);

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Render `report` as the bytes of a PDF file.
///
/// # Errors
///
/// Returns [Error::PdfError] if the document cannot be built or serialized.
pub fn render_pdf(report: &Report) -> Result<Vec<u8>, Error> {
    let row_count = report.rows.len();
    let page_height = page_height(row_count);

    let shown = rows_that_fit(row_count);
    if shown < row_count {
        tracing::warn!(
            "Report has {row_count} rows but only {shown} fit on one PDF page, the rest are left out"
        );
    }

    let (document, page, layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(page_height), "Reporte");
    let fonts = Fonts {
        regular: document
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: document
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };
    let layer = document.get_page(page).get_layer(layer);

    let mut top = 0.0;
    top = draw_banner(&layer, &fonts, page_height, top);
    top = draw_heading(&layer, &fonts, report, page_height, top);
    top = draw_chart(&layer, &fonts, report, page_height, top);
    draw_table(&layer, &fonts, report, page_height, top);

    document.save_to_bytes().map_err(pdf_error)
}

fn pdf_error(error: printpdf::Error) -> Error {
    tracing::error!("Could not render PDF report: {error:?}");
    Error::PdfError(format!("{error:?}"))
}

/// Everything on the page except the table rows.
const FIXED_HEIGHT: f32 =
    BANNER_HEIGHT + HEADING_HEIGHT + CHART_HEIGHT + CHART_LABEL_SPACE + MARGIN * 2.0;

/// How many of `row_count` rows can be drawn without exceeding [MAX_PAGE_HEIGHT].
///
/// Besides the rows, the table needs one line for the header and one for the
/// empty or cut-short note.
fn rows_that_fit(row_count: usize) -> usize {
    let capacity = ((MAX_PAGE_HEIGHT - FIXED_HEIGHT) / ROW_HEIGHT) as usize - 2;

    row_count.min(capacity)
}

fn page_height(row_count: usize) -> f32 {
    let content = FIXED_HEIGHT + ROW_HEIGHT * (rows_that_fit(row_count) as f32 + 2.0);

    content.clamp(MIN_PAGE_HEIGHT, MAX_PAGE_HEIGHT)
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn fill_rect(layer: &PdfLayerReference, colour: Color, (x1, y1): (f32, f32), (x2, y2): (f32, f32)) {
    layer.set_fill_color(colour);
    layer.add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)).with_mode(PaintMode::Fill));
}

fn rule(layer: &PdfLayerReference, y: f32) {
    layer.set_outline_color(rgb(RULE_COLOUR));
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn text(layer: &PdfLayerReference, font: &IndirectFontRef, size: f32, x: f32, y: f32, value: &str) {
    layer.use_text(pdf_safe_text(value), size, Mm(x), Mm(y), font);
}

/// The logo banner across the top of the page. Returns the new cursor.
fn draw_banner(layer: &PdfLayerReference, fonts: &Fonts, page_height: f32, top: f32) -> f32 {
    let bottom = top + BANNER_HEIGHT;

    fill_rect(
        layer,
        rgb(BANNER_COLOUR),
        (0.0, page_height - bottom),
        (PAGE_WIDTH, page_height - top),
    );

    // Logo mark: a white square with the initial.
    fill_rect(
        layer,
        rgb((1.0, 1.0, 1.0)),
        (MARGIN, page_height - bottom + 5.0),
        (MARGIN + 12.0, page_height - top - 5.0),
    );
    layer.set_fill_color(rgb(BANNER_COLOUR));
    text(layer, &fonts.bold, 16.0, MARGIN + 3.2, page_height - bottom + 8.0, "Q");

    layer.set_fill_color(rgb((1.0, 1.0, 1.0)));
    text(layer, &fonts.bold, 18.0, MARGIN + 17.0, page_height - bottom + 8.0, "Buzón de Quejas");

    bottom
}

fn draw_heading(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    report: &Report,
    page_height: f32,
    top: f32,
) -> f32 {
    layer.set_fill_color(rgb(TEXT_COLOUR));

    text(layer, &fonts.bold, 16.0, MARGIN, page_height - top - 12.0, REPORT_TITLE);
    text(
        layer,
        &fonts.regular,
        10.0,
        MARGIN,
        page_height - top - 19.0,
        &format!("Periodo: {}", report.window_label),
    );
    text(
        layer,
        &fonts.regular,
        10.0,
        MARGIN,
        page_height - top - 25.0,
        &format!(
            "Generado: {}    Total: {}",
            report.generated_at,
            report.by_status.total()
        ),
    );

    top + HEADING_HEIGHT
}

/// The bar chart of complaints by status, coloured like the on-screen charts.
fn draw_chart(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    report: &Report,
    page_height: f32,
    top: f32,
) -> f32 {
    let chart_top = page_height - top - 8.0;
    let baseline = page_height - top - CHART_HEIGHT;
    let plot_height = chart_top - baseline - 6.0;
    let plot_width = PAGE_WIDTH - MARGIN * 2.0;

    layer.set_fill_color(rgb(TEXT_COLOUR));
    text(layer, &fonts.bold, 11.0, MARGIN, chart_top, "Quejas por estado");
    rule(layer, baseline);

    let entries = report.by_status.entries();
    let max_count = entries.iter().map(|(_, count)| *count).max().unwrap_or(0);

    if max_count > 0 {
        let slot = plot_width / entries.len() as f32;
        let bar_width = (slot * 0.6).min(30.0);

        for (index, (label, count)) in entries.iter().enumerate() {
            let x = MARGIN + slot * index as f32 + (slot - bar_width) / 2.0;
            let bar_height = plot_height * (*count as f32 / max_count as f32);

            draw_gradient_bar(layer, x, baseline, bar_width, bar_height);

            layer.set_fill_color(rgb(TEXT_COLOUR));
            text(
                layer,
                &fonts.bold,
                9.0,
                x + bar_width / 2.0 - 1.5,
                baseline + bar_height + 1.5,
                &count.to_string(),
            );
            text(layer, &fonts.regular, 8.0, x, baseline - 5.0, label);
        }
    }

    top + CHART_HEIGHT + CHART_LABEL_SPACE
}

/// Fill a bar with thin slices that step through [BAR_GRADIENT] from top to
/// bottom.
fn draw_gradient_bar(layer: &PdfLayerReference, x: f32, baseline: f32, width: f32, height: f32) {
    let slice_height = height / GRADIENT_SLICES as f32;

    for slice in 0..GRADIENT_SLICES {
        let offset_from_top = (slice as f64 + 0.5) / GRADIENT_SLICES as f64;
        let slice_top = baseline + height - slice_height * slice as f32;

        fill_rect(
            layer,
            rgb(gradient_colour(offset_from_top)),
            (x, slice_top - slice_height),
            (x + width, slice_top),
        );
    }
}

/// The colour of [BAR_GRADIENT] at `offset`, from 0 at the top to 1 at the bottom.
fn gradient_colour(offset: f64) -> (f32, f32, f32) {
    let offset = offset.clamp(0.0, 1.0);

    for window in BAR_GRADIENT.windows(2) {
        let (start, start_hex) = window[0];
        let (end, end_hex) = window[1];

        if offset <= end {
            let span = end - start;
            let t = if span > 0.0 { (offset - start) / span } else { 0.0 };
            let (r1, g1, b1) = hex_to_rgb(start_hex);
            let (r2, g2, b2) = hex_to_rgb(end_hex);
            let mix = |a: f32, b: f32| a + (b - a) * t as f32;

            return (mix(r1, r2), mix(g1, g2), mix(b1, b2));
        }
    }

    hex_to_rgb(BAR_GRADIENT[BAR_GRADIENT.len() - 1].1)
}

/// Convert "#rrggbb" to RGB components in 0..=1. Malformed input is black.
fn hex_to_rgb(hex: &str) -> (f32, f32, f32) {
    let channel = |range: std::ops::Range<usize>| {
        hex.trim_start_matches('#')
            .get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .map_or(0.0, |value| f32::from(value) / 255.0)
    };

    (channel(0..2), channel(2..4), channel(4..6))
}

fn draw_table(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    report: &Report,
    page_height: f32,
    top: f32,
) {
    let mut y = page_height - top - ROW_HEIGHT;

    layer.set_fill_color(rgb(TEXT_COLOUR));
    for (header, x) in TABLE_COLUMNS {
        text(layer, &fonts.bold, 10.0, x, y, header);
    }
    rule(layer, y - 2.0);

    if report.rows.is_empty() {
        y -= ROW_HEIGHT;
        layer.set_fill_color(rgb(TEXT_COLOUR));
        text(layer, &fonts.regular, 9.0, MARGIN, y, "No hay quejas en este periodo");
        return;
    }

    let shown = rows_that_fit(report.rows.len());
    for row in &report.rows[..shown] {
        y -= ROW_HEIGHT;
        layer.set_fill_color(rgb(TEXT_COLOUR));

        let cells = [
            truncate(&row.folio, 18),
            truncate(&row.tipo, 26),
            row.estatus.label().to_owned(),
            row.fecha.clone(),
        ];

        for (cell, (_, x)) in cells.iter().zip(TABLE_COLUMNS) {
            text(layer, &fonts.regular, 9.0, x, y, cell);
        }
        rule(layer, y - 2.0);
    }

    let left_out = report.rows.len() - shown;
    if left_out > 0 {
        y -= ROW_HEIGHT;
        layer.set_fill_color(rgb(TEXT_COLOUR));
        text(
            layer,
            &fonts.bold,
            9.0,
            MARGIN,
            y,
            &format!("{left_out} quejas más no caben en esta página"),
        );
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }

    let mut truncated: String = value.chars().take(max_chars - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Replace characters the built-in PDF fonts cannot show.
///
/// Spanish accents are folded to their base letter, anything else outside
/// ASCII becomes '?'.
fn pdf_safe_text(value: &str) -> String {
    value
        .chars()
        .map(|character| match character {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            '¿' | '¡' => ' ',
            character if character.is_ascii() => character,
            _ => '?',
        })
        .collect()
}
