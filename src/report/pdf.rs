//! Analysis report rendered as an A4 PDF with `printpdf` builtin fonts.
//!
//! Sections: header, summary table, results table, per-biomarker
//! explanations, disclaimer, footer. Text is laid out top-down with a
//! millimetre cursor and a new page is started when it reaches the bottom
//! margin.

use std::io::BufWriter;

use chrono::NaiveDateTime;
use printpdf::*;

use super::ReportError;
use crate::config::{APP_NAME, APP_VERSION};
use crate::models::enums::BiomarkerStatus;
use crate::models::{AnalysisRecord, AnalysisReport};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 20.0;
const LEFT: f32 = 20.0;

const DISCLAIMER: &[&str] = &[
    "This information is for educational purposes only. It never replaces the advice, \
     diagnosis or treatment of a qualified healthcare professional.",
    "The normal ranges shown are general values and may vary with your age, sex, \
     health status and the testing laboratory.",
    "Always consult your doctor to interpret your results. Never stop an ongoing \
     treatment without medical advice.",
];

/// Render the report with the current local time as generation date.
pub fn render_analysis_pdf(report: &AnalysisReport) -> Result<Vec<u8>, ReportError> {
    render_analysis_pdf_at(report, chrono::Local::now().naive_local())
}

pub fn render_analysis_pdf_at(
    report: &AnalysisReport,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, ReportError> {
    let title = format!("{APP_NAME} - Blood Test Analysis");
    let (doc, page1, layer1) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let italic = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(|e| ReportError::Font(e.to_string()))?;

    let mut page = PageCursor {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: TOP,
        pages: 1,
    };

    // Header
    page.text(&title, 16.0, LEFT, &bold);
    page.advance(8.0);
    page.text(
        &format!("Analysis date: {}", generated_at.format("%d/%m/%Y %H:%M")),
        10.0,
        LEFT,
        &font,
    );
    page.advance(10.0);

    write_summary(&mut page, report, &font, &bold);
    write_results_table(&mut page, &report.results, &font, &bold);
    write_details(&mut page, &report.results, &font, &bold);

    // Disclaimer
    page.heading("Important medical notice", &bold);
    for paragraph in DISCLAIMER {
        page.paragraph(paragraph, 9.0, LEFT, 95, &font);
        page.advance(2.0);
    }

    // Footer
    page.advance(8.0);
    page.ensure_space(10.0);
    page.set_color(0.45, 0.45, 0.45);
    page.text(
        &format!("Generated by {APP_NAME} v{APP_VERSION} - educational blood test analysis"),
        8.0,
        LEFT,
        &italic,
    );
    page.advance(4.0);
    page.text(
        &format!("Generated on {}", generated_at.format("%d/%m/%Y %H:%M:%S")),
        8.0,
        LEFT,
        &italic,
    );

    tracing::debug!(pages = page.pages, results = report.results.len(), "Rendered analysis PDF");

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ReportError::Save(e.to_string()))
}

fn write_summary(
    page: &mut PageCursor<'_>,
    report: &AnalysisReport,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    page.heading("Analysis summary", bold);

    let total = report.results.len() as u32;
    let summary = &report.summary;
    let mut rows = vec![
        ("Total analyzed", total, "100%".to_string()),
        ("Normal values", summary.normal, percentage(summary.normal, total)),
        ("Low values", summary.low, percentage(summary.low, total)),
        ("High values", summary.high, percentage(summary.high, total)),
    ];
    if summary.unknown > 0 {
        rows.push(("Unknown", summary.unknown, percentage(summary.unknown, total)));
    }

    let columns = [LEFT, LEFT + 80.0, LEFT + 110.0];
    page.row(&["Indicator", "Count", "Percentage"], &columns, 10.0, bold);
    for (label, count, pct) in rows {
        page.row(&[label, &count.to_string(), &pct], &columns, 10.0, font);
    }
    page.advance(6.0);
}

fn write_results_table(
    page: &mut PageCursor<'_>,
    results: &[AnalysisRecord],
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    page.heading("Results overview", bold);

    let columns = [LEFT, LEFT + 55.0, LEFT + 90.0, LEFT + 140.0];
    page.row(&["Biomarker", "Your value", "Normal range", "Status"], &columns, 10.0, bold);
    for record in results {
        let value = format!("{} {}", record.value, record.unit);
        let range = format!("{} - {} {}", record.min_bound, record.max_bound, record.unit);
        let name = truncate(&record.display_name, 30);
        page.ensure_space(5.0);
        let (r, g, b) = status_color(record.status);
        page.set_color(r, g, b);
        page.text(status_label(record.status), 9.0, columns[3], font);
        page.set_color(0.0, 0.0, 0.0);
        page.row(&[&name, &value, &range], &columns[..3], 9.0, font);
    }
    page.advance(6.0);
}

fn write_details(
    page: &mut PageCursor<'_>,
    results: &[AnalysisRecord],
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    page.heading("Detailed explanations", bold);

    for (i, record) in results.iter().enumerate() {
        page.ensure_space(20.0);
        let (r, g, b) = status_color(record.status);
        page.set_color(r, g, b);
        page.text(&format!("{}. {}", i + 1, record.display_name), 11.0, LEFT, bold);
        page.set_color(0.0, 0.0, 0.0);
        page.advance(6.0);

        page.text("What is it?", 9.0, LEFT, bold);
        page.advance(4.5);
        page.paragraph(&record.explanation, 9.0, LEFT, 95, font);
        page.advance(2.0);

        page.text("Recommendation:", 9.0, LEFT + 4.0, bold);
        page.advance(4.5);
        page.paragraph(&record.advice, 9.0, LEFT + 4.0, 90, font);
        page.advance(5.0);
    }
}

/// Top-down text cursor over the current page.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageCursor<'_> {
    /// Start a new page if fewer than `height` mm remain.
    fn ensure_space(&mut self, height: f32) {
        if self.y - height < BOTTOM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
    }

    fn advance(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn set_color(&self, r: f32, g: f32, b: f32) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn heading(&mut self, text: &str, bold: &IndirectFontRef) {
        self.ensure_space(16.0);
        self.text(text, 13.0, LEFT, bold);
        self.advance(7.0);
    }

    /// One table row, cells placed at the given x offsets.
    fn row(&mut self, cells: &[&str], columns: &[f32], size: f32, font: &IndirectFontRef) {
        self.ensure_space(5.0);
        for (cell, x) in cells.iter().zip(columns) {
            self.text(cell, size, *x, font);
        }
        self.advance(5.0);
    }

    fn paragraph(&mut self, text: &str, size: f32, x: f32, max_chars: usize, font: &IndirectFontRef) {
        for line in wrap_text(text, max_chars) {
            self.ensure_space(4.5);
            self.text(&line, size, x, font);
            self.advance(4.5);
        }
    }
}

fn percentage(count: u32, total: u32) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.0}%", count as f64 / total as f64 * 100.0)
}

fn status_label(status: BiomarkerStatus) -> &'static str {
    match status {
        BiomarkerStatus::Normal => "Normal",
        BiomarkerStatus::Low => "Low",
        BiomarkerStatus::High => "High",
        BiomarkerStatus::Unknown => "Unknown",
    }
}

fn status_color(status: BiomarkerStatus) -> (f32, f32, f32) {
    match status {
        BiomarkerStatus::Normal => (0.06, 0.73, 0.51),
        BiomarkerStatus::Low => (0.96, 0.62, 0.04),
        BiomarkerStatus::High => (0.94, 0.27, 0.27),
        BiomarkerStatus::Unknown => (0.42, 0.45, 0.50),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
