//! The complaints report: the records filed within a report window, counted
//! by status, previewed on a page and exported as a PDF.

mod pdf;
mod report_page;

use time::OffsetDateTime;

use crate::complaint::{
    Complaint, FrequencyTable, ReportWindow, Status, count_by_status, format_timestamp, partition,
};

pub use pdf::render_pdf;
pub use report_page::{get_report_page, get_report_pdf};

/// The heading of the report page and the PDF.
pub const REPORT_TITLE: &str = "Reporte de Quejas";

/// The file name the PDF is downloaded as.
pub const REPORT_FILE_NAME: &str = "reporte_quejas.pdf";

/// One line of the report table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub folio: String,
    pub tipo: String,
    pub estatus: Status,
    /// The filing time formatted in the local timezone.
    pub fecha: String,
}

/// Everything needed to draw a report, independent of the output format.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Describes the window, e.g. "Este mes".
    pub window_label: String,
    /// When the report was built, formatted in the local timezone.
    pub generated_at: String,
    pub rows: Vec<ReportRow>,
    pub by_status: FrequencyTable,
}

/// Collect the complaints that fall inside `window`.
///
/// `now` must already be in the local offset; it anchors the presets and
/// is the offset timestamps without one are read in.
pub fn build_report(complaints: &[Complaint], window: &ReportWindow, now: OffsetDateTime) -> Report {
    let local_offset = now.offset();
    let range = window.resolve(now);
    let (inside, _) = partition(complaints, &range, local_offset);

    let rows = inside
        .iter()
        .map(|complaint| ReportRow {
            folio: complaint.folio.to_string(),
            tipo: complaint.tipo.clone(),
            estatus: complaint.estatus,
            fecha: complaint.display_fecha(local_offset),
        })
        .collect();

    Report {
        window_label: window.label(),
        generated_at: format_timestamp(now),
        rows,
        by_status: count_by_status(inside),
    }
}
