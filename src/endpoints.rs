//! The URIs served by the console.
//!
//! For endpoints that take a parameter, e.g., '/quejas/{folio}/editar', use [format_endpoint].

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// The root route which redirects to the complaints page.
pub const ROOT: &str = "/";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The landing page for logged in administrators: filters, charts and the complaints table.
pub const COMPLAINTS_VIEW: &str = "/quejas";
/// The page for editing the status and description of a complaint.
pub const EDIT_COMPLAINT_VIEW: &str = "/quejas/{folio}/editar";
/// The page for choosing a report window and previewing the report.
pub const REPORT_VIEW: &str = "/reporte";
/// The route that downloads the report as a PDF file.
pub const REPORT_PDF: &str = "/reporte/pdf";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in an administrator.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current administrator.
pub const LOG_OUT: &str = "/api/log_out";
/// The partial with the charts and table of the complaints page, polled by the browser.
///
/// Kept outside `/api/quejas/` so that it cannot shadow a complaint whose folio is "tabla".
pub const COMPLAINTS_TABLE: &str = "/api/quejas_tabla";
/// The route to update a complaint.
pub const PUT_COMPLAINT: &str = "/api/quejas/{folio}";

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/quejas/{folio}', '{folio}' is the parameter.
///
/// `value` is percent-encoded so that it stays a single path segment.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        utf8_percent_encode(value, PATH_SEGMENT),
        &endpoint_path[param_end..]
    )
}

/// The unreserved characters of RFC 3986 pass through, everything else is encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');
