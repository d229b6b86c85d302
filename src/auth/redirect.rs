//! Where to send an administrator after they log in.
//!
//! Only same-origin page paths are accepted as targets. The log-in page and
//! the `/api` routes are rejected: one would loop and the others return
//! fragments rather than pages.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

fn is_safe_redirect_target(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && path != "/api" && !path.starts_with("/api/")
}

/// Reduce `raw_url` to a safe, relative redirect target.
///
/// Returns `None` for absolute URLs and for targets that are not pages.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    safe_path_and_query(&uri)
}

fn safe_path_and_query(uri: &Uri) -> Option<String> {
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_target(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that sends the client back to the page it asked for.
///
/// Requests to `/api` routes come from htmx, so the page the user is on is
/// taken from the `HX-Current-URL` header instead of the request URI.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    serde_urlencoded::to_string([("redirect_url", redirect_target)])
        .inspect_err(|error| {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}")
        })
        .ok()
        .map(|query| format!("{}?{}", endpoints::LOG_IN_VIEW, query))
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    // HX-Current-URL is absolute, so only its path and query are kept.
    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| safe_path_and_query(&uri));

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}
