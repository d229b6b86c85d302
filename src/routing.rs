//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    complaint::{
        get_complaints_page, get_complaints_table, get_edit_complaint_page,
        update_complaint_endpoint,
    },
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    report::{get_report_page, get_report_pdf},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::COMPLAINTS_VIEW, get(get_complaints_page))
        .route(
            endpoints::EDIT_COMPLAINT_VIEW,
            get(get_edit_complaint_page),
        )
        .route(endpoints::REPORT_VIEW, get(get_report_page))
        .route(endpoints::REPORT_PDF, get(get_report_pdf))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // htmx requests need the HX-Redirect header for auth redirects to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::COMPLAINTS_TABLE, get(get_complaints_table))
            .route(endpoints::PUT_COMPLAINT, put(update_complaint_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the complaints page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::COMPLAINTS_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_complaints() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::COMPLAINTS_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use time::OffsetDateTime;

    use crate::{
        AppState,
        complaint::ComplaintStore,
        endpoints,
        gateway::ApiClient,
        test_utils::{FakeApi, sample_complaints, sample_complaints_json},
    };

    use super::build_router;

    async fn get_test_server() -> (TestServer, FakeApi) {
        let api = FakeApi::start(sample_complaints_json()).await;
        let store = ComplaintStore::shared();
        store
            .write()
            .unwrap()
            .replace_all(sample_complaints(), OffsetDateTime::now_utc());

        let state = AppState::new(
            "nafstenoas",
            "Etc/UTC",
            ApiClient::new(&api.base_url, Duration::from_secs(2)).unwrap(),
            store,
        )
        .unwrap();

        let server = TestServer::builder()
            .save_cookies()
            .try_build(build_router(state))
            .expect("Could not create test server.");

        (server, api)
    }

    async fn log_in(server: &TestServer) {
        let credentials = FakeApi::valid_credentials();

        server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("usuario", credentials.usuario.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn protected_page_redirects_to_log_in() {
        let (server, _api) = get_test_server().await;

        let response = server.get(endpoints::COMPLAINTS_VIEW).await;

        response.assert_status_see_other();
        assert!(response.header("location").to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW));
    }

    #[tokio::test]
    async fn htmx_route_uses_hx_redirect() {
        let (server, _api) = get_test_server().await;

        let response = server
            .get(endpoints::COMPLAINTS_TABLE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", "http://localhost/quejas")
            .await;

        response.assert_status_ok();
        assert!(response.maybe_header("hx-redirect").is_some());
    }

    #[tokio::test]
    async fn log_in_unlocks_pages() {
        let (server, _api) = get_test_server().await;
        log_in(&server).await;

        server.get(endpoints::COMPLAINTS_VIEW).await.assert_status_ok();
        server.get(endpoints::REPORT_VIEW).await.assert_status_ok();
        server.get("/quejas/Q-001/editar").await.assert_status_ok();
        server
            .get(endpoints::COMPLAINTS_TABLE)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_complaint_is_not_found() {
        let (server, _api) = get_test_server().await;
        log_in(&server).await;

        server
            .get("/quejas/Q-999/editar")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn folio_named_tabla_reaches_complaint_update() {
        let (server, api) = get_test_server().await;
        log_in(&server).await;

        let response = server
            .put("/api/quejas/tabla")
            .form(&[("estatus", "Resuelta"), ("description", "")])
            .await;

        response.assert_status_not_found();
        assert!(api.updates().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _api) = get_test_server().await;

        server.get("/no-existe").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn log_out_locks_pages_again() {
        let (server, _api) = get_test_server().await;
        log_in(&server).await;

        server.get(endpoints::LOG_OUT).await;

        server
            .get(endpoints::COMPLAINTS_VIEW)
            .await
            .assert_status_see_other();
    }
}
