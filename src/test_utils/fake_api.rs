//! A stand-in for the remote complaints API, served on an ephemeral local port.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::{complaint::Complaint, gateway::Credentials};

const VALID_USUARIO: &str = "admin";
const VALID_PASSWORD: &str = "quejas123";

#[derive(Default)]
struct FakeApiState {
    complaints: Mutex<Value>,
    fetch_count: AtomicUsize,
    failing: AtomicBool,
    updates: Mutex<Vec<(String, Value)>>,
}

/// A running fake API. The server stops when this is dropped.
pub(crate) struct FakeApi {
    /// The base URL to hand to `ApiClient::new`, e.g. "http://127.0.0.1:1234/api".
    pub base_url: String,
    state: Arc<FakeApiState>,
    task: JoinHandle<()>,
}

impl FakeApi {
    /// Serve `complaints` from `GET /api/quejas`.
    pub(crate) async fn start(complaints: Value) -> Self {
        let state = Arc::new(FakeApiState {
            complaints: Mutex::new(complaints),
            ..Default::default()
        });

        let router = Router::new()
            .route("/api/quejas", get(list_complaints))
            .route("/api/quejas/{folio}", put(update_complaint))
            .route("/api/login", post(log_in))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind fake API listener");
        let address = listener
            .local_addr()
            .expect("Could not get fake API address");

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fake API server failed");
        });

        Self {
            base_url: format!("http://{address}/api"),
            state,
            task,
        }
    }

    /// The credentials the fake API accepts.
    pub(crate) fn valid_credentials() -> Credentials {
        Credentials {
            usuario: VALID_USUARIO.to_owned(),
            password: VALID_PASSWORD.to_owned(),
        }
    }

    /// How many times the complaint list has been requested.
    pub(crate) fn fetch_count(&self) -> usize {
        self.state.fetch_count.load(Ordering::SeqCst)
    }

    /// Make every endpoint answer with 500 Internal Server Error.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Replace the complaints served by `GET /api/quejas`.
    pub(crate) fn set_complaints(&self, complaints: Value) {
        *self.state.complaints.lock().unwrap() = complaints;
    }

    /// The accepted updates, as (folio, JSON body) pairs.
    pub(crate) fn updates(&self) -> Vec<(String, Value)> {
        self.state.updates.lock().unwrap().clone()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn list_complaints(State(state): State<Arc<FakeApiState>>) -> Response {
    state.fetch_count.fetch_add(1, Ordering::SeqCst);

    if state.failing.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Json(state.complaints.lock().unwrap().clone()).into_response()
}

async fn update_complaint(
    State(state): State<Arc<FakeApiState>>,
    Path(folio): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let exists = state
        .complaints
        .lock()
        .unwrap()
        .as_array()
        .is_some_and(|complaints| {
            complaints.iter().any(|complaint| {
                complaint["folio"].as_str() == Some(&folio)
                    || complaint["id"].as_str() == Some(&folio)
            })
        });

    if !exists {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response();
    }

    state.updates.lock().unwrap().push((folio, body));

    Json(json!({"ok": true})).into_response()
}

async fn log_in(State(state): State<Arc<FakeApiState>>, Json(body): Json<Value>) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let is_valid = body["usuario"].as_str() == Some(VALID_USUARIO)
        && body["password"].as_str() == Some(VALID_PASSWORD);

    if is_valid {
        Json(json!({"success": true})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"success": false}))).into_response()
    }
}

/// A base URL on which nothing is listening.
pub(crate) fn unreachable_api_url() -> String {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Could not bind probe listener");
    let port = listener
        .local_addr()
        .expect("Could not get probe address")
        .port();
    drop(listener);

    format!("http://127.0.0.1:{port}/api")
}

/// Three complaints as the remote API would send them.
///
/// Q-001 and Q-003 are "Baches", Q-002 is "Alumbrado" and carries both the
/// citizen's `texto` and an admin `description`. Q-003 has no description.
pub(crate) fn sample_complaints_json() -> Value {
    json!([
        {
            "folio": "Q-001",
            "tipo": "Baches",
            "estatus": "Recibida",
            "fecha": "2024-06-01T10:30:00",
            "description": "Bache en la avenida principal"
        },
        {
            "folio": "Q-002",
            "tipo": "Alumbrado",
            "estatus": "En proceso",
            "fecha": "2024-06-10T08:00:00",
            "texto": "La lámpara de la esquina no enciende",
            "description": "Lámpara fundida"
        },
        {
            "id": "Q-003",
            "tipo": "Baches",
            "estatus": "Resuelta",
            "fecha": "2024-05-20T12:00:00"
        }
    ])
}

/// The decoded form of [sample_complaints_json].
pub(crate) fn sample_complaints() -> Vec<Complaint> {
    serde_json::from_value(sample_complaints_json()).expect("Could not decode sample complaints")
}
