//! The page for changing the status and description of one complaint.

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    AppState, Error,
    complaint::{
        Complaint, Draft, EditWorkflow, Folio, SharedStore, Status, save_edit, saved_complaint_url,
    },
    endpoints::{self, format_endpoint},
    gateway::ApiClient,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, loading_spinner, status_badge,
    },
    navigation::NavBar,
    timezone::get_local_offset,
};

/// The state needed to show and save the edit form.
#[derive(Debug, Clone)]
pub struct EditComplaintState {
    /// The complaints loaded from the remote API.
    pub store: SharedStore,
    /// The client used to send accepted edits to the remote API.
    pub gateway: ApiClient,
    /// The local timezone as a canonical timezone name, e.g. "America/Mexico_City".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditComplaintState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            gateway: state.gateway.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the edit form for the complaint with `folio`.
///
/// Responds with the 404 page if no such complaint is loaded.
pub async fn get_edit_complaint_page(
    State(state): State<EditComplaintState>,
    Path(folio): Path<String>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let complaint = state
        .store
        .read()
        .inspect_err(|error| tracing::error!("Could not acquire store lock: {error}"))
        .map_err(|_| Error::StoreLockError)?
        .get(&Folio::new(folio))
        .cloned()
        .ok_or(Error::NotFound)?;

    let nav_bar = NavBar::new(endpoints::COMPLAINTS_VIEW).into_html();
    let draft = Draft::from_complaint(&complaint);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-lg space-y-6"
            {
                h1 class="text-xl font-bold" { "Editar Queja " (complaint.folio) }

                (complaint_summary(&complaint, &complaint.display_fecha(local_offset)))
                (edit_form(&complaint.folio, &draft, None))
            }
        }
    };

    Ok(base(&format!("Editar Queja {}", complaint.folio), &[], &content).into_response())
}

fn complaint_summary(complaint: &Complaint, fecha: &str) -> Markup {
    html! {
        dl class="grid grid-cols-[auto_1fr] gap-x-4 gap-y-2 text-sm"
        {
            dt class="font-medium" { "Tipo" }
            dd { (complaint.tipo) }

            dt class="font-medium" { "Fecha" }
            dd { (fecha) }

            dt class="font-medium" { "Texto" }
            dd { (complaint.texto.as_deref().unwrap_or("N/A")) }

            dt class="font-medium" { "Estado actual" }
            dd { (status_badge(complaint.estatus)) }
        }
    }
}

fn edit_form(folio: &Folio, draft: &Draft, error_message: Option<&str>) -> Markup {
    html! {
        form
            id="edit-complaint-form"
            hx-put=(format_endpoint(endpoints::PUT_COMPLAINT, folio.as_str()))
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#estatus, #description, #submit-button"
            class="space-y-4"
        {
            div
            {
                label for="estatus" class=(FORM_LABEL_STYLE) { "Estado" }
                select id="estatus" name="estatus" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for status in Status::ALL
                    {
                        option value=(status.label()) selected[status == draft.estatus]
                        {
                            (status)
                        }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Descripción" }
                textarea
                    id="description"
                    name="description"
                    rows="4"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (draft.description)
                }
            }

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { "Error al actualizar: " (error_message) }
            }

            div class="flex gap-4"
            {
                a href=(endpoints::COMPLAINTS_VIEW) class=(BUTTON_SECONDARY_STYLE)
                {
                    "Cancelar"
                }

                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator"
                    {
                        (loading_spinner())
                        "Guardando... "
                    }
                    "Guardar Cambios"
                }
            }
        }
    }
}

/// Send the edited status and description to the remote API.
///
/// On success the client is redirected to the complaints page. When the
/// remote API rejects the change the form is sent back with the draft kept
/// and the reason shown.
pub async fn update_complaint_endpoint(
    State(state): State<EditComplaintState>,
    Path(folio): Path<String>,
    Form(draft): Form<Draft>,
) -> Response {
    let folio = Folio::new(folio);

    let complaint = match state.store.read() {
        Ok(store) => store.get(&folio).cloned(),
        Err(error) => {
            tracing::error!("Could not acquire store lock: {error}");
            return Error::StoreLockError.into_alert_response();
        }
    };

    let Some(complaint) = complaint else {
        return Error::UpdateMissingComplaint(folio.to_string()).into_alert_response();
    };

    let mut workflow = EditWorkflow::default();
    if let Err(error) = workflow
        .select(&complaint)
        .and_then(|_| workflow.update_draft(draft))
    {
        return Error::from(error).into_alert_response();
    }

    match save_edit(&mut workflow, &state.gateway, &state.store).await {
        Ok(()) => {
            tracing::info!("Updated complaint {folio}");
            (
                HxRedirect(saved_complaint_url(folio.as_str())),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::Gateway(_)) => match workflow.draft() {
            Some(draft) => edit_form(&folio, draft, workflow.error()).into_response(),
            None => Error::UpdateMissingComplaint(folio.to_string()).into_alert_response(),
        },
        Err(error) => error.into_alert_response(),
    }
}
