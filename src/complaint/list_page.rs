//! The complaints page: search and filters, the two frequency charts and the
//! complaints table.
//!
//! The charts and table live in one region that the browser re-fetches from
//! [endpoints::COMPLAINTS_TABLE] whenever a filter changes and on a fixed
//! interval, so that refreshes of the store show up without reloading.

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::UtcOffset;

use crate::{
    AppState, Error,
    alert::Alert,
    chart::ChartSurface,
    complaint::{
        ALL_SENTINEL, CategoryFilter, Complaint, ComplaintStore, FilterQuery, FilterState,
        SharedStore, Status, StatusFilter, count_by_category, count_by_status,
        distinct_categories, filter_complaints, format_timestamp,
    },
    endpoints::{self, format_endpoint},
    html::{
        ECHARTS_SCRIPT, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        loading_spinner, status_badge,
    },
    navigation::NavBar,
    timezone::get_local_offset,
};

const CONTENT_ID: &str = "complaints-content";
const CATEGORY_SELECT_ID: &str = "tipo-filter";
const CATEGORY_CHART_ID: &str = "category-chart";
const STATUS_CHART_ID: &str = "status-chart";

/// Poll slowly once data is loaded, quickly while waiting for the first fetch.
const POLL_LOADED: &str = "every 10s";
const POLL_LOADING: &str = "every 1s";

/// The state needed for the complaints page.
#[derive(Debug, Clone)]
pub struct ComplaintsPageState {
    /// The complaints loaded from the remote API.
    pub store: SharedStore,
    /// The local timezone as a canonical timezone name, e.g. "America/Mexico_City".
    pub local_timezone: String,
}

impl FromRef<AppState> for ComplaintsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Set by the edit page after a save so the complaints page can confirm it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedNotice {
    /// The folio of the complaint that was just saved.
    pub actualizada: Option<String>,
}

/// The complaints page URL that confirms `folio` was saved.
pub fn saved_complaint_url(folio: &str) -> String {
    let query = serde_urlencoded::to_string([("actualizada", folio)]).unwrap_or_default();

    format!("{}?{query}", endpoints::COMPLAINTS_VIEW)
}

/// Display the complaints page with the filters in `query` applied.
pub async fn get_complaints_page(
    State(state): State<ComplaintsPageState>,
    Query(query): Query<FilterQuery>,
    Query(notice): Query<SavedNotice>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let filters = FilterState::from(query);

    let store = state
        .store
        .read()
        .inspect_err(|error| tracing::error!("Could not acquire store lock: {error}"))
        .map_err(|_| Error::StoreLockError)?;

    let nav_bar = NavBar::new(endpoints::COMPLAINTS_VIEW).into_html();
    let categories = distinct_categories(store.complaints());

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-6"
            {
                h1 class="text-2xl font-bold" { "Panel de Administración de Quejas" }

                @if let Some(folio) = notice.actualizada.as_deref().filter(|folio| !folio.is_empty())
                {
                    (Alert::success(
                        "Estatus actualizado",
                        &format!("La queja {folio} se guardó correctamente."),
                    )
                    .into_html())
                }

                (filter_form(&filters, &categories))
                (complaints_content(&store, &filters, local_offset))
            }
        }
    };

    let head_elements = [HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned())];

    Ok(base("Quejas", &head_elements, &content).into_response())
}

/// The charts and table for the filters in `query`, for htmx to swap into
/// the complaints page.
///
/// The category drop-down is sent along as an out-of-band swap so that new
/// categories appear as the store is refreshed.
pub async fn get_complaints_table(
    State(state): State<ComplaintsPageState>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let filters = FilterState::from(query);

    let store = match state.store.read() {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("Could not acquire store lock: {error}");
            return Error::StoreLockError.into_alert_response();
        }
    };

    let categories = distinct_categories(store.complaints());

    html! {
        (complaints_content(&store, &filters, local_offset))
        (category_select(&filters.category, &categories, true))
    }
    .into_response()
}

fn filter_form(filters: &FilterState, categories: &[&str]) -> Markup {
    html! {
        form
            id="complaint-filters"
            hx-get=(endpoints::COMPLAINTS_TABLE)
            hx-target={ "#" (CONTENT_ID) }
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-trigger="change, keyup changed delay:300ms from:#buscar"
            class="grid grid-cols-1 md:grid-cols-3 gap-4"
        {
            div
            {
                label for="buscar" class=(FORM_LABEL_STYLE) { "Buscar" }
                input
                    id="buscar"
                    name="buscar"
                    type="search"
                    placeholder="Buscar..."
                    value=(filters.search)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for=(CATEGORY_SELECT_ID) class=(FORM_LABEL_STYLE) { "Tipo" }
                (category_select(&filters.category, categories, false))
            }

            div
            {
                label for="estatus-filter" class=(FORM_LABEL_STYLE) { "Estado" }
                (status_select(&filters.status))
            }
        }
    }
}

fn category_select(selected: &CategoryFilter, categories: &[&str], out_of_band: bool) -> Markup {
    let mut options: Vec<&str> = categories.to_vec();

    // Keep a selected category that has disappeared from the data selectable.
    if let CategoryFilter::Only(tipo) = selected {
        if !options.contains(&tipo.as_str()) {
            options.push(tipo);
        }
    }

    html! {
        select
            id=(CATEGORY_SELECT_ID)
            name="tipo"
            hx-swap-oob=[out_of_band.then_some("true")]
            class=(FORM_TEXT_INPUT_STYLE)
        {
            option value=(ALL_SENTINEL) selected[*selected == CategoryFilter::All]
            {
                "Todos los tipos"
            }

            @for tipo in options
            {
                option value=(tipo) selected[selected.as_param() == tipo] { (tipo) }
            }
        }
    }
}

fn status_select(selected: &StatusFilter) -> Markup {
    html! {
        select id="estatus-filter" name="estatus" class=(FORM_TEXT_INPUT_STYLE)
        {
            option value=(ALL_SENTINEL) selected[*selected == StatusFilter::All]
            {
                "Todos los estados"
            }

            @for status in Status::ALL
            {
                option
                    value=(status.label())
                    selected[*selected == StatusFilter::Only(status)]
                {
                    (status)
                }
            }
        }
    }
}

fn complaints_content(
    store: &ComplaintStore,
    filters: &FilterState,
    local_offset: UtcOffset,
) -> Markup {
    let poll_url = format!("{}?{}", endpoints::COMPLAINTS_TABLE, filters.to_query());
    let is_loading = !store.is_loaded() && store.last_error().is_none();
    let poll_trigger = if store.is_loaded() {
        POLL_LOADED
    } else {
        POLL_LOADING
    };

    let complaints = filter_complaints(store.complaints(), filters);

    let mut category_chart = ChartSurface::new(CATEGORY_CHART_ID, "Quejas por tipo");
    category_chart.replace(&count_by_category(complaints.iter().copied()));
    let mut status_chart = ChartSurface::new(STATUS_CHART_ID, "Quejas por estado");
    status_chart.replace(&count_by_status(complaints.iter().copied()));

    html! {
        div
            id=(CONTENT_ID)
            hx-get=(poll_url)
            hx-trigger=(poll_trigger)
            hx-swap="outerHTML"
            class="space-y-6"
        {
            @if let Some(error) = store.last_error()
            {
                (Alert::error("Error al cargar quejas", error).into_html())
            }

            @if is_loading
            {
                div role="status" class="flex items-center justify-center gap-2 py-16"
                {
                    (loading_spinner())
                    p { "Cargando quejas..." }
                }
            }
            @else
            {
                section class="grid grid-cols-1 lg:grid-cols-2 gap-4"
                {
                    div { (category_chart.markup()) }
                    div { (status_chart.markup()) }
                }

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "Mostrando " (complaints.len()) " de " (store.complaints().len()) " quejas"

                    @if let Some(loaded_at) = store.loaded_at()
                    {
                        " · Actualizado: " (format_timestamp(loaded_at.to_offset(local_offset)))
                    }
                }

                (complaints_table(&complaints, local_offset))
            }
        }
    }
}

fn complaints_table(complaints: &[&Complaint], local_offset: UtcOffset) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md rounded"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Folio" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Tipo" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Estado" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Fecha" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Descripción" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Acciones" }
                    }
                }

                tbody
                {
                    @for complaint in complaints
                    {
                        tr class=(TABLE_ROW_STYLE) data-folio=(complaint.folio)
                        {
                            td class=(TABLE_CELL_STYLE) { (complaint.folio) }
                            td class=(TABLE_CELL_STYLE) { (complaint.tipo) }
                            td class=(TABLE_CELL_STYLE) { (status_badge(complaint.estatus)) }
                            td class=(TABLE_CELL_STYLE) { (complaint.display_fecha(local_offset)) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (complaint.description.as_deref().unwrap_or("N/A"))
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                a
                                    href=(format_endpoint(endpoints::EDIT_COMPLAINT_VIEW, complaint.folio.as_str()))
                                    class=(LINK_STYLE)
                                {
                                    "Editar"
                                }
                            }
                        }
                    }

                    @if complaints.is_empty()
                    {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class="px-6 py-4 text-center"
                            {
                                "No se encontraron quejas"
                            }
                        }
                    }
                }
            }
        }
    }
}
