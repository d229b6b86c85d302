//! The report page, where the administrator picks a window and previews the
//! report, and the route that downloads it as a PDF.

use axum::{
    extract::{FromRef, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    chart::ChartSurface,
    complaint::{ReportWindow, SharedStore, WindowPreset, WindowQuery},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, ECHARTS_SCRIPT, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, status_badge,
    },
    navigation::NavBar,
    report::{REPORT_FILE_NAME, REPORT_TITLE, Report, build_report, render_pdf},
    timezone::local_now,
};

const REPORT_CHART_ID: &str = "report-chart";

/// The state needed for the report page and PDF download.
#[derive(Debug, Clone)]
pub struct ReportPageState {
    /// The complaints loaded from the remote API.
    pub store: SharedStore,
    /// The local timezone as a canonical timezone name, e.g. "America/Mexico_City".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl ReportPageState {
    fn build(&self, window: &ReportWindow) -> Result<Report, Error> {
        let now = local_now(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))?;

        let store = self
            .store
            .read()
            .inspect_err(|error| tracing::error!("Could not acquire store lock: {error}"))
            .map_err(|_| Error::StoreLockError)?;

        Ok(build_report(store.complaints(), window, now))
    }
}

/// Display the report window selector and a preview of the report.
///
/// An invalid custom date falls back to this month and is pointed out next
/// to the form.
pub async fn get_report_page(
    State(state): State<ReportPageState>,
    Query(query): Query<WindowQuery>,
) -> Result<Response, Error> {
    let (window, date_error) = match ReportWindow::from_query(&query) {
        Ok(window) => (window, None),
        Err(Error::InvalidDate(text)) => (
            ReportWindow::default(),
            Some(format!("\"{text}\" no es una fecha válida.")),
        ),
        Err(error) => return Err(error),
    };

    let report = state.build(&window)?;

    let mut chart = ChartSurface::new(REPORT_CHART_ID, "Quejas por estado");
    chart.replace(&report.by_status);

    let pdf_url = format!("{}?{}", endpoints::REPORT_PDF, window.to_query());
    let nav_bar = NavBar::new(endpoints::REPORT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-6"
            {
                h1 class="text-2xl font-bold" { (REPORT_TITLE) }

                (window_form(&window, date_error.as_deref()))

                div class="flex flex-wrap items-center justify-between gap-4"
                {
                    p
                    {
                        span class="font-medium" { "Periodo: " }
                        (report.window_label)
                        " · "
                        (report.rows.len()) " quejas"
                    }

                    a href=(pdf_url) class=(LINK_STYLE) download=(REPORT_FILE_NAME)
                    {
                        "Descargar PDF"
                    }
                }

                (chart.markup())
                (report_table(&report))
            }
        }
    };

    let head_elements = [HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned())];

    Ok(base(REPORT_TITLE, &head_elements, &content).into_response())
}

fn window_form(window: &ReportWindow, date_error: Option<&str>) -> Markup {
    let preset = window.preset();

    html! {
        form
            method="get"
            action=(endpoints::REPORT_VIEW)
            class="grid grid-cols-1 md:grid-cols-4 gap-4 items-end"
        {
            div
            {
                label for="ventana" class=(FORM_LABEL_STYLE) { "Periodo" }
                select id="ventana" name="ventana" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for choice in WindowPreset::ALL
                    {
                        option value=(choice.as_query_value()) selected[choice == preset]
                        {
                            (choice.label())
                        }
                    }
                }
            }

            div
            {
                label for="desde" class=(FORM_LABEL_STYLE) { "Desde" }
                input
                    id="desde"
                    name="desde"
                    type="date"
                    value=(window.start_input_value())
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="hasta" class=(FORM_LABEL_STYLE) { "Hasta" }
                input
                    id="hasta"
                    name="hasta"
                    type="date"
                    value=(window.end_input_value())
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Aplicar" }

            @if let Some(date_error) = date_error
            {
                p class="text-red-500 text-base md:col-span-4" { (date_error) }
            }
        }
    }
}

fn report_table(report: &Report) -> Markup {
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
                    }
                }

                tbody
                {
                    @for row in &report.rows
                    {
                        tr class=(TABLE_ROW_STYLE) data-folio=(row.folio)
                        {
                            td class=(TABLE_CELL_STYLE) { (row.folio) }
                            td class=(TABLE_CELL_STYLE) { (row.tipo) }
                            td class=(TABLE_CELL_STYLE) { (status_badge(row.estatus)) }
                            td class=(TABLE_CELL_STYLE) { (row.fecha) }
                        }
                    }

                    @if report.rows.is_empty()
                    {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="4" class="px-6 py-4 text-center"
                            {
                                "No hay quejas en este periodo"
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Download the report for the window in `query` as a PDF attachment.
pub async fn get_report_pdf(
    State(state): State<ReportPageState>,
    Query(query): Query<WindowQuery>,
) -> Response {
    let bytes = ReportWindow::from_query(&query)
        .and_then(|window| state.build(&window))
        .and_then(|report| render_pdf(&report));

    match bytes {
        Ok(bytes) => (
            [
                (CONTENT_TYPE, "application/pdf".to_owned()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
