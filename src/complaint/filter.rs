//! Text search and categorical filters over the loaded complaints.

use serde::{Deserialize, Serialize};

use crate::complaint::model::{Complaint, Status};

/// The drop-down value that disables a categorical filter.
pub const ALL_SENTINEL: &str = "todos";

/// Restricts complaints to a single category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category passes.
    #[default]
    All,
    /// Only complaints whose `tipo` equals the given label pass.
    Only(String),
}

impl CategoryFilter {
    fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_SENTINEL) => CategoryFilter::All,
            Some(tipo) => CategoryFilter::Only(tipo.to_owned()),
        }
    }

    /// The value to send back in a query string or drop-down.
    pub fn as_param(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_SENTINEL,
            CategoryFilter::Only(tipo) => tipo,
        }
    }

    fn matches(&self, complaint: &Complaint) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(tipo) => complaint.tipo == *tipo,
        }
    }
}

/// Restricts complaints to a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every status passes.
    #[default]
    All,
    /// Only complaints with this status pass.
    Only(Status),
}

impl StatusFilter {
    fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_SENTINEL) => StatusFilter::All,
            Some(label) => match Status::from_label(label) {
                Some(status) => StatusFilter::Only(status),
                None => {
                    tracing::warn!("Ignoring unknown status filter \"{label}\"");
                    StatusFilter::All
                }
            },
        }
    }

    /// The value to send back in a query string or drop-down.
    pub fn as_param(&self) -> &'static str {
        match self {
            StatusFilter::All => ALL_SENTINEL,
            StatusFilter::Only(status) => status.label(),
        }
    }

    fn matches(&self, complaint: &Complaint) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => complaint.estatus == *status,
        }
    }
}

/// The filter form as sent by the browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Free text search term.
    pub buscar: Option<String>,
    /// The selected category, or "todos".
    pub tipo: Option<String>,
    /// The selected status label, or "todos".
    pub estatus: Option<String>,
}

/// The active filters, combined with logical AND.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// The search term as typed. Blank means no text search.
    pub search: String,
    /// The category filter.
    pub category: CategoryFilter,
    /// The status filter.
    pub status: StatusFilter,
}

impl From<FilterQuery> for FilterState {
    fn from(query: FilterQuery) -> Self {
        Self {
            search: query.buscar.unwrap_or_default(),
            category: CategoryFilter::from_param(query.tipo.as_deref()),
            status: StatusFilter::from_param(query.estatus.as_deref()),
        }
    }
}

impl FilterState {
    /// Whether `complaint` passes every active filter.
    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.matches_search(complaint)
            && self.category.matches(complaint)
            && self.status.matches(complaint)
    }

    fn matches_search(&self, complaint: &Complaint) -> bool {
        let term = self.search.trim();

        if term.is_empty() {
            return true;
        }

        let term = term.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&term);

        contains(complaint.folio.as_str())
            || contains(&complaint.tipo)
            || complaint.description.as_deref().is_some_and(contains)
    }

    /// Encode the filters as a URL query string, without the leading '?'.
    pub fn to_query(&self) -> String {
        serde_urlencoded::to_string([
            ("buscar", self.search.as_str()),
            ("tipo", self.category.as_param()),
            ("estatus", self.status.as_param()),
        ])
        .unwrap_or_default()
    }
}

/// The complaints in `complaints` that pass `filters`, in their original order.
pub fn filter_complaints<'a>(complaints: &'a [Complaint], filters: &FilterState) -> Vec<&'a Complaint> {
    complaints
        .iter()
        .filter(|complaint| filters.matches(complaint))
        .collect()
}

/// The distinct categories in `complaints`, in first-seen order.
pub fn distinct_categories(complaints: &[Complaint]) -> Vec<&str> {
    let mut categories: Vec<&str> = Vec::new();

    for complaint in complaints {
        if !categories.contains(&complaint.tipo.as_str()) {
            categories.push(&complaint.tipo);
        }
    }

    categories
}

#[cfg(test)]
mod tests {
    use crate::complaint::model::{Complaint, Folio, Status};

    use super::{
        CategoryFilter, FilterQuery, FilterState, StatusFilter, distinct_categories,
        filter_complaints,
    };

    fn complaint(folio: &str, tipo: &str, estatus: Status, description: Option<&str>) -> Complaint {
        Complaint {
            folio: Folio::new(folio),
            id: None,
            tipo: tipo.to_owned(),
            estatus,
            fecha: None,
            description: description.map(str::to_owned),
            texto: None,
        }
    }

    fn sample() -> Vec<Complaint> {
        vec![
            complaint("Q-001", "Baches", Status::Recibida, Some("Bache enorme en la calle 5")),
            complaint("Q-002", "Alumbrado", Status::Resuelta, None),
            complaint("Q-003", "Baches", Status::EnProceso, Some("Hundimiento")),
            complaint("Q-004", "Basura", Status::Rechazada, Some("Contenedor lleno")),
        ]
    }

    fn folios(complaints: &[&Complaint]) -> Vec<String> {
        complaints
            .iter()
            .map(|complaint| complaint.folio.to_string())
            .collect()
    }

    #[test]
    fn default_filters_return_everything_in_order() {
        let complaints = sample();

        let got = filter_complaints(&complaints, &FilterState::default());

        assert_eq!(folios(&got), ["Q-001", "Q-002", "Q-003", "Q-004"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let complaints = vec![
            complaint("Q-010", "Recibida", Status::EnProceso, None),
            complaint("Q-011", "Baches", Status::Recibida, None),
        ];
        let filters = FilterState {
            search: "RECI".to_owned(),
            ..Default::default()
        };

        let got = filter_complaints(&complaints, &filters);

        assert_eq!(folios(&got), ["Q-010"]);
    }

    #[test]
    fn search_ignores_status_label() {
        let complaints = vec![complaint("Q-002", "Alumbrado", Status::Resuelta, None)];
        let filters = FilterState {
            search: "resuelta".to_owned(),
            ..Default::default()
        };

        assert!(filter_complaints(&complaints, &filters).is_empty());
    }

    #[test]
    fn search_matches_folio_tipo_and_description() {
        let complaints = sample();

        let by_folio = FilterState {
            search: "q-004".to_owned(),
            ..Default::default()
        };
        let by_tipo = FilterState {
            search: "alumbr".to_owned(),
            ..Default::default()
        };
        let by_description = FilterState {
            search: "hundi".to_owned(),
            ..Default::default()
        };

        assert_eq!(folios(&filter_complaints(&complaints, &by_folio)), ["Q-004"]);
        assert_eq!(folios(&filter_complaints(&complaints, &by_tipo)), ["Q-002"]);
        assert_eq!(
            folios(&filter_complaints(&complaints, &by_description)),
            ["Q-003"]
        );
    }

    #[test]
    fn whitespace_search_is_inactive() {
        let complaints = sample();
        let filters = FilterState {
            search: "   ".to_owned(),
            ..Default::default()
        };

        assert_eq!(filter_complaints(&complaints, &filters).len(), complaints.len());
    }

    #[test]
    fn missing_description_does_not_match_but_other_fields_can() {
        let complaints = sample();
        let filters = FilterState {
            search: "q-002".to_owned(),
            ..Default::default()
        };
        let in_description_only = FilterState {
            search: "calle".to_owned(),
            ..Default::default()
        };

        assert_eq!(folios(&filter_complaints(&complaints, &filters)), ["Q-002"]);
        assert_eq!(
            folios(&filter_complaints(&complaints, &in_description_only)),
            ["Q-001"]
        );
    }

    #[test]
    fn filters_combine_with_and() {
        let complaints = sample();
        let filters = FilterState {
            search: String::new(),
            category: CategoryFilter::Only("Baches".to_owned()),
            status: StatusFilter::Only(Status::EnProceso),
        };

        assert_eq!(folios(&filter_complaints(&complaints, &filters)), ["Q-003"]);
    }

    #[test]
    fn result_is_exactly_the_matching_subset() {
        let complaints = sample();
        let filters = FilterState {
            search: "ba".to_owned(),
            category: CategoryFilter::All,
            status: StatusFilter::Only(Status::Recibida),
        };

        let got = filter_complaints(&complaints, &filters);
        let want: Vec<&Complaint> = complaints
            .iter()
            .filter(|complaint| {
                let fields = [
                    complaint.folio.as_str(),
                    complaint.tipo.as_str(),
                    complaint.description.as_deref().unwrap_or_default(),
                ];

                fields.iter().any(|field| field.to_lowercase().contains("ba"))
                    && complaint.estatus == Status::Recibida
            })
            .collect();

        assert_eq!(got, want);
    }

    #[test]
    fn todos_is_the_same_as_no_filter() {
        let query: FilterQuery = serde_html_form::from_str("buscar=&tipo=todos&estatus=todos").unwrap();

        let filters = FilterState::from(query);

        assert_eq!(filters, FilterState::default());
    }

    #[test]
    fn query_parses_status_label_with_space() {
        let query: FilterQuery =
            serde_html_form::from_str("buscar=calle&tipo=Baches&estatus=En+proceso").unwrap();

        let filters = FilterState::from(query);

        assert_eq!(filters.search, "calle");
        assert_eq!(filters.category, CategoryFilter::Only("Baches".to_owned()));
        assert_eq!(filters.status, StatusFilter::Only(Status::EnProceso));
    }

    #[test]
    fn unknown_status_falls_back_to_all() {
        let query: FilterQuery = serde_html_form::from_str("estatus=Archivada").unwrap();

        assert_eq!(FilterState::from(query).status, StatusFilter::All);
    }

    #[test]
    fn to_query_round_trips_through_the_form_parser() {
        let filters = FilterState {
            search: "calle 5".to_owned(),
            category: CategoryFilter::Only("Baches".to_owned()),
            status: StatusFilter::Only(Status::EnProceso),
        };

        let query: FilterQuery = serde_html_form::from_str(&filters.to_query()).unwrap();

        assert_eq!(FilterState::from(query), filters);
    }

    #[test]
    fn distinct_categories_are_in_first_seen_order() {
        let complaints = sample();

        assert_eq!(
            distinct_categories(&complaints),
            ["Baches", "Alumbrado", "Basura"]
        );
    }
}
