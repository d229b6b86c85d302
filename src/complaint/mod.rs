//! Citizen complaints: the data model, the local store, and the pages for
//! browsing and editing them.

mod aggregation;
mod edit;
mod edit_page;
mod filter;
mod list_page;
mod model;
mod store;
mod window;

pub use aggregation::{FrequencyTable, count_by_category, count_by_status};
pub use edit::{Draft, EditWorkflow, TransitionError, save_edit};
pub use edit_page::{EditComplaintState, get_edit_complaint_page, update_complaint_endpoint};
pub use filter::{
    ALL_SENTINEL, CategoryFilter, FilterQuery, FilterState, StatusFilter, distinct_categories,
    filter_complaints,
};
pub use list_page::{
    ComplaintsPageState, SavedNotice, get_complaints_page, get_complaints_table,
    saved_complaint_url,
};
pub use model::{Complaint, ComplaintUpdate, Folio, Status, format_timestamp, parse_timestamp};
pub use store::{ComplaintStore, SharedStore};
pub use window::{InstantRange, ReportWindow, WindowPreset, WindowQuery, partition};
