//! The in-memory copy of the complaints held by the remote API.

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use time::OffsetDateTime;

use crate::complaint::model::{Complaint, ComplaintUpdate, Folio};

/// The store shared between request handlers and the refresh task.
pub type SharedStore = Arc<RwLock<ComplaintStore>>;

/// The last successfully fetched list of complaints.
#[derive(Debug, Default)]
pub struct ComplaintStore {
    complaints: Vec<Complaint>,
    loaded_at: Option<OffsetDateTime>,
    last_error: Option<String>,
}

impl ComplaintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new, empty store for sharing.
    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Replace every complaint with `complaints`.
    ///
    /// Complaints that repeat an earlier folio are dropped. Clears any
    /// recorded refresh failure.
    pub fn replace_all(&mut self, complaints: Vec<Complaint>, loaded_at: OffsetDateTime) {
        let mut seen: HashSet<Folio> = HashSet::with_capacity(complaints.len());
        let mut unique: Vec<Complaint> = Vec::with_capacity(complaints.len());

        for complaint in complaints {
            if !seen.insert(complaint.folio.clone()) {
                tracing::warn!(
                    "Dropping complaint with duplicate folio \"{}\"",
                    complaint.folio
                );
                continue;
            }

            unique.push(complaint);
        }

        self.complaints = unique;
        self.loaded_at = Some(loaded_at);
        self.last_error = None;
    }

    /// Remember that a refresh failed. The loaded complaints are kept.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }

    pub fn get(&self, folio: &Folio) -> Option<&Complaint> {
        self.complaints
            .iter()
            .find(|complaint| complaint.folio == *folio)
    }

    /// Apply an accepted update to the local copy of one complaint.
    ///
    /// Returns `false` if no complaint has `folio`.
    pub fn patch(&mut self, folio: &Folio, update: &ComplaintUpdate) -> bool {
        match self
            .complaints
            .iter_mut()
            .find(|complaint| complaint.folio == *folio)
        {
            Some(complaint) => {
                complaint.apply(update);
                true
            }
            None => false,
        }
    }

    /// Whether at least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn loaded_at(&self) -> Option<OffsetDateTime> {
        self.loaded_at
    }

    /// The message of the most recent refresh failure, cleared by the next
    /// successful refresh.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::complaint::model::{Complaint, ComplaintUpdate, Folio, Status};

    use super::ComplaintStore;

    fn complaint(folio: &str, tipo: &str) -> Complaint {
        Complaint {
            folio: Folio::new(folio),
            id: None,
            tipo: tipo.to_owned(),
            estatus: Status::Recibida,
            fecha: None,
            description: Some("original".to_owned()),
            texto: None,
        }
    }

    #[test]
    fn new_store_is_not_loaded() {
        let store = ComplaintStore::new();

        assert!(!store.is_loaded());
        assert!(store.complaints().is_empty());
        assert_eq!(store.last_error(), None);
    }

    #[test]
    fn replace_all_drops_duplicate_folios_keeping_the_first() {
        let mut store = ComplaintStore::new();

        store.replace_all(
            vec![
                complaint("A", "Baches"),
                complaint("B", "Basura"),
                complaint("A", "Alumbrado"),
            ],
            OffsetDateTime::now_utc(),
        );

        assert_eq!(store.complaints().len(), 2);
        assert_eq!(store.get(&Folio::new("A")).unwrap().tipo, "Baches");
        assert!(store.is_loaded());
    }

    #[test]
    fn replace_all_keeps_order_of_large_list() {
        let mut store = ComplaintStore::new();
        let mut complaints: Vec<Complaint> = (0..5_000)
            .map(|index| complaint(&format!("Q-{index}"), "Baches"))
            .collect();
        complaints.push(complaint("Q-0", "Basura"));

        store.replace_all(complaints, OffsetDateTime::now_utc());

        assert_eq!(store.complaints().len(), 5_000);
        assert_eq!(store.complaints()[0].folio, Folio::new("Q-0"));
        assert_eq!(store.complaints()[4_999].folio, Folio::new("Q-4999"));
        assert_eq!(store.get(&Folio::new("Q-0")).unwrap().tipo, "Baches");
    }

    #[test]
    fn failure_keeps_list_and_next_success_clears_it() {
        let mut store = ComplaintStore::new();
        store.replace_all(vec![complaint("A", "Baches")], OffsetDateTime::now_utc());

        store.record_failure("timeout");

        assert_eq!(store.last_error(), Some("timeout"));
        assert_eq!(store.complaints().len(), 1);

        store.replace_all(vec![], OffsetDateTime::now_utc());

        assert_eq!(store.last_error(), None);
        assert!(store.complaints().is_empty());
    }

    #[test]
    fn patch_updates_only_the_matching_complaint() {
        let mut store = ComplaintStore::new();
        store.replace_all(
            vec![complaint("A", "Baches"), complaint("B", "Basura")],
            OffsetDateTime::now_utc(),
        );
        let update = ComplaintUpdate {
            estatus: Status::Resuelta,
            description: Some("Reparado".to_owned()),
        };

        let patched = store.patch(&Folio::new("B"), &update);

        assert!(patched);
        let b = store.get(&Folio::new("B")).unwrap();
        assert_eq!(b.estatus, Status::Resuelta);
        assert_eq!(b.description.as_deref(), Some("Reparado"));
        let a = store.get(&Folio::new("A")).unwrap();
        assert_eq!(a.estatus, Status::Recibida);
        assert_eq!(a.description.as_deref(), Some("original"));
    }

    #[test]
    fn patch_missing_folio_changes_nothing() {
        let mut store = ComplaintStore::new();
        store.replace_all(vec![complaint("A", "Baches")], OffsetDateTime::now_utc());
        let update = ComplaintUpdate {
            estatus: Status::Rechazada,
            description: None,
        };

        assert!(!store.patch(&Folio::new("Z"), &update));
        assert_eq!(store.complaints()[0].estatus, Status::Recibida);
    }
}
