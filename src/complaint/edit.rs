//! The workflow for changing the status and description of one complaint.

use serde::Deserialize;

use crate::{
    Error,
    complaint::{
        model::{Complaint, ComplaintUpdate, Folio, Status},
        store::SharedStore,
    },
    gateway::{ApiClient, GatewayError},
};

/// The admin's pending changes to a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Draft {
    /// The new status.
    pub estatus: Status,
    /// The new description. An empty description clears it.
    #[serde(default)]
    pub description: String,
}

impl Draft {
    /// Seed a draft with the current values of `complaint`.
    pub fn from_complaint(complaint: &Complaint) -> Self {
        Self {
            estatus: complaint.estatus,
            description: complaint.description.clone().unwrap_or_default(),
        }
    }

    /// The payload to send to the remote API.
    pub fn to_update(&self) -> ComplaintUpdate {
        ComplaintUpdate {
            estatus: self.estatus,
            description: Some(self.description.trim().to_owned()),
        }
    }
}

/// Where an edit is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditWorkflow {
    /// Nothing is being edited.
    #[default]
    Idle,
    /// A complaint is selected and its draft may be changed. `error` holds
    /// the reason the last save failed, if it did.
    Selected {
        /// The complaint being edited.
        folio: Folio,
        /// The pending changes.
        draft: Draft,
        /// Why the last save failed.
        error: Option<String>,
    },
    /// The draft has been sent and the workflow is waiting for the answer.
    Saving {
        /// The complaint being saved.
        folio: Folio,
        /// The changes that were sent.
        draft: Draft,
    },
}

/// A transition that is not allowed from the current state.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Editing or saving with nothing selected.
    #[error("no complaint is selected for editing")]
    NothingSelected,
    /// Anything but waiting while a save is in flight.
    #[error("a save is already in progress")]
    SaveInProgress,
    /// Completing a save that was never started.
    #[error("no save is in progress")]
    NotSaving,
}

impl EditWorkflow {
    /// Select `complaint` for editing, replacing any previous selection.
    pub fn select(&mut self, complaint: &Complaint) -> Result<(), TransitionError> {
        if let EditWorkflow::Saving { .. } = self {
            return Err(TransitionError::SaveInProgress);
        }

        *self = EditWorkflow::Selected {
            folio: complaint.folio.clone(),
            draft: Draft::from_complaint(complaint),
            error: None,
        };

        Ok(())
    }

    /// Replace the draft of the selected complaint.
    pub fn update_draft(&mut self, new_draft: Draft) -> Result<(), TransitionError> {
        match self {
            EditWorkflow::Selected { draft, error, .. } => {
                *draft = new_draft;
                *error = None;
                Ok(())
            }
            EditWorkflow::Saving { .. } => Err(TransitionError::SaveInProgress),
            EditWorkflow::Idle => Err(TransitionError::NothingSelected),
        }
    }

    /// Move to [EditWorkflow::Saving] and return what needs to be sent.
    pub fn begin_save(&mut self) -> Result<(Folio, ComplaintUpdate), TransitionError> {
        match std::mem::take(self) {
            EditWorkflow::Selected { folio, draft, .. } => {
                let request = (folio.clone(), draft.to_update());
                *self = EditWorkflow::Saving { folio, draft };
                Ok(request)
            }
            EditWorkflow::Saving { folio, draft } => {
                *self = EditWorkflow::Saving { folio, draft };
                Err(TransitionError::SaveInProgress)
            }
            EditWorkflow::Idle => Err(TransitionError::NothingSelected),
        }
    }

    /// Finish a save. Success returns to [EditWorkflow::Idle], failure
    /// returns to [EditWorkflow::Selected] with the draft intact.
    pub fn complete(&mut self, result: &Result<(), GatewayError>) -> Result<(), TransitionError> {
        match std::mem::take(self) {
            EditWorkflow::Saving { folio, draft } => {
                if let Err(gateway_error) = result {
                    *self = EditWorkflow::Selected {
                        folio,
                        draft,
                        error: Some(gateway_error.to_string()),
                    };
                }

                Ok(())
            }
            other => {
                *self = other;
                Err(TransitionError::NotSaving)
            }
        }
    }

    /// Discard the draft. Not allowed while a save is in progress.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        if let EditWorkflow::Saving { .. } = self {
            return Err(TransitionError::SaveInProgress);
        }

        *self = EditWorkflow::Idle;

        Ok(())
    }

    /// The pending changes, if a complaint is selected.
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            EditWorkflow::Selected { draft, .. } | EditWorkflow::Saving { draft, .. } => Some(draft),
            EditWorkflow::Idle => None,
        }
    }

    /// Why the last save failed, if it did.
    pub fn error(&self) -> Option<&str> {
        match self {
            EditWorkflow::Selected { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

/// Send the selected draft to the remote API and, once accepted, patch the
/// local copy of the complaint.
///
/// On a gateway failure `workflow` is left in [EditWorkflow::Selected] with
/// the error recorded and the gateway error is returned.
pub async fn save_edit(
    workflow: &mut EditWorkflow,
    gateway: &ApiClient,
    store: &SharedStore,
) -> Result<(), Error> {
    let (folio, update) = workflow.begin_save()?;

    let result = gateway.update_complaint(&folio, &update).await;
    workflow.complete(&result)?;

    if let Err(error) = result {
        tracing::error!("Could not update complaint {folio}: {error}");
        return Err(error.into());
    }

    let mut store = store
        .write()
        .inspect_err(|error| tracing::error!("could not acquire store lock: {error}"))
        .map_err(|_| Error::StoreLockError)?;

    if !store.patch(&folio, &update) {
        tracing::warn!("Complaint {folio} was updated remotely but is no longer loaded");
    }

    Ok(())
}
