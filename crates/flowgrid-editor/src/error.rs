//! Error types for workflow edits.

use flowgrid_store::StoreError;
use thiserror::Error;

/// Errors that abort an edit.
///
/// Unmet preconditions and refused deletes are not errors; they are reported
/// through [`crate::EditOutcome`].
#[derive(Debug, Error)]
pub enum EditError {
  /// A plan step failed. Steps before it stay committed.
  #[error("{operation} failed after {completed_steps} completed steps: {source}")]
  Persistence {
    operation: &'static str,
    completed_steps: usize,
    #[source]
    source: StoreError,
  },

  /// A store call outside a plan failed.
  #[error(transparent)]
  Store(#[from] StoreError),

  /// The session has no workflow loaded.
  #[error("no workflow selected")]
  NoWorkflowSelected,

  /// A plan step used the created node before the plan created it.
  #[error("step {step} of '{plan}' refers to a node the plan has not created")]
  UnresolvedNode { plan: &'static str, step: usize },
}
