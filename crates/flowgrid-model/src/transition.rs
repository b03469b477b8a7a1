use serde::{Deserialize, Serialize};

use crate::{NodeId, Ownership, TransitionId};

/// A directed edge between two nodes of the same workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
  pub transition_id: TransitionId,
  pub from: NodeId,
  pub to: NodeId,
  pub owner: Ownership,
}

/// A transition that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDraft {
  pub from: NodeId,
  pub to: NodeId,
  pub owner: Ownership,
}

impl TransitionDraft {
  pub fn new(from: NodeId, to: NodeId, owner: Ownership) -> Self {
    Self { from, to, owner }
  }

  pub fn into_transition(self, transition_id: TransitionId) -> Transition {
    Transition {
      transition_id,
      from: self.from,
      to: self.to,
      owner: self.owner,
    }
  }
}
