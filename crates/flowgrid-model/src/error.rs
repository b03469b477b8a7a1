use thiserror::Error;

use crate::{NodeId, TransitionId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(NodeId),

  #[error("duplicate node id: {0}")]
  DuplicateNode(NodeId),

  #[error("duplicate transition id: {0}")]
  DuplicateTransition(TransitionId),

  #[error("start node {0} is not part of the workflow")]
  UnknownStartNode(NodeId),

  #[error("transition {transition_id} references unknown node: from={from}, to={to}")]
  InvalidTransition {
    transition_id: TransitionId,
    from: NodeId,
    to: NodeId,
  },
}
