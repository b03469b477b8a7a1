//! Edit plans.
//!
//! Every edit is built as an ordered list of store writes before anything is
//! persisted. Steps run one after another; there is no rollback, so a failing
//! step leaves the earlier ones committed and the error says how many there
//! were.

use flowgrid_model::{
  Node, NodeDraft, NodeId, Ownership, Transition, TransitionDraft, TransitionId,
};
use flowgrid_store::Store;
use tracing::{debug, error, warn};

use crate::error::EditError;

/// Node endpoint of a transition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
  Existing(NodeId),
  /// The node created by an earlier step of the same plan.
  Created,
}

impl From<NodeId> for NodeRef {
  fn from(node_id: NodeId) -> Self {
    NodeRef::Existing(node_id)
  }
}

/// One store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  CreateNode(NodeDraft),
  UpdateNode(Node),
  DeleteNode(NodeId),
  CreateTransition {
    from: NodeRef,
    to: NodeRef,
    owner: Ownership,
  },
  DeleteTransition(TransitionId),
}

impl Step {
  pub fn operation(&self) -> &'static str {
    match self {
      Step::CreateNode(_) => "create_node",
      Step::UpdateNode(_) => "update_node",
      Step::DeleteNode(_) => "delete_node",
      Step::CreateTransition { .. } => "create_transition",
      Step::DeleteTransition(_) => "delete_transition",
    }
  }
}

/// What a plan wrote before it finished or stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanReport {
  /// Number of steps that completed.
  pub completed: usize,
  pub created_node: Option<Node>,
  pub created_transitions: Vec<Transition>,
  pub updated_nodes: Vec<NodeId>,
  pub deleted_nodes: Vec<NodeId>,
  pub deleted_transitions: Vec<TransitionId>,
}

impl PlanReport {
  fn resolve(&self, node: NodeRef) -> Option<NodeId> {
    match node {
      NodeRef::Existing(node_id) => Some(node_id),
      NodeRef::Created => self.created_node.as_ref().map(|n| n.node_id),
    }
  }
}

/// How a plan ended when no step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResult {
  Completed(PlanReport),
  /// A delete step was refused; later steps did not run.
  Refused { step: usize, report: PlanReport },
}

/// An ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
  label: &'static str,
  steps: Vec<Step>,
}

impl EditPlan {
  pub fn new(label: &'static str) -> Self {
    Self {
      label,
      steps: Vec::new(),
    }
  }

  /// Append a step (builder style).
  pub fn step(mut self, step: Step) -> Self {
    self.steps.push(step);
    self
  }

  pub fn push(&mut self, step: Step) {
    self.steps.push(step);
  }

  pub fn label(&self) -> &'static str {
    self.label
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Run the steps in order against a store.
  pub async fn execute<S: Store + ?Sized>(&self, store: &S) -> Result<PlanResult, EditError> {
    let mut report = PlanReport::default();

    for (index, step) in self.steps.iter().enumerate() {
      let result = match step {
        Step::CreateNode(draft) => store.create_node(draft).await.map(|node| {
          report.created_node = Some(node);
          true
        }),
        Step::UpdateNode(node) => store.update_node(node).await.map(|()| {
          report.updated_nodes.push(node.node_id);
          true
        }),
        Step::DeleteNode(node_id) => store.delete_node(*node_id).await.inspect(|deleted| {
          if *deleted {
            report.deleted_nodes.push(*node_id);
          }
        }),
        Step::CreateTransition { from, to, owner } => {
          let (Some(from), Some(to)) = (report.resolve(*from), report.resolve(*to)) else {
            return Err(EditError::UnresolvedNode {
              plan: self.label,
              step: index,
            });
          };
          store
            .create_transition(&TransitionDraft::new(from, to, *owner))
            .await
            .map(|transition| {
              report.created_transitions.push(transition);
              true
            })
        }
        Step::DeleteTransition(transition_id) => store
          .delete_transition(*transition_id)
          .await
          .inspect(|deleted| {
            if *deleted {
              report.deleted_transitions.push(*transition_id);
            }
          }),
      };

      match result {
        Ok(true) => report.completed += 1,
        Ok(false) => {
          warn!(
            plan = self.label,
            step = index,
            operation = step.operation(),
            "store refused step, stopping plan"
          );
          return Ok(PlanResult::Refused {
            step: index,
            report,
          });
        }
        Err(source) => {
          error!(
            plan = self.label,
            step = index,
            operation = step.operation(),
            completed = report.completed,
            error = %source,
            "plan step failed"
          );
          return Err(EditError::Persistence {
            operation: step.operation(),
            completed_steps: report.completed,
            source,
          });
        }
      }
    }

    debug!(plan = self.label, steps = report.completed, "plan applied");
    Ok(PlanResult::Completed(report))
  }
}
