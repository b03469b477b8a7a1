//! Session events and notifiers.
//!
//! Events are emitted by an edit session so that a host knows when to
//! re-render, and what happened to the edits it dispatched.

use flowgrid_model::{GridColumns, WorkflowId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by an edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
  /// A workflow was (re)loaded; the host should re-render it.
  WorkflowLoaded {
    workflow_id: WorkflowId,
    nodes: usize,
    transitions: usize,
  },

  /// Auto-layout ran and moved `moved` nodes.
  LayoutApplied { workflow_id: WorkflowId, moved: usize },

  /// The grid column count was changed.
  GridColumnsChanged {
    workflow_id: WorkflowId,
    grid_columns: GridColumns,
  },

  /// An edit was persisted.
  EditApplied {
    workflow_id: WorkflowId,
    action: String,
  },

  /// An edit was not applied because a precondition did not hold.
  EditSkipped {
    workflow_id: WorkflowId,
    action: String,
    reason: String,
  },

  /// The store refused an edit. The host should show `reason` to the user.
  EditRefused {
    workflow_id: WorkflowId,
    action: String,
    reason: String,
  },

  /// An edit failed part-way.
  EditFailed {
    workflow_id: WorkflowId,
    action: String,
    error: String,
  },
}

/// Trait for receiving session events.
///
/// The session calls `notify` for each event; implementations decide what to
/// do with them.
pub trait SessionNotifier: Send + Sync {
  fn notify(&self, event: SessionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl SessionNotifier for NoopNotifier {
  fn notify(&self, _event: SessionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Sends never block the session. Event volume is a handful per edit.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl SessionNotifier for ChannelNotifier {
  fn notify(&self, event: SessionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_channel_notifier_delivers_in_order() {
    let (notifier, mut receiver) = ChannelNotifier::channel();
    notifier.notify(SessionEvent::LayoutApplied {
      workflow_id: WorkflowId(1),
      moved: 2,
    });
    notifier.notify(SessionEvent::WorkflowLoaded {
      workflow_id: WorkflowId(1),
      nodes: 3,
      transitions: 2,
    });

    assert!(matches!(
      receiver.try_recv(),
      Ok(SessionEvent::LayoutApplied { moved: 2, .. })
    ));
    assert!(matches!(
      receiver.try_recv(),
      Ok(SessionEvent::WorkflowLoaded { nodes: 3, .. })
    ));
  }

  #[test]
  fn test_send_after_receiver_dropped_is_ignored() {
    let (notifier, receiver) = ChannelNotifier::channel();
    drop(receiver);
    notifier.notify(SessionEvent::GridColumnsChanged {
      workflow_id: WorkflowId(1),
      grid_columns: GridColumns::DEFAULT,
    });
  }
}
