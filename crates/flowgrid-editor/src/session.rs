//! Edit sessions.
//!
//! A session holds the workflow a user is editing. It never patches that
//! workflow itself: after every edit, layout pass or column change the
//! workflow is read back from the store.

use std::collections::HashSet;
use std::sync::Arc;

use flowgrid_config::EditorSettings;
use flowgrid_layout::GridView;
use flowgrid_model::{GridColumns, NodeId, TenantContext, Workflow, WorkflowId};
use flowgrid_store::{Store, WorkflowSummary};
use tracing::{debug, info};

use crate::action::EditAction;
use crate::engine::{EditOutcome, Editor};
use crate::error::EditError;
use crate::events::{NoopNotifier, SessionEvent, SessionNotifier};
use crate::menu::NodeMenu;

/// One user's editing session.
///
/// Generic over `N: SessionNotifier`; use [`EditSession::new`] when events
/// are not observed and [`EditSession::with_notifier`] otherwise.
pub struct EditSession<S: ?Sized, N: SessionNotifier = NoopNotifier> {
  editor: Editor<S>,
  settings: EditorSettings,
  notifier: N,
  workflow: Option<Workflow>,
  /// Workflows loaded at least once in this session.
  seen: HashSet<WorkflowId>,
}

impl<S: Store + ?Sized> EditSession<S, NoopNotifier> {
  pub fn new(store: Arc<S>, settings: EditorSettings) -> Self {
    Self::with_notifier(store, settings, NoopNotifier)
  }
}

impl<S: Store + ?Sized, N: SessionNotifier> EditSession<S, N> {
  pub fn with_notifier(store: Arc<S>, settings: EditorSettings, notifier: N) -> Self {
    let tenant = settings.tenant();
    Self {
      editor: Editor::new(store, tenant),
      settings,
      notifier,
      workflow: None,
      seen: HashSet::new(),
    }
  }

  pub fn tenant(&self) -> &TenantContext {
    self.editor.tenant()
  }

  /// The selected workflow as last loaded.
  pub fn workflow(&self) -> Option<&Workflow> {
    self.workflow.as_ref()
  }

  /// Workflows the acting client can open.
  pub async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, EditError> {
    Ok(
      self
        .editor
        .store()
        .list_workflows(self.tenant().client_id)
        .await?,
    )
  }

  /// Open a workflow.
  ///
  /// The first time a workflow is opened in this session it is laid out,
  /// unless `layout_on_first_load` is off.
  pub async fn select_workflow(&mut self, workflow_id: WorkflowId) -> Result<&Workflow, EditError> {
    let mut workflow = self.load(workflow_id).await?;

    if self.seen.insert(workflow_id) && self.settings.layout_on_first_load {
      info!(workflow_id = %workflow_id, "laying out workflow on first load");
      let outcome = self.editor.auto_layout(&workflow).await?;
      self.notify_layout(workflow_id, &outcome);
      workflow = self.load(workflow_id).await?;
    }

    Ok(self.show(workflow))
  }

  /// Read the selected workflow again from the store.
  pub async fn reload(&mut self) -> Result<&Workflow, EditError> {
    let workflow_id = self.selected()?.workflow_id;
    let workflow = self.load(workflow_id).await?;
    Ok(self.show(workflow))
  }

  /// Apply an edit to the selected workflow, then reload it.
  ///
  /// The workflow is reloaded even when the edit fails, since steps before
  /// the failure stay committed.
  pub async fn dispatch(&mut self, action: &EditAction) -> Result<EditOutcome, EditError> {
    let workflow = self.selected()?;
    let workflow_id = workflow.workflow_id;

    let result = self.editor.apply(workflow, action).await;
    match &result {
      Ok(EditOutcome::Applied(_)) => self.notifier.notify(SessionEvent::EditApplied {
        workflow_id,
        action: action.name().to_string(),
      }),
      Ok(EditOutcome::Skipped { reason }) => self.notifier.notify(SessionEvent::EditSkipped {
        workflow_id,
        action: action.name().to_string(),
        reason: reason.clone(),
      }),
      Ok(EditOutcome::Refused { reason, .. }) => self.notifier.notify(SessionEvent::EditRefused {
        workflow_id,
        action: action.name().to_string(),
        reason: reason.clone(),
      }),
      Err(e) => self.notifier.notify(SessionEvent::EditFailed {
        workflow_id,
        action: action.name().to_string(),
        error: e.to_string(),
      }),
    }

    let reloaded = self.load(workflow_id).await;
    let outcome = result?;
    let workflow = reloaded?;
    self.show(workflow);
    Ok(outcome)
  }

  /// Lay out the selected workflow and persist the new positions.
  pub async fn auto_layout(&mut self) -> Result<EditOutcome, EditError> {
    let workflow = self.selected()?;
    let workflow_id = workflow.workflow_id;

    let outcome = self.editor.auto_layout(workflow).await?;
    self.notify_layout(workflow_id, &outcome);

    let workflow = self.load(workflow_id).await?;
    self.show(workflow);
    Ok(outcome)
  }

  /// Persist a new grid column count for the selected workflow and reload.
  ///
  /// Values below 1 store the configured default instead.
  pub async fn set_grid_columns(&mut self, value: i64) -> Result<&Workflow, EditError> {
    let workflow_id = self.selected()?.workflow_id;
    let grid_columns = if value < 1 {
      self.settings.grid_columns()
    } else {
      GridColumns::from_setting(value)
    };

    self
      .editor
      .store()
      .set_grid_columns(workflow_id, grid_columns)
      .await?;
    self.notifier.notify(SessionEvent::GridColumnsChanged {
      workflow_id,
      grid_columns,
    });

    let workflow = self.load(workflow_id).await?;
    Ok(self.show(workflow))
  }

  /// Context menu for a node of the selected workflow.
  pub fn menu(&self, node_id: NodeId) -> Option<NodeMenu> {
    NodeMenu::build(self.workflow.as_ref()?, node_id, self.tenant())
  }

  /// Cells to render for the selected workflow.
  pub fn grid(&self) -> Option<GridView> {
    self.workflow.as_ref().map(GridView::build)
  }

  fn selected(&self) -> Result<&Workflow, EditError> {
    self.workflow.as_ref().ok_or(EditError::NoWorkflowSelected)
  }

  /// Read a workflow with its stored column count, or the configured default.
  async fn load(&self, workflow_id: WorkflowId) -> Result<Workflow, EditError> {
    let store = self.editor.store();
    let workflow = store.load_workflow(workflow_id, self.tenant()).await?;
    let grid_columns = store
      .grid_columns(workflow_id)
      .await?
      .unwrap_or_else(|| self.settings.grid_columns());

    debug!(
      workflow_id = %workflow_id,
      nodes = workflow.nodes().len(),
      grid_columns = %grid_columns,
      "workflow loaded"
    );
    Ok(workflow.with_grid_columns(grid_columns))
  }

  fn show(&mut self, workflow: Workflow) -> &Workflow {
    self.notifier.notify(SessionEvent::WorkflowLoaded {
      workflow_id: workflow.workflow_id,
      nodes: workflow.nodes().len(),
      transitions: workflow.transitions().len(),
    });
    self.workflow.insert(workflow)
  }

  fn notify_layout(&self, workflow_id: WorkflowId, outcome: &EditOutcome) {
    if let EditOutcome::Applied(report) = outcome {
      self.notifier.notify(SessionEvent::LayoutApplied {
        workflow_id,
        moved: report.updated_nodes.len(),
      });
    }
  }
}
