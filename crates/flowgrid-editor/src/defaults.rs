use flowgrid_model::{ActionCode, ActionLinks, WorkflowId};
use flowgrid_store::{EntityKind, Store, StoreError};
use tracing::debug;

/// Document action given to new document-action nodes.
pub const DEFAULT_DOC_ACTION: &str = "CO";

/// Attribute value given to new set-variable nodes.
pub const DEFAULT_ATTRIBUTE_VALUE: &str = "Default";

/// Fill the links a new node of `action` needs before it can be saved.
///
/// Each link is the first active entity of its kind. When the store has no
/// candidate the link stays empty. Sub-workflow nodes never link back to
/// `workflow_id`.
pub async fn action_defaults<S: Store + ?Sized>(
  store: &S,
  action: ActionCode,
  workflow_id: WorkflowId,
) -> Result<ActionLinks, StoreError> {
  let mut links = ActionLinks::default();

  match action {
    ActionCode::ExternalProcess | ActionCode::ExternalReport => {
      links.process_id = store.find_first_active(EntityKind::Process, None).await?;
    }
    ActionCode::ExternalTask => {
      links.task_id = store.find_first_active(EntityKind::Task, None).await?;
    }
    ActionCode::DocumentAction => {
      links.doc_action = Some(DEFAULT_DOC_ACTION.to_string());
    }
    ActionCode::SendEmail => {
      links.mail_text_id = store.find_first_active(EntityKind::MailText, None).await?;
    }
    ActionCode::SetVariable => {
      links.attribute_value = Some(DEFAULT_ATTRIBUTE_VALUE.to_string());
      links.column_id = store.find_first_active(EntityKind::Column, None).await?;
    }
    ActionCode::SubWorkflow => {
      links.subflow_id = store
        .find_first_active(EntityKind::Workflow, Some(workflow_id.0))
        .await?;
    }
    ActionCode::UserChoice => {
      links.column_id = store.find_first_active(EntityKind::Column, None).await?;
    }
    ActionCode::UserForm => {
      links.form_id = store.find_first_active(EntityKind::Form, None).await?;
    }
    ActionCode::UserWindow => {
      links.window_id = store.find_first_active(EntityKind::Window, None).await?;
    }
    ActionCode::UserInfoWindow => {
      links.info_window_id = store.find_first_active(EntityKind::InfoWindow, None).await?;
    }
  }

  debug!(action = action.code(), ?links, "filled action defaults");
  Ok(links)
}
