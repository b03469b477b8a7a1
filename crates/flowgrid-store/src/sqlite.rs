use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowgrid_model::{
  ActionCode, ActionLinks, GridColumns, Node, NodeDraft, NodeId, Ownership, Position,
  TenantContext, Transition, TransitionDraft, TransitionId, Workflow, WorkflowId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::types::{EntityKind, WorkflowRecord, WorkflowSummary};
use crate::Store;

const NODE_COLUMNS: &str = r#"
  node_id, workflow_id, name, description, action,
  process_id, task_id, doc_action, mail_text_id, column_id, attribute_value,
  subflow_id, form_id, window_id, info_window_id,
  x_position, y_position, client_id, org_id, entity_type
"#;

#[derive(Debug, FromRow)]
struct WorkflowRow {
  workflow_id: i64,
  name: String,
  client_id: i64,
  org_id: i64,
  start_node_id: Option<i64>,
  grid_columns: Option<i64>,
  created_at: DateTime<Utc>,
}

impl WorkflowRow {
  fn summary(&self) -> WorkflowSummary {
    WorkflowSummary {
      workflow_id: WorkflowId(self.workflow_id),
      name: self.name.clone(),
      owner: Ownership::new(self.client_id, self.org_id),
      grid_columns: self.grid_columns.map(GridColumns::from_setting),
      created_at: self.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct NodeRow {
  node_id: i64,
  workflow_id: i64,
  name: String,
  description: Option<String>,
  action: Option<String>,
  process_id: Option<i64>,
  task_id: Option<i64>,
  doc_action: Option<String>,
  mail_text_id: Option<i64>,
  column_id: Option<i64>,
  attribute_value: Option<String>,
  subflow_id: Option<i64>,
  form_id: Option<i64>,
  window_id: Option<i64>,
  info_window_id: Option<i64>,
  x_position: i64,
  y_position: i64,
  client_id: i64,
  org_id: i64,
  entity_type: String,
}

impl TryFrom<NodeRow> for Node {
  type Error = StoreError;

  fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
    let action = match row.action.as_deref() {
      None | Some("") => None,
      Some(code) => Some(ActionCode::from_code(code).ok_or_else(|| {
        StoreError::Decode(format!("node {}: unknown action code '{}'", row.node_id, code))
      })?),
    };
    let coordinate = |value: i64, axis: &str| {
      u32::try_from(value).map_err(|_| {
        StoreError::Decode(format!("node {}: {} position {} out of range", row.node_id, axis, value))
      })
    };

    Ok(Node {
      node_id: NodeId(row.node_id),
      workflow_id: WorkflowId(row.workflow_id),
      position: Position::new(coordinate(row.x_position, "x")?, coordinate(row.y_position, "y")?),
      name: row.name,
      description: row.description,
      action,
      links: ActionLinks {
        process_id: row.process_id,
        task_id: row.task_id,
        doc_action: row.doc_action,
        mail_text_id: row.mail_text_id,
        column_id: row.column_id,
        attribute_value: row.attribute_value,
        subflow_id: row.subflow_id,
        form_id: row.form_id,
        window_id: row.window_id,
        info_window_id: row.info_window_id,
      },
      owner: Ownership::new(row.client_id, row.org_id),
      entity_type: row.entity_type,
    })
  }
}

#[derive(Debug, FromRow)]
struct TransitionRow {
  transition_id: i64,
  from_node_id: i64,
  to_node_id: i64,
  client_id: i64,
  org_id: i64,
}

impl From<TransitionRow> for Transition {
  fn from(row: TransitionRow) -> Self {
    Transition {
      transition_id: TransitionId(row.transition_id),
      from: NodeId(row.from_node_id),
      to: NodeId(row.to_node_id),
      owner: Ownership::new(row.client_id, row.org_id),
    }
  }
}

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) a database file and apply migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::new()
      .filename(path.as_ref())
      .create_if_missing(true)
      .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    let store = Self::new(pool);
    store.migrate().await?;
    info!(path = %path.as_ref().display(), "opened workflow store");
    Ok(store)
  }

  /// Open a private in-memory database and apply migrations.
  pub async fn in_memory() -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    // A single connection that never expires, so the database lives as long
    // as the pool.
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .min_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(options)
      .await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    Ok(())
  }

  /// Register an entity that action defaults can link to.
  pub async fn register_entity(
    &self,
    kind: EntityKind,
    entity_id: i64,
    active: bool,
  ) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO catalog_entities (kind, entity_id, is_active)
            VALUES (?, ?, ?)
            ON CONFLICT (kind, entity_id) DO UPDATE SET is_active = excluded.is_active
            "#,
    )
    .bind(kind.as_str())
    .bind(entity_id)
    .bind(active)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn fetch_workflow(&self, workflow_id: WorkflowId) -> Result<WorkflowRow, StoreError> {
    sqlx::query_as::<_, WorkflowRow>(
      r#"
            SELECT workflow_id, name, client_id, org_id, start_node_id, grid_columns, created_at
            FROM workflows
            WHERE workflow_id = ?
            "#,
    )
    .bind(workflow_id.0)
    .fetch_optional(&self.pool)
    .await?
    .ok_or(StoreError::WorkflowNotFound(workflow_id))
  }
}

#[async_trait]
impl Store for SqliteStore {
  async fn list_workflows(&self, client_id: i64) -> Result<Vec<WorkflowSummary>, StoreError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
      r#"
            SELECT workflow_id, name, client_id, org_id, start_node_id, grid_columns, created_at
            FROM workflows
            WHERE (client_id = ? OR client_id = 0) AND is_active = 1
            ORDER BY name
            "#,
    )
    .bind(client_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.iter().map(WorkflowRow::summary).collect())
  }

  async fn create_workflow(&self, name: &str, owner: Ownership) -> Result<WorkflowId, StoreError> {
    let result = sqlx::query(
      r#"
            INSERT INTO workflows (name, client_id, org_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
    )
    .bind(name)
    .bind(owner.client_id)
    .bind(owner.org_id)
    .bind(Utc::now())
    .execute(&self.pool)
    .await?;

    Ok(WorkflowId(result.last_insert_rowid()))
  }

  async fn load_workflow(
    &self,
    workflow_id: WorkflowId,
    tenant: &TenantContext,
  ) -> Result<Workflow, StoreError> {
    let row = self.fetch_workflow(workflow_id).await?;

    let nodes = sqlx::query_as::<_, NodeRow>(&format!(
      "SELECT {NODE_COLUMNS} FROM workflow_nodes WHERE workflow_id = ? ORDER BY node_id"
    ))
    .bind(workflow_id.0)
    .fetch_all(&self.pool)
    .await?
    .into_iter()
    .map(Node::try_from)
    .collect::<Result<Vec<_>, _>>()?;

    let transitions = sqlx::query_as::<_, TransitionRow>(
      r#"
            SELECT t.transition_id, t.from_node_id, t.to_node_id, t.client_id, t.org_id
            FROM workflow_transitions t
            JOIN workflow_nodes n ON n.node_id = t.from_node_id
            WHERE n.workflow_id = ?
            ORDER BY t.transition_id
            "#,
    )
    .bind(workflow_id.0)
    .fetch_all(&self.pool)
    .await?
    .into_iter()
    .map(Transition::from)
    .collect();

    debug!(workflow_id = %workflow_id, nodes = nodes.len(), "loaded workflow records");

    WorkflowRecord {
      workflow_id,
      name: row.name,
      start_node: row.start_node_id.map(NodeId),
      grid_columns: row.grid_columns.map(GridColumns::from_setting),
      nodes,
      transitions,
    }
    .into_workflow(tenant)
  }

  async fn set_start_node(
    &self,
    workflow_id: WorkflowId,
    node_id: Option<NodeId>,
  ) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE workflows SET start_node_id = ? WHERE workflow_id = ?")
      .bind(node_id.map(|id| id.0))
      .bind(workflow_id.0)
      .execute(&self.pool)
      .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::WorkflowNotFound(workflow_id));
    }
    Ok(())
  }

  async fn grid_columns(&self, workflow_id: WorkflowId) -> Result<Option<GridColumns>, StoreError> {
    let row = self.fetch_workflow(workflow_id).await?;
    Ok(row.grid_columns.map(GridColumns::from_setting))
  }

  async fn set_grid_columns(
    &self,
    workflow_id: WorkflowId,
    grid_columns: GridColumns,
  ) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE workflows SET grid_columns = ? WHERE workflow_id = ?")
      .bind(grid_columns.get() as i64)
      .bind(workflow_id.0)
      .execute(&self.pool)
      .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::WorkflowNotFound(workflow_id));
    }
    Ok(())
  }

  async fn create_node(&self, draft: &NodeDraft) -> Result<Node, StoreError> {
    let links = &draft.links;
    let result = sqlx::query(
      r#"
            INSERT INTO workflow_nodes (
              workflow_id, name, description, action,
              process_id, task_id, doc_action, mail_text_id, column_id, attribute_value,
              subflow_id, form_id, window_id, info_window_id,
              x_position, y_position, client_id, org_id, entity_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(draft.workflow_id.0)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.action.map(ActionCode::code))
    .bind(links.process_id)
    .bind(links.task_id)
    .bind(&links.doc_action)
    .bind(links.mail_text_id)
    .bind(links.column_id)
    .bind(&links.attribute_value)
    .bind(links.subflow_id)
    .bind(links.form_id)
    .bind(links.window_id)
    .bind(links.info_window_id)
    .bind(draft.position.column as i64)
    .bind(draft.position.row as i64)
    .bind(draft.owner.client_id)
    .bind(draft.owner.org_id)
    .bind(&draft.entity_type)
    .execute(&self.pool)
    .await?;

    Ok(draft.clone().into_node(NodeId(result.last_insert_rowid())))
  }

  async fn update_node(&self, node: &Node) -> Result<(), StoreError> {
    let links = &node.links;
    let result = sqlx::query(
      r#"
            UPDATE workflow_nodes
            SET name = ?, description = ?, action = ?,
                process_id = ?, task_id = ?, doc_action = ?, mail_text_id = ?, column_id = ?,
                attribute_value = ?, subflow_id = ?, form_id = ?, window_id = ?, info_window_id = ?,
                x_position = ?, y_position = ?, client_id = ?, org_id = ?, entity_type = ?
            WHERE node_id = ?
            "#,
    )
    .bind(&node.name)
    .bind(&node.description)
    .bind(node.action.map(ActionCode::code))
    .bind(links.process_id)
    .bind(links.task_id)
    .bind(&links.doc_action)
    .bind(links.mail_text_id)
    .bind(links.column_id)
    .bind(&links.attribute_value)
    .bind(links.subflow_id)
    .bind(links.form_id)
    .bind(links.window_id)
    .bind(links.info_window_id)
    .bind(node.position.column as i64)
    .bind(node.position.row as i64)
    .bind(node.owner.client_id)
    .bind(node.owner.org_id)
    .bind(&node.entity_type)
    .bind(node.node_id.0)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NodeNotFound(node.node_id));
    }
    Ok(())
  }

  async fn delete_node(&self, node_id: NodeId) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM workflow_nodes WHERE node_id = ?")
      .bind(node_id.0)
      .execute(&self.pool)
      .await;

    match result {
      Ok(done) => Ok(done.rows_affected() > 0),
      // Still referenced as a start node.
      Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
        debug!(node_id = %node_id, error = %e, "node delete refused");
        Ok(false)
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn create_transition(&self, draft: &TransitionDraft) -> Result<Transition, StoreError> {
    let result = sqlx::query(
      r#"
            INSERT INTO workflow_transitions (from_node_id, to_node_id, client_id, org_id)
            VALUES (?, ?, ?, ?)
            "#,
    )
    .bind(draft.from.0)
    .bind(draft.to.0)
    .bind(draft.owner.client_id)
    .bind(draft.owner.org_id)
    .execute(&self.pool)
    .await?;

    Ok(draft.into_transition(TransitionId(result.last_insert_rowid())))
  }

  async fn delete_transition(&self, transition_id: TransitionId) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM workflow_transitions WHERE transition_id = ?")
      .bind(transition_id.0)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn find_first_active(
    &self,
    kind: EntityKind,
    exclude: Option<i64>,
  ) -> Result<Option<i64>, StoreError> {
    let id: Option<i64> = sqlx::query_scalar(
      r#"
            SELECT entity_id
            FROM catalog_entities
            WHERE kind = ? AND is_active = 1 AND (? IS NULL OR entity_id != ?)
            ORDER BY entity_id
            LIMIT 1
            "#,
    )
    .bind(kind.as_str())
    .bind(exclude)
    .bind(exclude)
    .fetch_optional(&self.pool)
    .await?;
    Ok(id)
  }
}
