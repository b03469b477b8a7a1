use flowgrid_config::ConfigError;
use flowgrid_model::{NodeId, WorkflowError, WorkflowId};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested workflow was not found.
  #[error("workflow not found: {0}")]
  WorkflowNotFound(WorkflowId),

  /// The requested node was not found.
  #[error("node not found: {0}")]
  NodeNotFound(NodeId),

  /// A stored value could not be mapped to the model.
  #[error("invalid stored value: {0}")]
  Decode(String),

  /// Stored records do not form a valid workflow.
  #[error("invalid workflow: {0}")]
  InvalidWorkflow(#[from] WorkflowError),

  /// A workflow definition failed validation.
  #[error("invalid workflow definition: {0}")]
  InvalidDefinition(#[from] ConfigError),

  /// The store refused the write.
  #[error("store unavailable during {operation}")]
  Unavailable { operation: &'static str },

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying migrations failed.
  #[error("migration failed: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}
