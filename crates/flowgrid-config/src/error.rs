use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("duplicate node key: {key}")]
  DuplicateNodeKey { key: String },

  #[error("transition references unknown node key: {key}")]
  UnknownNodeKey { key: String },

  #[error("start node key not found: {key}")]
  UnknownStartNode { key: String },

  #[error("node '{key}' has an empty name")]
  EmptyName { key: String },

  #[error("grid_columns must be at least 1, got {value}")]
  InvalidGridColumns { value: u32 },
}
