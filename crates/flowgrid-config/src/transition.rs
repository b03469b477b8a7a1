use serde::{Deserialize, Serialize};

/// A directed transition between two node keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
  pub from: String,
  pub to: String,
}
