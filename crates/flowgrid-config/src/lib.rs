//! Flowgrid Config
//!
//! This crate contains the serializable configuration types for flowgrid:
//!
//! - [`WorkflowDef`]: a workflow definition that can be imported into a store
//!   (nodes are referenced by a local key until the store assigns ids)
//! - [`EditorSettings`]: defaults for an edit session (grid width, whether to
//!   lay out on first load, the acting tenant)
//!
//! Both are read from JSON. Loading the file is left to the caller; this crate
//! only parses and validates.

mod error;
mod node;
mod settings;
mod transition;
mod workflow;

pub use error::ConfigError;
pub use node::NodeDef;
pub use settings::EditorSettings;
pub use transition::TransitionDef;
pub use workflow::WorkflowDef;
