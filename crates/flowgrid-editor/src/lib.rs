//! Flowgrid Editor
//!
//! This crate provides the mutation engine and the edit session for
//! workflow graphs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        EditSession                          │
//! │  - select_workflow(id) → load, first-load layout            │
//! │  - dispatch(action) → edit, then full reload                │
//! │  - set_grid_columns / auto_layout / menu / grid             │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Editor                             │
//! │  - checks preconditions on a workflow snapshot              │
//! │  - picks positions via Occupancy / AutoLayout               │
//! │  - builds an EditPlan of ordered store writes               │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  - persists nodes and transitions (SQLite or in memory)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flowgrid_editor::{EditAction, EditSession};
//!
//! let store = Arc::new(SqliteStore::open("flowgrid.db").await?);
//! let mut session = EditSession::new(store, EditorSettings::default());
//!
//! session.select_workflow(workflow_id).await?;
//! let outcome = session
//!   .dispatch(&EditAction::DropAction { action: ActionCode::UserWindow, position })
//!   .await?;
//! ```

mod action;
mod defaults;
mod engine;
mod error;
mod events;
mod menu;
mod plan;
mod session;

pub use action::EditAction;
pub use defaults::{DEFAULT_ATTRIBUTE_VALUE, DEFAULT_DOC_ACTION, action_defaults};
pub use engine::{COPY_SUFFIX, EditOutcome, Editor};
pub use error::EditError;
pub use events::{ChannelNotifier, NoopNotifier, SessionEvent, SessionNotifier};
pub use menu::{MenuEntry, MenuItem, NodeMenu};
pub use plan::{EditPlan, NodeRef, PlanReport, PlanResult, Step};
pub use session::EditSession;
