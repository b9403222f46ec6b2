//! Todo Sync
//!
//! Local todo list kept consistent with a remote Airtable table.
//!
//! Layered architecture:
//! - domain: Todo entity, normalization, view options, errors
//! - repository: Remote store access (Airtable, in-memory) and query building
//! - store: Synchronization state machine
//! - pagination: Page math and view controls
//! - commands: Intents run against the repository and the store

pub mod commands;
pub mod domain;
pub mod pagination;
pub mod repository;
pub mod store;

pub use commands::{CompletionPolicy, ControllerOptions, TodoController};
pub use domain::{DomainError, DomainResult, Todo, TodoEdit, TodoId, ViewOptions};
pub use store::{Action, SyncState};
