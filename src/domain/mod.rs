//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO external dependencies (except serde/chrono for the wire shape).

mod entity;
mod todo;
mod view;

pub use entity::{DomainError, DomainResult, Entity};
pub use todo::{new_todo_fields, RemoteRecord, Todo, TodoEdit, TodoId};
pub use view::{SortDirection, SortField, ViewOptions};
