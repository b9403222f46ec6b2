//! Synchronization State Store
//!
//! Local todo list plus request flags. The state only changes through
//! `Action`s; `reduce` is deterministic and never fails.
//!
//! Load and create are pessimistic: the list changes only once the remote
//! answer is in. Update and complete are optimistic: the change is applied
//! first and undone through the same `Update` transition if the remote call
//! fails.

use serde::Serialize;

use crate::domain::{DomainError, Entity, RemoteRecord, Todo, TodoEdit, TodoId};

/// Request phase; `HasError` is tracked separately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Saving,
}

/// Global application state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Todos in remote order, newest creations first
    pub todo_list: Vec<Todo>,
    /// A list fetch is outstanding
    pub is_loading: bool,
    /// A create request is outstanding
    pub is_saving: bool,
    /// Message of the last failure, empty once dismissed
    pub error_message: String,
}

/// Intents accepted by the store
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    BeginLoad,
    LoadSucceeded(Vec<RemoteRecord>),
    LoadFailed(DomainError),
    BeginSave,
    SaveSucceeded(RemoteRecord),
    EndRequest,
    /// Merge an edit; also used to revert with a pre-edit snapshot
    Update {
        edited: TodoEdit,
        error: Option<DomainError>,
    },
    Complete(TodoId),
    ToggleCompleted(TodoId),
    ClearError,
}

impl Action {
    pub fn update(edited: TodoEdit) -> Self {
        Action::Update { edited, error: None }
    }

    /// Undo an optimistic change: an `Update` carrying the snapshot taken
    /// before `attempted` was applied, plus the failure that caused it
    pub fn revert(snapshot: &Todo, attempted: &TodoEdit, error: DomainError) -> Self {
        Action::Update {
            edited: TodoEdit::undo(snapshot, attempted),
            error: Some(error),
        }
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.is_saving {
            Phase::Saving
        } else {
            Phase::Idle
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    pub fn find(&self, id: &TodoId) -> Option<&Todo> {
        self.todo_list.iter().find(|todo| todo.id() == id)
    }

    /// Todos still open, in list order (completed ones are hidden in the list view)
    pub fn pending_todos(&self) -> Vec<&Todo> {
        self.todo_list.iter().filter(|todo| !todo.is_completed).collect()
    }

    /// Apply one action in place
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::BeginLoad => {
                self.is_loading = true;
            }
            Action::LoadSucceeded(records) => {
                self.todo_list = normalize_all(&records);
                self.is_loading = false;
            }
            Action::LoadFailed(error) => {
                self.error_message = error.message().to_string();
                self.is_loading = false;
                self.is_saving = false;
            }
            Action::BeginSave => {
                self.is_saving = true;
            }
            Action::SaveSucceeded(record) => {
                match Todo::from_record(&record) {
                    Ok(todo) => self.todo_list.insert(0, todo),
                    Err(e) => log::warn!("Dropping saved record: {}", e),
                }
                self.is_saving = false;
            }
            Action::EndRequest => {
                self.is_loading = false;
                self.is_saving = false;
            }
            Action::Update { edited, error } => {
                self.apply_edit(&edited);
                if let Some(error) = error {
                    self.error_message = error.message().to_string();
                }
            }
            Action::Complete(id) => {
                self.set_completed(&id, |_| true);
            }
            Action::ToggleCompleted(id) => {
                self.set_completed(&id, |completed| !completed);
            }
            Action::ClearError => {
                self.error_message.clear();
            }
        }
    }

    fn apply_edit(&mut self, edited: &TodoEdit) {
        if let Some(todo) = self.todo_list.iter_mut().find(|todo| todo.id() == &edited.id) {
            todo.merge(edited);
        }
    }

    fn set_completed(&mut self, id: &TodoId, next: impl Fn(bool) -> bool) {
        if let Some(todo) = self.todo_list.iter_mut().find(|todo| todo.id() == id) {
            todo.is_completed = next(todo.is_completed);
        }
    }
}

/// Pure form of `SyncState::apply`
pub fn reduce(mut state: SyncState, action: Action) -> SyncState {
    state.apply(action);
    state
}

fn normalize_all(records: &[RemoteRecord]) -> Vec<Todo> {
    records
        .iter()
        .filter_map(|record| match Todo::from_record(record) {
            Ok(todo) => Some(todo),
            Err(e) => {
                log::warn!("Skipping remote record: {}", e);
                None
            }
        })
        .collect()
}
