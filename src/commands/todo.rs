//! Todo Commands
//!
//! Runs user intents against the remote store and folds the outcome into
//! the shared `SyncState`.
//! - load / add: pessimistic, the list changes after the remote answer
//! - update / complete: optimistic, reverted on failure

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{new_todo_fields, DomainError, DomainResult, Todo, TodoEdit, TodoId, ViewOptions};
use crate::repository::{ListQuery, RecordRepository};
use crate::store::{Action, SyncState};

/// What "complete" does to a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Always sets `is_completed = true`
    #[default]
    MarkDone,
    /// Flips `is_completed`
    Toggle,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    pub completion: CompletionPolicy,
}

/// Owns the sync state and talks to the repository on its behalf
#[derive(Clone)]
pub struct TodoController {
    repo: Arc<dyn RecordRepository>,
    state: Arc<Mutex<SyncState>>,
    /// Todos with an optimistic request outstanding
    in_flight: Arc<Mutex<HashSet<TodoId>>>,
    options: ControllerOptions,
}

impl TodoController {
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self::with_options(repo, ControllerOptions::default())
    }

    pub fn with_options(repo: Arc<dyn RecordRepository>, options: ControllerOptions) -> Self {
        Self {
            repo,
            state: Arc::new(Mutex::new(SyncState::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            options,
        }
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    pub async fn is_in_flight(&self, id: &TodoId) -> bool {
        self.in_flight.lock().await.contains(id)
    }

    async fn dispatch(&self, action: Action) {
        self.state.lock().await.apply(action);
    }

    /// Fetch the list for `view`, replacing local todos
    pub async fn load(&self, view: &ViewOptions) -> DomainResult<usize> {
        self.dispatch(Action::BeginLoad).await;

        match self.repo.list(&ListQuery::from_view(view)).await {
            Ok(records) => {
                let count = records.len();
                log::info!("Loaded {} todos", count);
                self.dispatch(Action::LoadSucceeded(records)).await;
                Ok(count)
            }
            Err(e) => {
                log::warn!("Loading todos failed: {}", e);
                self.dispatch(Action::LoadFailed(e.clone())).await;
                Err(e)
            }
        }
    }

    /// Create a todo; it appears at the head of the list once the store confirms it
    pub async fn add(&self, title: &str) -> DomainResult<Todo> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidInput("title is empty".to_string()));
        }

        self.dispatch(Action::BeginSave).await;

        let outcome = match self.repo.create(&new_todo_fields(title)).await {
            Ok(record) => match Todo::from_record(&record) {
                Ok(todo) => {
                    log::info!("Created todo {}", todo.id);
                    self.dispatch(Action::SaveSucceeded(record)).await;
                    Ok(todo)
                }
                Err(e) => {
                    self.dispatch(Action::LoadFailed(e.clone())).await;
                    Err(e)
                }
            },
            Err(e) => {
                log::warn!("Creating todo failed: {}", e);
                self.dispatch(Action::LoadFailed(e.clone())).await;
                Err(e)
            }
        };

        self.dispatch(Action::EndRequest).await;
        outcome
    }

    /// Apply an edit locally, then confirm it remotely
    pub async fn update(&self, mut edit: TodoEdit) -> DomainResult<()> {
        if let Some(title) = edit.title.as_mut() {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(DomainError::InvalidInput("title is empty".to_string()));
            }
            *title = trimmed.to_string();
        }

        let id = edit.id.clone();
        let applied = self
            .apply_optimistic(&id, |todo| edit.changes(todo).then(|| Action::update(edit.clone())))
            .await?;

        match applied {
            Some(snapshot) => self.confirm(snapshot, edit).await,
            None => Ok(()),
        }
    }

    /// Mark a todo done (or flip it, under `CompletionPolicy::Toggle`)
    pub async fn complete(&self, id: &TodoId) -> DomainResult<()> {
        let policy = self.options.completion;
        let applied = self
            .apply_optimistic(id, |todo| match policy {
                CompletionPolicy::MarkDone if todo.is_completed => None,
                CompletionPolicy::MarkDone => Some(Action::Complete(id.clone())),
                CompletionPolicy::Toggle => Some(Action::ToggleCompleted(id.clone())),
            })
            .await?;

        let Some(snapshot) = applied else {
            return Ok(());
        };
        let attempted = TodoEdit::new(id.clone()).with_completed(!snapshot.is_completed);
        self.confirm(snapshot, attempted).await
    }

    /// Dismiss the error banner
    pub async fn clear_error(&self) {
        self.dispatch(Action::ClearError).await;
    }

    /// Claim `id`, snapshot it and apply the change `change` picks.
    /// Returns the snapshot, or `None` (and releases the claim) if there was
    /// nothing to change.
    async fn apply_optimistic<F>(&self, id: &TodoId, change: F) -> DomainResult<Option<Todo>>
    where
        F: FnOnce(&Todo) -> Option<Action>,
    {
        self.claim(id).await?;

        let mut state = self.state.lock().await;
        let Some(snapshot) = state.find(id).cloned() else {
            drop(state);
            self.release(id).await;
            return Err(DomainError::NotFound(format!("todo {}", id)));
        };

        match change(&snapshot) {
            Some(action) => {
                state.apply(action);
                Ok(Some(snapshot))
            }
            None => {
                drop(state);
                self.release(id).await;
                Ok(None)
            }
        }
    }

    /// Send `attempted`; on failure put `snapshot` back through the update path
    async fn confirm(&self, snapshot: Todo, attempted: TodoEdit) -> DomainResult<()> {
        let id = &attempted.id;
        let result = self.repo.update(id, &attempted.to_fields()).await;

        if let Err(e) = &result {
            log::warn!("Reverting todo {}: {}", id, e);
            self.dispatch(Action::revert(&snapshot, &attempted, e.clone())).await;
        }
        self.release(id).await;
        result.map(|_| ())
    }

    async fn claim(&self, id: &TodoId) -> DomainResult<()> {
        if !self.in_flight.lock().await.insert(id.clone()) {
            return Err(DomainError::Conflict(format!("todo {} has a request in flight", id)));
        }
        Ok(())
    }

    async fn release(&self, id: &TodoId) {
        self.in_flight.lock().await.remove(id);
    }
}
