//! Controller Integration Tests
//!
//! Drives TodoController against InMemoryRepository.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::commands::{CompletionPolicy, ControllerOptions, TodoController};
    use crate::domain::{DomainError, RemoteRecord, SortDirection, SortField, Todo, TodoEdit, TodoId, ViewOptions};
    use crate::repository::InMemoryRepository;
    use crate::store::Phase;

    fn record(id: &str, title: &str) -> RemoteRecord {
        serde_json::from_value(json!({"id": id, "fields": {"title": title}})).unwrap()
    }

    async fn setup(records: Vec<RemoteRecord>) -> (Arc<InMemoryRepository>, TodoController) {
        setup_with(InMemoryRepository::with_records(records), ControllerOptions::default()).await
    }

    async fn setup_with(repo: InMemoryRepository, options: ControllerOptions) -> (Arc<InMemoryRepository>, TodoController) {
        let repo = Arc::new(repo);
        let controller = TodoController::with_options(repo.clone(), options);
        controller.load(&ViewOptions::default()).await.expect("Failed to load");
        (repo, controller)
    }

    #[tokio::test]
    async fn test_load_normalizes_records() {
        let (_repo, controller) = setup(vec![record("r1", "A")]).await;

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list, vec![Todo::new("r1", "A")]);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_load_uses_view_options() {
        let (_repo, controller) = setup(vec![record("r1", "banana"), record("r2", "apple"), record("r3", "cherry")]).await;

        let view = ViewOptions::new(SortField::Title, SortDirection::Asc).with_query("an");
        controller.load(&view).await.unwrap();

        let state = controller.snapshot().await;
        let titles: Vec<_> = state.todo_list.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["banana"]);
    }

    #[tokio::test]
    async fn test_load_waits_for_remote() {
        let repo = InMemoryRepository::with_records(vec![record("r1", "A")]).with_latency(Duration::from_millis(50));
        let controller = TodoController::new(Arc::new(repo));

        let view = ViewOptions::default();
        let (loaded, during) = tokio::join!(controller.load(&view), controller.snapshot());

        assert_eq!(loaded.unwrap(), 1);
        assert_eq!(during.phase(), Phase::Loading);
        assert!(during.todo_list.is_empty());
        assert_eq!(controller.snapshot().await.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_load_failure_sets_error() {
        let repo = InMemoryRepository::new();
        repo.fail_next("Unauthorized").await;
        let controller = TodoController::new(Arc::new(repo));

        let err = controller.load(&ViewOptions::default()).await.unwrap_err();
        assert!(err.is_transport());

        let state = controller.snapshot().await;
        assert!(state.todo_list.is_empty());
        assert_eq!(state.error_message, "Unauthorized");
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_add_prepends_after_confirmation() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;

        let todo = controller.add("  B  ").await.expect("Failed to add");
        assert_eq!(todo.title, "B");
        assert!(!todo.is_completed);

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list[0].id, todo.id);
        assert_eq!(state.todo_list[1].id, TodoId::new("r1"));
        assert!(!state.is_saving);
        assert!(repo.get(&todo.id).await.is_some());
    }

    #[tokio::test]
    async fn test_add_blank_title_rejected() {
        let (_repo, controller) = setup(vec![]).await;
        let before = controller.snapshot().await;

        let err = controller.add("   ").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(controller.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_add_failure_leaves_list() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;
        repo.fail_next("Unprocessable Entity").await;

        assert!(controller.add("B").await.is_err());

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list.len(), 1);
        assert_eq!(state.error_message, "Unprocessable Entity");
        assert!(!state.is_saving);
        assert_eq!(repo.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_applies_and_persists() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;
        let id = TodoId::new("r1");

        controller.update(TodoEdit::new("r1").with_title(" renamed ")).await.unwrap();

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list[0].title, "renamed");
        assert!(!state.todo_list[0].is_completed);
        assert_eq!(repo.get(&id).await.unwrap().fields["title"], json!("renamed"));
        assert!(!controller.is_in_flight(&id).await);
    }

    #[tokio::test]
    async fn test_update_failure_reverts() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;
        let before = controller.snapshot().await;
        repo.fail_next("Bad Gateway").await;

        let err = controller.update(TodoEdit::new("r1").with_title("B")).await.unwrap_err();
        assert_eq!(err.message(), "Bad Gateway");

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list, before.todo_list);
        assert_eq!(state.error_message, "Bad Gateway");
        assert!(!controller.is_in_flight(&TodoId::new("r1")).await);
    }

    #[tokio::test]
    async fn test_update_failure_drops_added_field() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;
        let before = controller.snapshot().await;
        repo.fail_next("Bad Gateway").await;

        let mut edit = TodoEdit::new("r1");
        edit.extra.insert("priority".to_string(), json!("high"));
        assert!(controller.update(edit).await.is_err());

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list, before.todo_list);
        assert!(state.todo_list[0].extra.is_empty());
        assert_eq!(state.error_message, "Bad Gateway");
    }

    #[tokio::test]
    async fn test_update_failure_restores_changed_field() {
        let mut fields = serde_json::Map::new();
        fields.insert("title".to_string(), json!("A"));
        fields.insert("priority".to_string(), json!("low"));
        let (repo, controller) = setup(vec![RemoteRecord::new("r1", fields)]).await;
        let before = controller.snapshot().await;
        repo.fail_next("Bad Gateway").await;

        let mut edit = TodoEdit::new("r1").with_title("B");
        edit.extra.insert("priority".to_string(), json!("high"));
        edit.extra.insert("tags".to_string(), json!(["x"]));
        assert!(controller.update(edit).await.is_err());

        assert_eq!(controller.snapshot().await.todo_list, before.todo_list);
    }

    #[tokio::test]
    async fn test_update_without_change_skips_remote() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;
        repo.fail_next("should not be reached").await;

        controller.update(TodoEdit::new("r1").with_title("A")).await.unwrap();
        assert!(!controller.snapshot().await.has_error());
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title_and_unknown_id() {
        let (_repo, controller) = setup(vec![record("r1", "A")]).await;

        let err = controller.update(TodoEdit::new("r1").with_title("  ")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = controller.update(TodoEdit::new("zzz").with_title("x")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(!controller.is_in_flight(&TodoId::new("zzz")).await);
    }

    #[tokio::test]
    async fn test_complete_marks_done() {
        let (repo, controller) = setup(vec![record("r1", "A")]).await;
        let id = TodoId::new("r1");

        controller.complete(&id).await.unwrap();
        controller.complete(&id).await.unwrap();

        let state = controller.snapshot().await;
        assert!(state.todo_list[0].is_completed);
        assert!(state.pending_todos().is_empty());
        assert_eq!(repo.get(&id).await.unwrap().fields["isCompleted"], json!(true));
    }

    #[tokio::test]
    async fn test_complete_failure_restores_snapshot() {
        let (repo, controller) = setup(vec![record("r1", "A"), record("r2", "B")]).await;
        let before = controller.snapshot().await;
        repo.fail_next("Service Unavailable").await;

        assert!(controller.complete(&TodoId::new("r1")).await.is_err());

        let state = controller.snapshot().await;
        assert_eq!(state.todo_list, before.todo_list);
        assert!(!state.error_message.is_empty());

        controller.clear_error().await;
        assert!(!controller.snapshot().await.has_error());
    }

    #[tokio::test]
    async fn test_toggle_policy_flips() {
        let options = ControllerOptions {
            completion: CompletionPolicy::Toggle,
        };
        let (repo, controller) = setup_with(InMemoryRepository::with_records(vec![record("r1", "A")]), options).await;
        let id = TodoId::new("r1");

        controller.complete(&id).await.unwrap();
        assert!(controller.snapshot().await.todo_list[0].is_completed);

        controller.complete(&id).await.unwrap();
        assert!(!controller.snapshot().await.todo_list[0].is_completed);
        assert_eq!(repo.get(&id).await.unwrap().fields["isCompleted"], json!(false));
    }

    #[tokio::test]
    async fn test_second_edit_of_same_todo_is_rejected_while_in_flight() {
        let repo = InMemoryRepository::with_records(vec![record("r1", "A")]).with_latency(Duration::from_millis(50));
        let (_repo, controller) = setup_with(repo, ControllerOptions::default()).await;

        let (first, second) = tokio::join!(
            controller.update(TodoEdit::new("r1").with_title("first")),
            controller.update(TodoEdit::new("r1").with_title("second")),
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(DomainError::Conflict(_))));
        assert_eq!(controller.snapshot().await.todo_list[0].title, "first");
    }

    #[tokio::test]
    async fn test_edits_of_different_todos_run_together() {
        let repo = InMemoryRepository::with_records(vec![record("r1", "A"), record("r2", "B")])
            .with_latency(Duration::from_millis(20));
        let (_repo, controller) = setup_with(repo, ControllerOptions::default()).await;

        let r1 = TodoId::new("r1");
        let (first, second) = tokio::join!(
            controller.complete(&r1),
            controller.update(TodoEdit::new("r2").with_title("B2")),
        );
        assert!(first.is_ok());
        assert!(second.is_ok());

        let state = controller.snapshot().await;
        assert!(state.find(&TodoId::new("r1")).unwrap().is_completed);
        assert_eq!(state.find(&TodoId::new("r2")).unwrap().title, "B2");
    }
}
