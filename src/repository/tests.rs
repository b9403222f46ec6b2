//! Repository Integration Tests
//!
//! Tests for InMemoryRepository behaving like the remote store.

#[cfg(test)]
mod tests {
    use crate::domain::{new_todo_fields, SortDirection, SortField, TodoId, ViewOptions};
    use crate::repository::{InMemoryRepository, ListQuery, RecordRepository};
    use serde_json::json;

    async fn setup_repo(titles: &[&str]) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for title in titles {
            repo.create(&new_todo_fields(title)).await.expect("Failed to create");
        }
        repo
    }

    fn titles(records: &[crate::domain::RemoteRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.fields["title"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_time() {
        let repo = setup_repo(&[]).await;

        let created = repo.create(&new_todo_fields("Test todo")).await.expect("Failed to create");

        assert_eq!(created.id.as_deref(), Some("rec0001"));
        assert!(created.created_time.is_some());
        assert_eq!(created.fields["isCompleted"], json!(false));
    }

    #[tokio::test]
    async fn test_list_sorted_by_title() {
        let repo = setup_repo(&["b", "c", "a"]).await;

        let view = ViewOptions::new(SortField::Title, SortDirection::Asc);
        let records = repo.list(&ListQuery::from_view(&view)).await.expect("List failed");
        assert_eq!(titles(&records), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_list_newest_first_by_default() {
        let repo = setup_repo(&["first", "second", "third"]).await;

        let records = repo.list(&ListQuery::from_view(&ViewOptions::default())).await.unwrap();
        assert_eq!(titles(&records), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_list_search_filters_titles() {
        let repo = setup_repo(&["buy milk", "walk dog", "milk the cow"]).await;

        let view = ViewOptions::new(SortField::Title, SortDirection::Asc).with_query("milk");
        let records = repo.list(&ListQuery::from_view(&view)).await.unwrap();
        assert_eq!(titles(&records), vec!["buy milk", "milk the cow"]);
    }

    #[tokio::test]
    async fn test_update_patches_fields() {
        let repo = setup_repo(&["Original"]).await;
        let id = TodoId::new("rec0001");

        let mut fields = serde_json::Map::new();
        fields.insert("isCompleted".to_string(), json!(true));
        let updated = repo.update(&id, &fields).await.expect("Update failed");

        assert_eq!(updated.fields["title"], json!("Original"));
        assert_eq!(updated.fields["isCompleted"], json!(true));
        assert_eq!(repo.get(&id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let repo = setup_repo(&[]).await;

        let err = repo.update(&TodoId::new("nope"), &serde_json::Map::new()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let repo = setup_repo(&["a"]).await;
        repo.fail_next("Service Unavailable").await;

        let err = repo.list(&ListQuery::default()).await.unwrap_err();
        assert_eq!(err.message(), "Service Unavailable");
        assert_eq!(repo.list(&ListQuery::default()).await.unwrap().len(), 1);
    }
}
