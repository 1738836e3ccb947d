//! Storage-layer tests against a real temp SQLite database.

use taskd::storage::Storage;
use taskd::tasks::TaskStatus;
use tempfile::TempDir;

async fn make_storage() -> (Storage, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Storage::new(dir.path()).await.expect("open storage");
    (storage, dir)
}

#[tokio::test]
async fn create_assigns_id_and_timestamp() {
    let (storage, _dir) = make_storage().await;
    let row = storage
        .create_task("Title", "Description", TaskStatus::Pending)
        .await
        .expect("create");
    assert!(row.id > 0);
    assert_eq!(row.status, "pending");
    assert!(
        chrono::DateTime::parse_from_rfc3339(&row.created_at).is_ok(),
        "created_at must be RFC 3339, got {}",
        row.created_at
    );
}

#[tokio::test]
async fn ids_are_monotonic() {
    let (storage, _dir) = make_storage().await;
    let a = storage.create_task("a", "1", TaskStatus::Pending).await.expect("a");
    let b = storage.create_task("b", "2", TaskStatus::Done).await.expect("b");
    assert!(b.id > a.id);
}

#[tokio::test]
async fn list_orders_most_recent_first() {
    let (storage, _dir) = make_storage().await;
    let a = storage.create_task("a", "1", TaskStatus::Pending).await.expect("a");
    let b = storage.create_task("b", "2", TaskStatus::Pending).await.expect("b");
    let c = storage.create_task("c", "3", TaskStatus::Pending).await.expect("c");

    // Same-second inserts share a timestamp; the id tiebreak still keeps
    // insertion order.
    let ids: Vec<i64> = storage
        .list_tasks()
        .await
        .expect("list")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
}

#[tokio::test]
async fn get_unknown_is_none() {
    let (storage, _dir) = make_storage().await;
    assert!(storage.get_task(12345).await.expect("get").is_none());
}

#[tokio::test]
async fn update_replaces_fields_and_keeps_created_at() {
    let (storage, _dir) = make_storage().await;
    let row = storage
        .create_task("old", "old text", TaskStatus::Pending)
        .await
        .expect("create");

    let updated = storage
        .update_task(row.id, "new", "new text", TaskStatus::Done)
        .await
        .expect("update")
        .expect("row exists");
    assert_eq!(updated.title, "new");
    assert_eq!(updated.description, "new text");
    assert_eq!(updated.status, "done");
    assert_eq!(updated.created_at, row.created_at);
}

#[tokio::test]
async fn update_unknown_is_none() {
    let (storage, _dir) = make_storage().await;
    let result = storage
        .update_task(999, "x", "y", TaskStatus::Pending)
        .await
        .expect("update");
    assert!(result.is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_row_matched() {
    let (storage, _dir) = make_storage().await;
    let row = storage
        .create_task("t", "d", TaskStatus::Pending)
        .await
        .expect("create");

    assert!(storage.delete_task(row.id).await.expect("delete"));
    assert!(!storage.delete_task(row.id).await.expect("second delete"));
    assert!(storage.get_task(row.id).await.expect("get").is_none());
}

#[tokio::test]
async fn delete_all_clears_the_table() {
    let (storage, _dir) = make_storage().await;
    for i in 0..3 {
        storage
            .create_task(&format!("t{i}"), "d", TaskStatus::Pending)
            .await
            .expect("create");
    }
    assert_eq!(storage.count_tasks().await.expect("count"), 3);
    assert_eq!(storage.delete_all_tasks().await.expect("delete all"), 3);
    assert_eq!(storage.count_tasks().await.expect("count"), 0);
}

#[tokio::test]
async fn invalid_stored_status_fails_conversion() {
    let (storage, _dir) = make_storage().await;
    let mut row = storage
        .create_task("t", "d", TaskStatus::Pending)
        .await
        .expect("create");
    row.status = "archived".to_string();
    assert!(row.into_task().is_err());
}
