mod support;

use std::sync::Arc;

use taskboard::error::Error;
use taskboard::store::{MemoryStore, RecordStore};
use taskboard::task::{Priority, Task, TaskInput, TaskRepository};

use support::{at, ids, task, task_repo, FlakyStore};

#[tokio::test]
async fn get_all_orders_priority_before_recency() {
    let repo = task_repo(vec![
        task(1, Priority::Low, false, at(1)),
        task(2, Priority::High, false, at(2)),
    ]);
    let tasks = repo.get_all().await.expect("get_all");
    assert_eq!(ids(&tasks), vec![2, 1]);
}

#[tokio::test]
async fn get_all_never_puts_active_after_completed() {
    let repo = task_repo(vec![
        task(1, Priority::High, true, at(9)),
        task(2, Priority::Low, false, at(1)),
        task(3, Priority::Medium, true, at(3)),
        task(4, Priority::Medium, false, at(4)),
    ]);
    let tasks = repo.get_all().await.expect("get_all");
    assert_eq!(ids(&tasks), vec![4, 2, 1, 3]);
    let first_completed = tasks.iter().position(|t| t.completed).expect("completed");
    assert!(tasks[first_completed..].iter().all(|t| t.completed));
}

#[tokio::test]
async fn create_assigns_max_plus_one() {
    let repo = task_repo(vec![
        task(4, Priority::Low, false, at(1)),
        task(9, Priority::Low, false, at(2)),
    ]);
    let created = repo
        .create(TaskInput::new("Next", 1))
        .await
        .expect("create");
    assert_eq!(created.id, 10);
}

#[tokio::test]
async fn double_toggle_restores_state() {
    let repo = task_repo(vec![task(1, Priority::Medium, false, at(1))]);

    let done = repo.toggle_complete(1).await.expect("toggle");
    assert!(done.completed);
    assert!(done.completed_at.is_some());
    assert!(done.updated_at >= done.created_at);

    let reopened = repo.toggle_complete("1").await.expect("toggle");
    assert!(!reopened.completed);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn toggle_missing_task_is_not_found() {
    let repo = task_repo(Vec::new());
    let err = repo.toggle_complete(3).await.expect_err("missing");
    assert!(matches!(err, Error::NotFound { kind: "Task", id: 3 }));
}

#[tokio::test]
async fn delete_missing_task_is_not_found() {
    let repo = task_repo(vec![task(1, Priority::Medium, false, at(1))]);
    repo.delete(1).await.expect("delete");
    let err = repo.delete(1).await.expect_err("second delete");
    assert!(matches!(err, Error::NotFound { id: 1, .. }));
}

#[tokio::test]
async fn bulk_delete_skips_missing_ids() {
    let repo = task_repo(vec![
        task(1, Priority::Medium, false, at(1)),
        task(2, Priority::Medium, false, at(2)),
    ]);
    let deleted = repo.bulk_delete([2, 99]).await.expect("bulk delete");
    assert_eq!(ids(&deleted), vec![2]);
    assert_eq!(ids(&repo.get_all().await.expect("get_all")), vec![1]);
}

#[tokio::test]
async fn bulk_delete_deduplicates_and_accepts_strings() {
    let repo = task_repo(vec![
        task(1, Priority::Medium, false, at(1)),
        task(2, Priority::Medium, false, at(2)),
    ]);
    let deleted = repo
        .bulk_delete(["1", " 1 ", "2"])
        .await
        .expect("bulk delete");
    assert_eq!(ids(&deleted), vec![1, 2]);
    assert!(repo.get_all().await.expect("get_all").is_empty());
}

#[tokio::test]
async fn malformed_ids_fail_validation_before_the_store() {
    let repo = task_repo(vec![task(1, Priority::Medium, false, at(1))]);
    for raw in ["abc", "0", "-2"] {
        let err = repo.get_by_id(raw).await.expect_err("invalid id");
        assert!(matches!(err, Error::Validation(_)), "{raw}: {err:?}");
    }
    let err = repo.bulk_delete(["1", "x"]).await.expect_err("invalid batch");
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(repo.get_all().await.expect("get_all").len(), 1);
}

#[tokio::test]
async fn backend_failures_surface_as_backend_errors() {
    let repo = TaskRepository::new(Arc::new(FlakyStore::<Task>::broken()));
    let err = repo.get_all().await.expect_err("backend");
    assert!(matches!(err, Error::Backend { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn concurrent_toggles_on_different_tasks_do_not_interfere() {
    let store = MemoryStore::with_records(vec![
        task(1, Priority::Medium, false, at(1)),
        task(2, Priority::Medium, false, at(2)),
        task(3, Priority::Medium, false, at(3)),
    ])
    .with_latency(std::time::Duration::from_millis(5));
    let repo = TaskRepository::new(Arc::new(store.clone()));

    let (a, b, c) = tokio::join!(
        repo.toggle_complete(1),
        repo.delete(2),
        repo.toggle_complete(3)
    );
    assert!(a.expect("toggle 1").completed);
    b.expect("delete 2");
    assert!(c.expect("toggle 3").completed);

    let remaining = store.get_all().await.expect("snapshot");
    assert_eq!(ids(&remaining), vec![1, 3]);
    assert!(remaining.iter().all(|t| t.completed && t.completed_at.is_some()));
}
