use sqlx::SqlitePool;

use super::task::{CreateTask, Priority, Task};
use crate::DBService;

pub(crate) async fn setup_test_pool() -> SqlitePool {
    DBService::new_in_memory()
        .await
        .expect("failed to open sqlite memory db")
        .pool
}

pub(crate) async fn create_test_task(pool: &SqlitePool, owner: &str, title: &str) -> Task {
    Task::create(
        pool,
        owner,
        &CreateTask {
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            tags: Vec::new(),
            due_date: None,
        },
    )
    .await
    .expect("failed to create test task")
}
