/// Integration tests for migrations and seed data

mod common;

use common::setup_pool;
use taskmanager_shared::db::migrations::{get_migration_status, known_migration_count, run_migrations};
use taskmanager_shared::db::pool::close_pool;
use taskmanager_shared::db::seed::{ensure_admin_user, ADMIN_USERNAME, ADMIN_USER_ID};
use taskmanager_shared::models::label::Label;
use taskmanager_shared::models::user::{User, UserRole};

#[tokio::test]
async fn test_migrations_are_up_to_date_and_idempotent() {
    let Some(pool) = setup_pool().await else { return };

    let first = get_migration_status(&pool).await.expect("status");
    assert!(first.is_up_to_date);
    assert_eq!(first.applied_migrations, known_migration_count());
    assert!(first.latest_version.is_some());

    run_migrations(&pool).await.expect("Second migration run failed");
    let second = get_migration_status(&pool).await.expect("status");
    assert_eq!(first.applied_migrations, second.applied_migrations);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_default_labels_are_seeded() {
    let Some(pool) = setup_pool().await else { return };

    let labels = Label::list(&pool).await.expect("list labels");
    let names: Vec<_> = labels.iter().map(|l| l.name.as_str()).collect();
    for expected in ["Urgent", "Important", "Development", "Design", "Documentation"] {
        assert!(names.contains(&expected), "missing seeded label {expected}");
    }

    close_pool(pool).await;
}

#[tokio::test]
async fn test_admin_seed_runs_once() {
    let Some(pool) = setup_pool().await else { return };

    let admin = User::find_by_username(&pool, ADMIN_USERNAME)
        .await
        .expect("query")
        .expect("admin should exist");
    assert_eq!(admin.id, ADMIN_USER_ID);
    assert_eq!(admin.role, UserRole::Admin);

    let created = ensure_admin_user(&pool, "Another1!").await.expect("seed");
    assert!(!created, "seed must not recreate an existing admin");

    close_pool(pool).await;
}
