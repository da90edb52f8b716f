//! Integration tests for error handling.
//!
//! Tests that errors are returned as typed StoreError values for invalid operations.

mod common;

use common::{TestEnv, store_error};
use std::fs;
use td::{DeletePolicy, State, Store, StoreError, StoreQueryExt, TaskPatch, ValidationError};
use tempfile::TempDir;

// =============================================================================
// Task Not Found Tests
// =============================================================================

#[test]
fn test_get_nonexistent_task_fails() {
    let env = TestEnv::new();

    assert!(matches!(
        store_error(env.store.get("nonexistent")),
        StoreError::NotFound(id) if id == "nonexistent"
    ));
}

#[test]
fn test_get_is_exact_match_only() {
    let mut env = TestEnv::new();
    env.create_task("Build auth system");

    assert!(matches!(store_error(env.store.get("build")), StoreError::NotFound(_)));
    assert!(matches!(store_error(env.store.get("Build-Auth-System")), StoreError::NotFound(_)));
}

#[test]
fn test_update_nonexistent_task_fails() {
    let mut env = TestEnv::new();

    let result = env.store.update("nonexistent", TaskPatch::new().title("title"));
    assert!(matches!(store_error(result), StoreError::NotFound(_)));
}

#[test]
fn test_set_state_nonexistent_task_fails() {
    let mut env = TestEnv::new();

    let result = env.store.set_state("nonexistent", State::Focus);
    assert!(matches!(store_error(result), StoreError::NotFound(_)));
}

#[test]
fn test_delete_nonexistent_task_fails() {
    let mut env = TestEnv::new();

    for policy in [DeletePolicy::Reparent, DeletePolicy::Reject, DeletePolicy::Cascade] {
        let result = env.store.delete("nonexistent", policy);
        assert!(matches!(store_error(result), StoreError::NotFound(_)));
    }
}

#[test]
fn test_create_with_missing_parent_fails() {
    let mut env = TestEnv::new();

    let result = env.store.create("Child", None, Some("ghost"), None);
    assert!(matches!(store_error(result), StoreError::NotFound(id) if id == "ghost"));
    assert_eq!(env.total_count(), 0);
}

#[test]
fn test_move_to_missing_parent_fails() {
    let mut env = TestEnv::new();
    let task = env.create_task("Task");

    let result = env.store.move_to(&task.id, Some("ghost"));
    assert!(matches!(store_error(result), StoreError::NotFound(_)));
    assert_eq!(env.reload(&task), task);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_create_title_without_slug_fails() {
    let mut env = TestEnv::new();

    let result = env.store.create("!!!", None, None, None);
    assert!(matches!(
        store_error(result),
        StoreError::Validation(ValidationError::EmptySlug(_))
    ));
}

#[test]
fn test_create_title_without_slug_succeeds_with_override() {
    let mut env = TestEnv::new();

    let task = env.store.create("!!!", None, None, Some("bang")).unwrap();
    assert_eq!(task.id, "bang");
    assert_eq!(task.title, "!!!");
}

#[test]
fn test_create_empty_title_fails() {
    let mut env = TestEnv::new();

    for title in ["", "   "] {
        let result = env.store.create(title, None, None, Some("valid-id"));
        assert!(matches!(
            store_error(result),
            StoreError::Validation(ValidationError::EmptyTitle)
        ));
    }
}

#[test]
fn test_create_title_too_long_fails() {
    let mut env = TestEnv::new();

    let result = env.store.create(&"x".repeat(501), None, None, None);
    assert!(matches!(
        store_error(result),
        StoreError::Validation(ValidationError::TitleTooLong)
    ));
}

#[test]
fn test_create_control_chars_in_title_fails() {
    let mut env = TestEnv::new();

    let result = env.store.create("Title\nwith\nnewlines", None, None, None);
    assert!(matches!(
        store_error(result),
        StoreError::Validation(ValidationError::InvalidCharacters)
    ));
}

#[test]
fn test_create_invalid_id_override_fails() {
    let mut env = TestEnv::new();

    for bad in ["Upper", "has space", "-leading", "trailing-", "dou--ble", "../escape", ""] {
        let result = env.store.create("Task", None, None, Some(bad));
        assert!(
            matches!(store_error(result), StoreError::Validation(ValidationError::InvalidId(_))),
            "override {:?} should be rejected",
            bad
        );
    }
    assert_eq!(env.total_count(), 0);
}

#[test]
fn test_update_empty_title_fails() {
    let mut env = TestEnv::new();
    let task = env.create_task("Task");

    let result = env.store.update(&task.id, TaskPatch::new().title(""));
    assert!(matches!(
        store_error(result),
        StoreError::Validation(ValidationError::EmptyTitle)
    ));
    assert_eq!(env.reload(&task).title, "Task");
}

#[test]
fn test_invalid_state_name() {
    assert!(matches!(
        "blocked".parse::<State>(),
        Err(ValidationError::InvalidState(s)) if s == "blocked"
    ));
}

// =============================================================================
// Storage Tests
// =============================================================================

#[test]
fn test_open_uninitialized_dir_fails() {
    let temp_dir = TempDir::new().unwrap();

    let result = Store::open(temp_dir.path());
    assert!(matches!(store_error(result), StoreError::Storage { .. }));
}

#[test]
fn test_discover_without_project_fails() {
    let temp_dir = TempDir::new().unwrap();

    let result = Store::discover(temp_dir.path());
    assert!(matches!(store_error(result), StoreError::Storage { .. }));
}

#[test]
fn test_get_corrupt_file_is_storage_error() {
    let mut env = TestEnv::new();
    let task = env.create_task("Task");
    fs::write(env.task_file(&task.id), "title: [broken").unwrap();

    assert!(matches!(store_error(env.store.get(&task.id)), StoreError::Storage { .. }));
}

#[test]
fn test_create_under_corrupt_parent_fails() {
    let mut env = TestEnv::new();
    fs::write(env.task_file("broken"), "id: [unterminated").unwrap();

    let result = env.store.create("Child", None, Some("broken"), None);
    assert!(matches!(store_error(result), StoreError::Storage { .. }));
    assert_eq!(env.total_count(), 0);
}

#[test]
fn test_move_under_misnamed_parent_fails() {
    let mut env = TestEnv::new();
    let task = env.create_task("Task");
    let other = env.create_task("Other");
    // File name no longer matches the id inside it
    fs::rename(env.task_file(&other.id), env.task_file("renamed")).unwrap();

    let result = env.store.move_to(&task.id, Some("renamed"));
    assert!(matches!(store_error(result), StoreError::Storage { .. }));
    assert_eq!(env.reload(&task).parent, None);
    env.assert_forest();
}

#[test]
fn test_corrupt_file_does_not_hide_other_tasks() {
    let mut env = TestEnv::new();
    env.create_task("Good one");
    env.create_task("Good two");
    fs::write(env.task_file("corrupt"), "::: not yaml :::\n\t- [").unwrap();

    let scan = env.store.scan().unwrap();
    assert_eq!(scan.tasks.len(), 2);
    assert_eq!(scan.skipped.len(), 1);
    assert_eq!(scan.skipped[0].path, env.task_file("corrupt"));

    // Listing and counting still work over the readable tasks
    assert_eq!(env.store.list(None, true).unwrap().len(), 2);
    assert_eq!(env.store.status().unwrap().total, 2);
}

#[test]
fn test_error_kinds() {
    assert_eq!(StoreError::NotFound("x".into()).kind(), "not_found");
    assert_eq!(StoreError::Validation(ValidationError::EmptyTitle).kind(), "validation");
    let storage = StoreError::Storage {
        path: "x.yaml".into(),
        reason: "denied".into(),
    };
    assert_eq!(storage.kind(), "storage");
    assert!(storage.to_string().contains("denied"));
}
