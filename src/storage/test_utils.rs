//! Test utilities for storage initialization
//!
//! libSQL's `:memory:` databases are private to each connection, so tests use
//! a file in a temporary directory instead.

use crate::storage::libsql::LibsqlStorage;
use tempfile::TempDir;

/// Create a migrated storage backend in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the storage is used.
pub async fn create_test_storage() -> (LibsqlStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("rapport_test.db");

    let storage = LibsqlStorage::open_or_create(&db_path)
        .await
        .expect("Failed to create test storage");

    (storage, temp_dir)
}
