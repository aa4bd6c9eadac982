use std::fs;

use panel_engine::{InstanceStore, StorageDir};
use tempfile::TempDir;

#[test]
fn creates_missing_storage_dir() {
    let temp = TempDir::new().unwrap();
    let storage = StorageDir::new(temp.path().join("state"));
    storage.ensure().unwrap();
    assert!(temp.path().join("state").is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let storage = StorageDir::new(temp.path());

    let first = storage.write_atomic("panel.ron", "one").unwrap();
    let second = storage.write_atomic("panel.ron", "two").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "two");
    assert_eq!(storage.read_string("panel.ron").unwrap().as_deref(), Some("two"));
    assert_eq!(storage.read_string("missing").unwrap(), None);
}

#[test]
fn storage_path_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let storage = StorageDir::new(file_path);
    assert!(storage.write_atomic("instance_id", "abc").is_err());
}

#[test]
fn instance_id_is_stable_across_runs() {
    let temp = TempDir::new().unwrap();

    let first = InstanceStore::new(StorageDir::new(temp.path())).get_or_create().unwrap();
    let second = InstanceStore::new(StorageDir::new(temp.path())).get_or_create().unwrap();

    assert!(first.is_uuid());
    assert_eq!(first, second);
    assert_eq!(
        fs::read_to_string(temp.path().join("instance_id")).unwrap(),
        first.as_str()
    );
}

#[test]
fn blank_stored_id_is_replaced() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("instance_id"), "  \n").unwrap();

    let id = InstanceStore::new(StorageDir::new(temp.path())).get_or_create().unwrap();

    assert!(id.is_uuid());
    assert_eq!(fs::read_to_string(temp.path().join("instance_id")).unwrap(), id.as_str());
}

#[test]
fn existing_non_uuid_id_is_kept() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("instance_id"), "legacy-7\n").unwrap();

    let id = InstanceStore::new(StorageDir::new(temp.path())).get_or_create().unwrap();
    assert_eq!(id.as_str(), "legacy-7");
}
