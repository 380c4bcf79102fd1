//! Integration tests for the save file
//!
//! Covers the on-disk format (key order, indentation) and the
//! present/absent lifecycle.

use record::{PowerRecord, RecordError, SaveFile};
use std::fs;

fn keyboard_hub_record() -> PowerRecord {
    PowerRecord::new(0x2109, 0x0813, vec![2, 1], 3)
}

#[test]
fn test_on_disk_format() {
    let dir = tempfile::tempdir().unwrap();
    let file = SaveFile::new(dir.path().join("saved.json"));

    file.save(&[keyboard_hub_record()]).unwrap();

    let content = fs::read_to_string(file.path()).unwrap();
    let expected = r#"[
  {
    "hub_port_numbers": [
      2,
      1
    ],
    "hub_vendor": 8457,
    "hub_product": 2067,
    "port_number": 3
  }
]"#;
    assert_eq!(content, expected);
}

#[test]
fn test_reads_file_written_by_other_tools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    // Different key order and spacing than this crate writes
    let written = r#"[{"hub_vendor": 8457, "hub_product": 2067,
        "port_number": 3, "hub_port_numbers": [2, 1]}]"#;
    fs::write(&path, written).unwrap();

    let records = SaveFile::new(&path).load().unwrap();
    assert_eq!(records, vec![keyboard_hub_record()]);
}

#[test]
fn test_empty_list_is_still_a_pending_restore() {
    let dir = tempfile::tempdir().unwrap();
    let file = SaveFile::new(dir.path().join("saved.json"));

    file.save(&[]).unwrap();

    assert!(file.exists());
    assert_eq!(fs::read_to_string(file.path()).unwrap(), "[]");
    assert!(file.load().unwrap().is_empty());
}

#[test]
fn test_save_overwrites_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let file = SaveFile::new(dir.path().join("saved.json"));

    file.save(&[keyboard_hub_record(), PowerRecord::new(1, 2, vec![1], 1)])
        .unwrap();
    file.save(&[keyboard_hub_record()]).unwrap();

    assert_eq!(file.load().unwrap(), vec![keyboard_hub_record()]);
    assert!(!dir.path().join("saved.json.tmp").exists());
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let file = SaveFile::new(dir.path().join("nested").join("state").join("saved.json"));

    file.save(&[keyboard_hub_record()]).unwrap();
    assert!(file.exists());
}

#[test]
fn test_malformed_file_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    fs::write(&path, "{not json").unwrap();

    let err = SaveFile::new(&path).load().unwrap_err();
    assert!(matches!(err, RecordError::Json { .. }));
}

#[test]
fn test_out_of_range_port_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    fs::write(
        &path,
        r#"[{"hub_port_numbers": [1], "hub_vendor": 1, "hub_product": 2, "port_number": 300}]"#,
    )
    .unwrap();

    assert!(SaveFile::new(&path).load().is_err());
}

#[test]
fn test_remove_deletes_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = SaveFile::new(dir.path().join("saved.json"));

    file.save(&[keyboard_hub_record()]).unwrap();
    file.remove().unwrap();

    assert!(!file.exists());
    assert!(file.load_or_empty().unwrap().is_empty());
}
