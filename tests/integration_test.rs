use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::tempdir;
use topicstore::{Error, Store};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    name: String,
    age: i32,
}

fn set_of(ids: Vec<String>) -> HashSet<String> {
    ids.into_iter().collect()
}

#[test]
fn test_round_trip_values() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();

    let samples = [
        json!(null),
        json!(0),
        json!(""),
        json!(false),
        json!([1, "two", [3]]),
        json!({"nested": {"list": [1, 2, {"deep": null}]}}),
    ];
    for (i, value) in samples.iter().enumerate() {
        let id = format!("v{}", i);
        store.put("samples", &id, value.clone()).unwrap();
        assert_eq!(store.get("samples", &id).unwrap().as_ref(), Some(value));
    }

    store.put("samples", "v0", json!("overwritten")).unwrap();
    assert_eq!(store.get("samples", "v0").unwrap(), Some(json!("overwritten")));
}

#[test]
fn test_generic_helpers() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();

    let user = User { name: "Alice".to_string(), age: 30 };
    store.put_as("users", "alice", &user).unwrap();

    let got: Option<User> = store.get_as("users", "alice").unwrap();
    assert_eq!(got, Some(user));
    let missing: Option<User> = store.get_as("users", "bob").unwrap();
    assert_eq!(missing, None);

    store.put("users", "broken", json!("not a user")).unwrap();
    assert!(matches!(store.get_as::<User>("users", "broken"), Err(Error::Serialization(_))));
}

#[test]
fn test_missing_topic_reads_empty() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();

    assert_eq!(store.get("nowhere", "x").unwrap(), None);
    assert!(store.ids("nowhere").unwrap().is_empty());
    assert!(store.all("nowhere").unwrap().is_empty());
    assert!(store.values("nowhere").unwrap().is_empty());
    assert!(store.clean("nowhere").unwrap().is_empty());
    assert!(store.delete("nowhere", "x").unwrap().is_empty());
    assert!(store.move_records("nowhere", "x", "elsewhere").unwrap().is_empty());
    assert!(!dir.path().join("elsewhere").exists());
}

#[test]
fn test_ids_all_values() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    for (id, n) in [("a", 1), ("b", 2), ("c", 3)] {
        store.put("nums", id, json!(n)).unwrap();
    }

    let ids = store.ids("nums").unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(set_of(ids.clone()), set_of(vec!["a".into(), "b".into(), "c".into()]));

    let all = store.all("nums").unwrap();
    assert_eq!(all.get("b"), Some(&json!(2)));
    assert_eq!(all.len(), 3);

    // values follow the same order as ids
    let values = store.values("nums").unwrap();
    let expected: Vec<_> = ids.iter().map(|id| all[id].clone()).collect();
    assert_eq!(values, expected);
}

#[test]
fn test_delete_twice() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    store.put("colors", "red", json!("R")).unwrap();

    assert_eq!(store.delete("colors", "red").unwrap(), vec!["red".to_string()]);
    assert!(store.delete("colors", "red").unwrap().is_empty());
    assert!(!dir.path().join("colors").exists());
}

#[test]
fn test_delete_many_in_input_order() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    for id in ["a", "b", "c"] {
        store.put("t", id, json!(id)).unwrap();
    }

    let deleted = store.delete("t", ["c", "missing", "a"]).unwrap();
    assert_eq!(deleted, vec!["c".to_string(), "a".to_string()]);
    assert_eq!(store.ids("t").unwrap(), vec!["b".to_string()]);
    assert!(dir.path().join("t").is_dir());
}

#[test]
fn test_purge_existing_subset() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    for id in ["red", "green", "blue"] {
        store.put("colors", id, json!(id)).unwrap();
    }
    store.delete("colors", "red").unwrap();

    let removed = store.purge("colors", ["red", "green", "blue"]).unwrap();
    assert_eq!(set_of(removed.clone()), set_of(vec!["green".into(), "blue".into()]));
    assert_eq!(removed.len(), 2);
    assert!(store.ids("colors").unwrap().is_empty());
    assert!(dir.path().join("colors").is_dir());
}

#[test]
fn test_clean_removes_topic_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    store.put("colors", "green", json!("G")).unwrap();
    store.put("colors", "blue", json!("B")).unwrap();
    store.put("other", "x", json!(1)).unwrap();

    let removed = store.clean("colors").unwrap();
    assert_eq!(set_of(removed), set_of(vec!["green".into(), "blue".into()]));
    assert!(store.ids("colors").unwrap().is_empty());

    let listing: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(listing, vec!["other".to_string()]);

    assert!(store.clean("colors").unwrap().is_empty());
}

#[test]
fn test_move_record() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    store.put("inbox", "msg1", json!({"body": "hi"})).unwrap();
    store.put("inbox", "msg2", json!({"body": "yo"})).unwrap();

    assert_eq!(store.move_records("inbox", "msg1", "archive").unwrap(), vec!["msg1".to_string()]);
    assert_eq!(store.get("inbox", "msg1").unwrap(), None);
    assert_eq!(store.get("archive", "msg1").unwrap(), Some(json!({"body": "hi"})));
    assert_eq!(store.get("inbox", "msg2").unwrap(), Some(json!({"body": "yo"})));

    assert!(store.move_records("inbox", "ghost", "archive").unwrap().is_empty());
    assert_eq!(store.ids("archive").unwrap(), vec!["msg1".to_string()]);
}

#[test]
fn test_base_dir_is_created_lazily() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("deep").join("base");
    let store = Store::new(&base).unwrap();
    assert!(!base.exists());

    store.put("t", "a", json!(1)).unwrap();
    assert!(base.join("t").join("a.json").is_file());
}
