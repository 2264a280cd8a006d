// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use serde_json::json;
use tempfile::TempDir;

fn action_at(ms: i64, endpoint: &str) -> QueuedAction {
    QueuedAction {
        id: format!("action-{ms}-{endpoint}"),
        method: Method::Post,
        endpoint: endpoint.to_string(),
        body: Some(json!({"at": ms})),
        enqueued_at: Utc.timestamp_millis_opt(ms).single().unwrap(),
        retry_count: 0,
    }
}

#[test]
fn store_insert_and_read_back() {
    let store = ActionStore::open_in_memory().unwrap();
    assert!(store.is_empty().unwrap());

    let action = QueuedAction::new(Method::Post, "/api/tickets", Some(json!({"title": "t"})));
    store.insert(&action).unwrap();

    let all = store.all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], action);
}

#[test]
fn store_round_trips_nanosecond_timestamps() {
    let store = ActionStore::open_in_memory().unwrap();

    let mut action = action_at(1000, "/a");
    action.enqueued_at += chrono::Duration::nanoseconds(185_363_586);
    store.insert(&action).unwrap();

    assert_eq!(store.all().unwrap()[0].enqueued_at, action.enqueued_at);
}

#[test]
fn store_orders_by_enqueued_at_regardless_of_insert_order() {
    let store = ActionStore::open_in_memory().unwrap();

    store.insert(&action_at(3000, "/c")).unwrap();
    store.insert(&action_at(1000, "/a")).unwrap();
    store.insert(&action_at(2000, "/b")).unwrap();

    let endpoints: Vec<String> = store
        .all()
        .unwrap()
        .into_iter()
        .map(|a| a.endpoint)
        .collect();
    assert_eq!(endpoints, vec!["/a", "/b", "/c"]);
}

#[test]
fn store_breaks_timestamp_ties_by_insertion_order() {
    let store = ActionStore::open_in_memory().unwrap();

    let mut first = action_at(1000, "/first");
    let mut second = action_at(1000, "/second");
    first.id = "same-ts-1".into();
    second.id = "same-ts-2".into();

    store.insert(&first).unwrap();
    store.insert(&second).unwrap();

    let all = store.all().unwrap();
    assert_eq!(all[0].endpoint, "/first");
    assert_eq!(all[1].endpoint, "/second");
}

#[test]
fn store_remove_is_idempotent() {
    let store = ActionStore::open_in_memory().unwrap();
    let action = action_at(1000, "/a");
    store.insert(&action).unwrap();

    assert!(store.remove(&action.id).unwrap());
    assert!(!store.remove(&action.id).unwrap());
    assert!(store.is_empty().unwrap());
}

#[test]
fn store_bump_retry_increments() {
    let store = ActionStore::open_in_memory().unwrap();
    let action = action_at(1000, "/a");
    store.insert(&action).unwrap();

    assert_eq!(store.bump_retry(&action.id).unwrap(), 1);
    assert_eq!(store.bump_retry(&action.id).unwrap(), 2);

    let all = store.all().unwrap();
    assert_eq!(all[0].retry_count, 2);
}

#[test]
fn store_bump_retry_missing_action_errors() {
    let store = ActionStore::open_in_memory().unwrap();
    assert!(matches!(
        store.bump_retry("no-such-id"),
        Err(Error::CorruptedData(_))
    ));
}

#[test]
fn store_clear_removes_everything() {
    let store = ActionStore::open_in_memory().unwrap();
    store.insert(&action_at(1000, "/a")).unwrap();
    store.insert(&action_at(2000, "/b")).unwrap();

    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.is_empty().unwrap());
}

#[test]
fn store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queue.db");

    {
        let store = ActionStore::open(&path).unwrap();
        store.insert(&action_at(1000, "/a")).unwrap();
        store.insert(&action_at(2000, "/b")).unwrap();
    }

    let store = ActionStore::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    let all = store.all().unwrap();
    assert_eq!(all[0].endpoint, "/a");
    assert_eq!(all[1].endpoint, "/b");
}

#[test]
fn store_rejects_newer_schema_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queue.db");

    {
        let store = ActionStore::open(&path).unwrap();
        store
            .conn
            .execute_batch("PRAGMA user_version = 99;")
            .unwrap();
    }

    assert!(matches!(
        ActionStore::open(&path),
        Err(Error::CorruptedData(_))
    ));
}

#[test]
fn store_preserves_null_body() {
    let store = ActionStore::open_in_memory().unwrap();
    let action = QueuedAction::new(Method::Delete, "/api/tickets/5", None);
    store.insert(&action).unwrap();

    let all = store.all().unwrap();
    assert!(all[0].body.is_none());
    assert_eq!(all[0].method, Method::Delete);
}
