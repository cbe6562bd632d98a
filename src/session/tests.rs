use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;
use time::macros::datetime;

use super::*;

/// Store whose clock advances one second per call.
fn ticking_store() -> SqliteSessionStore {
    let base = datetime!(2024-03-01 12:00 UTC).unix_timestamp();
    let tick = Arc::new(AtomicI64::new(0));
    SqliteSessionStore::open_in_memory()
        .unwrap()
        .with_clock(move || {
            let offset = tick.fetch_add(1, Ordering::SeqCst);
            OffsetDateTime::from_unix_timestamp(base + offset).unwrap()
        })
}

fn session(source: &str) -> NewSession {
    NewSession {
        source: source.to_string(),
        display_name: format!("{source} title"),
        audio_bytes: vec![1, 2, 3],
    }
}

fn sources(page: &SessionPage) -> Vec<&str> {
    page.summaries.iter().map(|s| s.source.as_str()).collect()
}

#[test]
fn added_sessions_round_trip_with_matching_timestamps() {
    let mut store = ticking_store();
    let stored = store.add_session(session("a.wav")).unwrap();
    assert_eq!(stored.created_at, stored.last_opened_at);
    let loaded = store.get_session("a.wav").unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert!(store.get_session("missing.wav").unwrap().is_none());
}

#[test]
fn reopening_moves_a_session_to_the_front() {
    let mut store = ticking_store();
    store.add_session(session("a.wav")).unwrap();
    store.add_session(session("b.wav")).unwrap();
    store.update_last_opened_at("a.wav").unwrap();
    store.update_last_opened_at("unknown.wav").unwrap();

    let page = store.get_session_summaries(10, None).unwrap();
    assert_eq!(sources(&page), ["a.wav", "b.wav"]);
    assert_eq!(page.total, 2);
    assert_eq!(page.next_cursor, None);
    let a = store.get_session("a.wav").unwrap().unwrap();
    assert!(a.last_opened_at > a.created_at);
}

#[test]
fn pages_follow_the_inclusive_cursor() {
    let mut store = ticking_store();
    for name in ["a", "b", "c", "d", "e"] {
        store.add_session(session(name)).unwrap();
    }
    let first = store.get_session_summaries(2, None).unwrap();
    assert_eq!(sources(&first), ["e", "d"]);
    assert_eq!(first.total, 5);

    let second = store.get_session_summaries(2, first.next_cursor).unwrap();
    assert_eq!(sources(&second), ["c", "b"]);

    let third = store.get_session_summaries(2, second.next_cursor).unwrap();
    assert_eq!(sources(&third), ["a"]);
    assert_eq!(third.next_cursor, None);
}

#[test]
fn adding_twice_replaces_the_payload() {
    let mut store = ticking_store();
    store.add_session(session("a.wav")).unwrap();
    let mut again = session("a.wav");
    again.audio_bytes = vec![9; 4];
    store.add_session(again).unwrap();
    let loaded = store.get_session("a.wav").unwrap().unwrap();
    assert_eq!(loaded.audio_bytes, vec![9; 4]);
    assert_eq!(store.get_session_summaries(5, None).unwrap().total, 1);
}

#[test]
fn records_convert_to_track_sources() {
    let mut store = ticking_store();
    let record = store.add_session(session("dir/loop.flac")).unwrap();
    let request = record.to_track_source();
    assert_eq!(&*request.bytes, &[1, 2, 3]);
    assert_eq!(request.display_name, "dir/loop.flac title");
    assert_eq!(request.extension(), Some("flac"));
}

#[test]
fn file_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join(SESSION_DB_FILE_NAME);
    {
        let mut store = SqliteSessionStore::open(&path).unwrap();
        store.add_session(session("a.wav")).unwrap();
    }
    let store = SqliteSessionStore::open(&path).unwrap();
    assert!(store.get_session("a.wav").unwrap().is_some());
}
