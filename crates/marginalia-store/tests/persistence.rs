use marginalia_core::offsets::materialize_region;
use marginalia_core::{EngineConfig, Highlight, HighlightColor, ReaderSession, Surface, TextIndex};
use marginalia_store::{
    AnnotationStore, FileStore, KeyValueStore, MemoryClipboard, MemoryStore, StoreError,
    attach_autosave, import_from_clipboard, import_into,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn commit(session: &mut ReaderSession, start: usize, end: usize, color: HighlightColor) -> String {
    let index = TextIndex::build(session.surface());
    let region = materialize_region(&index, start, end).unwrap();
    session.capture_selection(&region.as_selection(), None).unwrap();
    session.commit_proposal(color).unwrap()
}

#[test]
fn test_import_of_non_array_keeps_list() {
    let mut list = vec![
        Highlight::new("a", 0, 3, HighlightColor::Gold, "The"),
        Highlight::new("b", 4, 9, HighlightColor::Rose, "quick"),
    ];
    let before = list.clone();

    let err = import_into(r#"{"not":"an array"}"#, &mut list).unwrap_err();
    assert!(matches!(err, StoreError::NotAnArray));
    assert_eq!(list, before);

    let mut clipboard = MemoryClipboard::with_text(r#"{"not":"an array"}"#);
    assert!(import_from_clipboard(&mut clipboard).is_err());
}

#[test]
fn test_unknown_fields_survive_load_then_save() {
    let raw = r#"[{"id":"a","start":0,"end":3,"color":"mint","text":"The","note":"n","createdAt":"2024-01-01","tags":["x"]}]"#;
    let mut backend = MemoryStore::new();
    backend.set("marginalia:highlights:doc", raw).unwrap();
    let mut store = AnnotationStore::new(backend);

    let loaded = store.load("doc");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].note.as_deref(), Some("n"));
    store.save("doc", &loaded).unwrap();

    let written = store.backend().get("marginalia:highlights:doc").unwrap().unwrap();
    let before: serde_json::Value = serde_json::from_str(raw).unwrap();
    let after: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(after, before);
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let list = vec![Highlight::new("a", 4, 9, HighlightColor::Violet, "quick")];

    let mut store = AnnotationStore::new(FileStore::new(dir.path()));
    store.save("book/ch1", &list).unwrap();

    let reopened = AnnotationStore::new(FileStore::new(dir.path()));
    assert_eq!(reopened.load("book/ch1"), list);
    assert!(reopened.load("book/ch2").is_empty());
}

#[test]
fn test_autosave_follows_session() {
    let store = Arc::new(Mutex::new(AnnotationStore::new(MemoryStore::new())));
    let surface = Surface::from_paragraphs(&["The quick brown fox."]);
    let mut session = ReaderSession::new(surface, EngineConfig::default());
    attach_autosave(&mut session, store.clone(), "doc", |err| panic!("save failed: {err}"));

    let id = commit(&mut session, 4, 9, HighlightColor::Gold);
    assert_eq!(store.lock().unwrap().load("doc"), session.highlights().to_vec());

    session.set_note(&id, Some("adjective".to_string())).unwrap();
    let saved = store.lock().unwrap().load("doc");
    assert_eq!(saved[0].note.as_deref(), Some("adjective"));

    session.clear_highlights();
    assert!(store.lock().unwrap().load("doc").is_empty());
}

#[test]
fn test_quota_failure_keeps_session_state() {
    let store = Arc::new(Mutex::new(AnnotationStore::new(MemoryStore::with_quota(64))));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = failures.clone();

    let surface = Surface::from_paragraphs(&["The quick brown fox jumps over the lazy dog."]);
    let mut session = ReaderSession::new(surface, EngineConfig::default());
    attach_autosave(&mut session, store.clone(), "doc", move |err| {
        sink.lock().unwrap().push(err.to_string());
    });

    commit(&mut session, 4, 9, HighlightColor::Gold);
    commit(&mut session, 10, 15, HighlightColor::Mint);

    assert_eq!(session.highlights().len(), 2);
    let failures = failures.lock().unwrap();
    assert!(!failures.is_empty());
    assert!(failures[0].contains("quota"));
    assert!(store.lock().unwrap().load("doc").is_empty());
}

#[test]
fn test_unreadable_record_does_not_wipe_saved_list() {
    let raw = r#"[
        {"id":"a","start":0,"end":3,"color":"gold","text":"The"},
        {"id":"b","start":4,"end":9,"color":"mint","text":"quick"},
        {"id":"c","start":10,"end":15,"color":"teal","text":"brown"}
    ]"#;
    let mut backend = MemoryStore::new();
    backend.set("marginalia:highlights:doc", raw).unwrap();
    let store = Arc::new(Mutex::new(AnnotationStore::new(backend)));

    let loaded = store.lock().unwrap().load("doc");
    assert_eq!(loaded.len(), 2);

    let surface = Surface::from_paragraphs(&["The quick brown fox."]);
    let mut session = ReaderSession::new(surface, EngineConfig::default()).with_highlights(loaded);
    attach_autosave(&mut session, store.clone(), "doc", |err| panic!("save failed: {err}"));
    commit(&mut session, 16, 19, HighlightColor::Rose);

    let ids: Vec<String> = store.lock().unwrap().load("doc").into_iter().map(|h| h.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&"a".to_string()));
    assert!(ids.contains(&"b".to_string()));
}
