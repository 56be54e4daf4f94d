use std::ops::ControlFlow;

use fhc_history::EntryStore;
use fhc_history::HistoryConfig;
use fhc_history::HistoryError;
use fhc_history::factory::Backend;
use fhc_history::factory::open_store;
use fhc_history::types::EntryId;
use fhc_history::types::FieldEntry;
use fhc_history::types::FieldKind;
use pretty_assertions::assert_eq;

fn backends() -> Vec<Backend> {
    #[cfg(feature = "sqlite")]
    {
        vec![Backend::Jsonl, Backend::Sqlite]
    }
    #[cfg(not(feature = "sqlite"))]
    {
        vec![Backend::Jsonl]
    }
}

fn open(be: Backend, dir: &std::path::Path) -> Box<dyn EntryStore> {
    let config = HistoryConfig {
        backend: be,
        ..HistoryConfig::default()
    };
    open_store(&config, dir).unwrap()
}

fn entry(host: &str, name: &str, kind: FieldKind, value: &str, at: i64) -> FieldEntry {
    FieldEntry::new(host, name, kind, value, at)
}

fn host_names(store: &dyn EntryStore, host: &str) -> Vec<String> {
    let mut names = Vec::new();
    store
        .scan_by_host(host, &mut |e| {
            names.push(e.name);
            ControlFlow::Continue(())
        })
        .unwrap();
    names
}

#[test]
fn crud_and_stats() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());

        let a = store
            .insert(entry("a.com", "msg", FieldKind::Textarea, "hello", 100))
            .unwrap();
        let b = store
            .insert(entry("b.com", "pw", FieldKind::Input, "secret", 200))
            .unwrap();
        assert!(b > a, "{be:?}");
        assert_eq!(store.get(a).unwrap().value, "hello");

        let mut updated = store.get(a).unwrap();
        updated.value = "hello again".to_string();
        store.update(&updated).unwrap();
        assert_eq!(store.get(a).unwrap().value, "hello again");

        let stats = store.stats().unwrap();
        assert_eq!(stats["total"], 2);
        assert_eq!(stats["sensitive"], 1);
        assert_eq!(stats["hosts"], 2);
        assert_eq!(stats["by_kind"]["textarea"], 1);
        assert_eq!(stats["by_kind"]["input"], 1);

        store.delete(a).unwrap();
        assert!(matches!(store.get(a), Err(HistoryError::NotFound(id)) if id == a));
        assert!(matches!(store.delete(a), Err(HistoryError::NotFound(_))));
        let mut ghost = updated.clone();
        ghost.id = EntryId(9_999);
        assert!(matches!(store.update(&ghost), Err(HistoryError::NotFound(_))));
    }
}

#[test]
fn ids_are_never_reused() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());
        store
            .insert(entry("a.com", "x", FieldKind::Html, "1", 1))
            .unwrap();
        let last = store
            .insert(entry("a.com", "y", FieldKind::Html, "2", 2))
            .unwrap();
        store.delete(last).unwrap();
        let next = store
            .insert(entry("a.com", "z", FieldKind::Html, "3", 3))
            .unwrap();
        assert!(next > last, "{be:?}: {next} reused after {last}");
    }
}

#[test]
fn host_scan_orders_by_recency_then_name() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());
        store
            .insert(entry("a.com", "beta", FieldKind::Textarea, "1", 10))
            .unwrap();
        store
            .insert(entry("a.com", "Alpha", FieldKind::Textarea, "2", 10))
            .unwrap();
        store
            .insert(entry("a.com", "gamma", FieldKind::Textarea, "3", 30))
            .unwrap();
        store
            .insert(entry("b.com", "other", FieldKind::Textarea, "4", 40))
            .unwrap();
        assert_eq!(host_names(store.as_ref(), "a.com"), vec!["gamma", "Alpha", "beta"]);
        assert!(host_names(store.as_ref(), "c.com").is_empty());
    }
}

#[test]
fn host_scan_folds_only_ascii_case() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());
        for name in ["éa", "Éb", "alpha"] {
            store
                .insert(entry("a.com", name, FieldKind::Textarea, "v", 10))
                .unwrap();
        }
        assert_eq!(
            host_names(store.as_ref(), "a.com"),
            vec!["alpha", "Éb", "éa"],
            "{be:?}"
        );
    }
}

#[test]
fn scans_stop_when_visitor_breaks() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());
        for i in 0..5 {
            store
                .insert(entry("a.com", "n", FieldKind::Div, &format!("v{i}"), i))
                .unwrap();
        }
        let mut seen = Vec::new();
        store
            .scan_by_recency(&mut |e| {
                seen.push(e.value);
                if seen.len() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(seen, vec!["v4", "v3"]);
    }
}

#[test]
fn export_then_import_into_fresh_store() {
    for be in backends() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = open(be, src_dir.path());
        src.insert(entry("a.com", "msg", FieldKind::Textarea, "one", 5))
            .unwrap();
        src.insert(entry("b.com", "bio", FieldKind::Html, "<b>two</b>", 9))
            .unwrap();
        let mut buf = Vec::new();
        src.export(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap().lines().count(), 2);

        let dst_dir = tempfile::tempdir().unwrap();
        let dst = open(be, dst_dir.path());
        assert_eq!(dst.import(&mut buf.as_slice()).unwrap(), 2);
        assert_eq!(dst.list().unwrap(), src.list().unwrap());

        // Re-import upserts instead of duplicating.
        assert_eq!(dst.import(&mut buf.as_slice()).unwrap(), 2);
        assert_eq!(dst.list().unwrap().len(), 2);

        let fresh = dst
            .insert(entry("c.com", "x", FieldKind::Div, "three", 10))
            .unwrap();
        assert!(src.list().unwrap().iter().all(|e| e.id < fresh));
    }
}

#[test]
fn import_rejects_entries_used_before_creation() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());
        let line = r#"{"id":3,"host":"a.com","name":"n","kind":"textarea","value":"v","first_used":50,"last_used":10,"use_count":1}"#;
        let err = store.import(&mut line.as_bytes()).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidInput(_)), "{be:?}: {err}");
    }
}

#[test]
fn record_capture_bumps_identical_entry() {
    for be in backends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(be, dir.path());
        let first = store
            .record_capture("a.com", "msg", FieldKind::Textarea, "hi", 100)
            .unwrap();
        let again = store
            .record_capture("a.com", "msg", FieldKind::Textarea, "hi", 300)
            .unwrap();
        assert_eq!(first, again);
        let e = store.get(first).unwrap();
        assert_eq!((e.use_count, e.first_used, e.last_used), (2, 100, 300));

        let other = store
            .record_capture("a.com", "msg", FieldKind::Textarea, "bye", 400)
            .unwrap();
        assert_ne!(other, first);
        assert_eq!(store.list().unwrap().len(), 2);
    }
}
