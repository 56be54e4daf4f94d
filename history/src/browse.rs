//! Listing used by the history manager when opened from a page.

use std::ops::ControlFlow;

use crate::error::Result;
use crate::store::EntryStore;
use crate::types::FieldEntry;

/// Entries relevant to a page, most recently used first.
///
/// An entry is kept when its name is empty, when its name is one of the
/// page's `fields`, or when it was captured on `host`. `None` for `fields`
/// lists everything.
pub fn entries_for_page(
    store: &dyn EntryStore,
    fields: Option<&[String]>,
    host: Option<&str>,
) -> Result<Vec<FieldEntry>> {
    let mut out = Vec::new();
    store.scan_by_recency(&mut |entry| {
        let keep = match fields {
            None => true,
            Some(fields) => {
                entry.name.is_empty()
                    || fields.iter().any(|f| f == &entry.name)
                    || host.is_some_and(|h| h == entry.host)
            }
        };
        if keep {
            out.push(entry);
        }
        ControlFlow::Continue(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::jsonl::JsonlEntryStore;
    use crate::types::FieldKind;

    fn names(entries: &[FieldEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn filters_to_page_fields_and_host() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlEntryStore::new(dir.path().join("h.jsonl"));
        for (host, name, at) in [
            ("a.com", "comment", 1),
            ("b.com", "comment", 2),
            ("b.com", "", 3),
            ("b.com", "bio", 4),
            ("a.com", "signature", 5),
        ] {
            store
                .insert(FieldEntry::new(host, name, FieldKind::Textarea, "v", at))
                .unwrap();
        }

        let all = entries_for_page(&store, None, Some("a.com")).unwrap();
        assert_eq!(names(&all), vec!["signature", "bio", "", "comment", "comment"]);

        let fields = vec!["comment".to_string()];
        let page = entries_for_page(&store, Some(fields.as_slice()), Some("a.com")).unwrap();
        assert_eq!(names(&page), vec!["signature", "", "comment", "comment"]);

        let no_host = entries_for_page(&store, Some(fields.as_slice()), None).unwrap();
        assert_eq!(names(&no_host), vec!["", "comment", "comment"]);
    }
}
