use std::cmp::Ordering;
use std::io::Write as _;
use std::ops::ControlFlow;

use crate::error::HistoryError;
use crate::error::Result;
use crate::types::EntryId;
use crate::types::FieldEntry;
use crate::types::FieldKind;
use crate::types::Micros;

/// Cursor callback for ordered scans. Returning `ControlFlow::Break` stops
/// the scan before the index is exhausted.
pub type Visitor<'a> = dyn FnMut(FieldEntry) -> ControlFlow<()> + 'a;

/// Durable collection of captured form field values.
pub trait EntryStore: Send + Sync {
    /// Entries captured on `host`, most recently used first, ties broken by
    /// field name.
    fn scan_by_host(&self, host: &str, visit: &mut Visitor<'_>) -> Result<()>;

    /// All entries, most recently used first.
    fn scan_by_recency(&self, visit: &mut Visitor<'_>) -> Result<()>;

    fn get(&self, id: EntryId) -> Result<FieldEntry>;

    /// Store a new entry and return the id assigned to it. The id carried by
    /// `entry` is ignored.
    fn insert(&self, entry: FieldEntry) -> Result<EntryId>;

    fn update(&self, entry: &FieldEntry) -> Result<()>;

    fn delete(&self, id: EntryId) -> Result<()>;

    /// Upsert JSONL entries by id; returns the number of lines imported.
    fn import(&self, input: &mut dyn std::io::Read) -> Result<usize>;

    fn stats(&self) -> Result<serde_json::Value>;

    /// Every entry in recency order.
    fn list(&self) -> Result<Vec<FieldEntry>> {
        let mut out = Vec::new();
        self.scan_by_recency(&mut |entry| {
            out.push(entry);
            ControlFlow::Continue(())
        })?;
        Ok(out)
    }

    /// Write every entry as one JSON line, in recency order.
    fn export(&self, out: &mut dyn std::io::Write) -> Result<()> {
        for entry in self.list()? {
            let line = serde_json::to_string(&entry)?;
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Capture path: bump an identical entry or insert a new one.
    fn record_capture(
        &self,
        host: &str,
        name: &str,
        kind: FieldKind,
        value: &str,
        now: Micros,
    ) -> Result<EntryId> {
        let mut existing = None;
        self.scan_by_host(host, &mut |entry| {
            if entry.name == name && entry.kind == kind && entry.value == value {
                existing = Some(entry);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        match existing {
            Some(mut entry) => {
                entry.touch(now);
                self.update(&entry)?;
                Ok(entry.id)
            }
            None => self.insert(FieldEntry::new(host, name, kind, value, now)),
        }
    }
}

impl<T: EntryStore + ?Sized> EntryStore for Box<T> {
    fn scan_by_host(&self, host: &str, visit: &mut Visitor<'_>) -> Result<()> {
        (**self).scan_by_host(host, visit)
    }

    fn scan_by_recency(&self, visit: &mut Visitor<'_>) -> Result<()> {
        (**self).scan_by_recency(visit)
    }

    fn get(&self, id: EntryId) -> Result<FieldEntry> {
        (**self).get(id)
    }

    fn insert(&self, entry: FieldEntry) -> Result<EntryId> {
        (**self).insert(entry)
    }

    fn update(&self, entry: &FieldEntry) -> Result<()> {
        (**self).update(entry)
    }

    fn delete(&self, id: EntryId) -> Result<()> {
        (**self).delete(id)
    }

    fn import(&self, input: &mut dyn std::io::Read) -> Result<usize> {
        (**self).import(input)
    }

    fn stats(&self) -> Result<serde_json::Value> {
        (**self).stats()
    }
}

/// Field names compare with ASCII case folded first, exact spelling breaks
/// ties. Matches SQLite's `NOCASE` collation, which leaves non-ASCII letters
/// alone.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.bytes().map(|c| c.to_ascii_lowercase()).collect::<Vec<u8>>();
    folded(a).cmp(&folded(b)).then_with(|| a.cmp(b))
}

/// Order of the host index: `last_used` descending, then name.
pub(crate) fn host_order(a: &FieldEntry, b: &FieldEntry) -> Ordering {
    b.last_used
        .cmp(&a.last_used)
        .then_with(|| compare_names(&a.name, &b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order of the recency index: `last_used` descending, then insertion.
pub(crate) fn recency_order(a: &FieldEntry, b: &FieldEntry) -> Ordering {
    b.last_used.cmp(&a.last_used).then_with(|| a.id.cmp(&b.id))
}

pub(crate) fn stats_json(entries: &[FieldEntry]) -> serde_json::Value {
    let mut by_kind = serde_json::Map::new();
    let mut hosts = std::collections::BTreeSet::new();
    let mut sensitive = 0usize;
    for entry in entries {
        let counter = by_kind
            .entry(entry.kind.as_str().to_string())
            .or_insert(serde_json::json!(0));
        *counter = serde_json::json!(counter.as_u64().unwrap_or(0) + 1);
        hosts.insert(entry.host.as_str());
        if entry.is_sensitive() {
            sensitive += 1;
        }
    }
    serde_json::json!({
        "total": entries.len(),
        "sensitive": sensitive,
        "by_kind": by_kind,
        "hosts": hosts.len(),
    })
}

pub(crate) fn parse_import_line(line: &str) -> Result<Option<FieldEntry>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let entry: FieldEntry = serde_json::from_str(line)?;
    if entry.last_used < entry.first_used {
        return Err(HistoryError::InvalidInput(format!(
            "entry {} was last used before it was first used",
            entry.id
        )));
    }
    Ok(Some(entry))
}

pub mod jsonl;
pub mod sqlite;
