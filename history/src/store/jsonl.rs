use std::io::Read as _;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use super::*;

/// JSONL-backed entry store. Each line encodes one `FieldEntry`; the
/// highest id ever assigned is kept in a `.seq` file next to it so deleted
/// ids are never handed out again.
#[derive(Debug, Clone)]
pub struct JsonlEntryStore {
    path: PathBuf,
}

impl JsonlEntryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seq_path(&self) -> PathBuf {
        self.path.with_extension("seq")
    }

    fn read_all(&self) -> Result<Vec<FieldEntry>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(HistoryError::StoreUnavailable(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        let mut entries = Vec::new();
        for (lineno, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FieldEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::debug!("history: skipping line {}: {e}", lineno + 1),
            }
        }
        Ok(entries)
    }

    fn write_all(&self, entries: &[FieldEntry]) -> Result<()> {
        let mut out = String::new();
        for entry in entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        self.ensure_dir()?;
        std::fs::write(&self.path, out)?;
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn read_seq(&self) -> u64 {
        std::fs::read_to_string(self.seq_path())
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    fn write_seq(&self, seq: u64) -> Result<()> {
        self.ensure_dir()?;
        std::fs::write(self.seq_path(), seq.to_string())?;
        Ok(())
    }

    fn high_water(&self, entries: &[FieldEntry]) -> u64 {
        let max_id = entries.iter().map(|e| e.id.0).max().unwrap_or(0);
        self.read_seq().max(max_id)
    }

    fn scan_sorted(
        mut entries: Vec<FieldEntry>,
        order: fn(&FieldEntry, &FieldEntry) -> std::cmp::Ordering,
        visit: &mut Visitor<'_>,
    ) {
        entries.sort_by(order);
        for entry in entries {
            if visit(entry).is_break() {
                break;
            }
        }
    }
}

impl EntryStore for JsonlEntryStore {
    fn scan_by_host(&self, host: &str, visit: &mut Visitor<'_>) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.retain(|e| e.host == host);
        Self::scan_sorted(entries, host_order, visit);
        Ok(())
    }

    fn scan_by_recency(&self, visit: &mut Visitor<'_>) -> Result<()> {
        Self::scan_sorted(self.read_all()?, recency_order, visit);
        Ok(())
    }

    fn get(&self, id: EntryId) -> Result<FieldEntry> {
        self.read_all()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(HistoryError::NotFound(id))
    }

    fn insert(&self, mut entry: FieldEntry) -> Result<EntryId> {
        let entries = self.read_all()?;
        let id = EntryId(self.high_water(&entries) + 1);
        entry.id = id;
        self.write_seq(id.0)?;

        // append-only add
        self.ensure_dir()?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(line.as_bytes())?;
        f.flush()?;
        Ok(id)
    }

    fn update(&self, entry: &FieldEntry) -> Result<()> {
        let mut entries = self.read_all()?;
        let slot = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or(HistoryError::NotFound(entry.id))?;
        *slot = entry.clone();
        self.write_all(&entries)
    }

    fn delete(&self, id: EntryId) -> Result<()> {
        let mut entries = self.read_all()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(HistoryError::NotFound(id));
        }
        // Pin the high-water mark before the max id can disappear.
        let seq = self.high_water(&entries).max(id.0);
        self.write_seq(seq)?;
        self.write_all(&entries)
    }

    fn import(&self, input: &mut dyn std::io::Read) -> Result<usize> {
        let mut data = String::new();
        input.read_to_string(&mut data)?;
        let mut entries = self.read_all()?;
        let mut count = 0usize;
        for line in data.lines() {
            let Some(entry) = parse_import_line(line)? else {
                continue;
            };
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(slot) => *slot = entry,
                None => entries.push(entry),
            }
            count += 1;
        }
        let seq = self.high_water(&entries);
        self.write_all(&entries)?;
        self.write_seq(seq)?;
        Ok(count)
    }

    fn stats(&self) -> Result<serde_json::Value> {
        Ok(stats_json(&self.read_all()?))
    }
}
