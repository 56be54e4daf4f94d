use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::config::HistoryConfig;
use crate::error::Result;
use crate::store::EntryStore;
use crate::store::jsonl::JsonlEntryStore;
use crate::store::parse_import_line;
use crate::types::EntryId;
use crate::types::FieldEntry;

#[cfg(feature = "sqlite")]
use crate::store::sqlite::SqliteEntryStore;

pub const JSONL_FILE: &str = "history.jsonl";
pub const DB_FILE: &str = "history.db";

/// Backend selection for entry persistence. `Sqlite` falls back to JSONL
/// when the `sqlite` feature is not compiled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Jsonl,
    Sqlite,
}

impl Backend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Some(Backend::Jsonl),
            "sqlite" => Some(Backend::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Jsonl => "jsonl",
            Backend::Sqlite => "sqlite",
        }
    }

    /// The backend actually used once compiled-in features are considered.
    pub fn effective(self) -> Self {
        if self == Backend::Sqlite && !cfg!(feature = "sqlite") {
            tracing::warn!("sqlite backend not compiled in, using jsonl");
            return Backend::Jsonl;
        }
        self
    }
}

pub fn jsonl_path(config: &HistoryConfig, base_dir: &Path) -> PathBuf {
    config
        .jsonl_path
        .clone()
        .unwrap_or_else(|| base_dir.join(JSONL_FILE))
}

pub fn db_path(config: &HistoryConfig, base_dir: &Path) -> PathBuf {
    config
        .db_path
        .clone()
        .unwrap_or_else(|| base_dir.join(DB_FILE))
}

/// Open the store selected by `config`, with files under `base_dir` unless
/// the config names explicit paths.
pub fn open_store(config: &HistoryConfig, base_dir: &Path) -> Result<Box<dyn EntryStore>> {
    Ok(match config.backend.effective() {
        Backend::Jsonl => Box::new(JsonlEntryStore::new(jsonl_path(config, base_dir))),
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            let path = db_path(config, base_dir);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            Box::new(SqliteEntryStore::new(path))
        }
        #[cfg(not(feature = "sqlite"))]
        Backend::Sqlite => Box::new(JsonlEntryStore::new(jsonl_path(config, base_dir))),
    })
}

/// Rewrite a JSONL file into `output`, dropping blank and invalid lines and
/// keeping only the last line seen for each id. Entries come out in id
/// order. Returns `(lines read, entries written)`.
pub fn compact_jsonl(input: &Path, output: &Path) -> Result<(usize, usize)> {
    let data = match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((0, 0)),
        Err(e) => return Err(e.into()),
    };
    let mut read = 0usize;
    let mut by_id: BTreeMap<EntryId, FieldEntry> = BTreeMap::new();
    for line in data.lines() {
        read += 1;
        match parse_import_line(line) {
            Ok(Some(entry)) => {
                by_id.insert(entry.id, entry);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("compact: dropping line {read}: {e}"),
        }
    }
    let mut out = String::new();
    for entry in by_id.values() {
        out.push_str(&serde_json::to_string(entry)?);
        out.push('\n');
    }
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(output, out)?;
    Ok((read, by_id.len()))
}

/// Import every entry of a JSONL file into a SQLite database, keeping ids.
/// Returns the number of imported rows.
#[cfg(feature = "sqlite")]
pub fn migrate_jsonl_to_sqlite(jsonl_path: &Path, sqlite_path: &Path) -> Result<usize> {
    let mut file = std::fs::File::open(jsonl_path)?;
    if let Some(dir) = sqlite_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    SqliteEntryStore::new(sqlite_path).import(&mut file)
}

#[cfg(not(feature = "sqlite"))]
pub fn migrate_jsonl_to_sqlite(_jsonl_path: &Path, _sqlite_path: &Path) -> Result<usize> {
    Err(crate::error::HistoryError::StoreUnavailable(
        "sqlite backend not compiled; enable with `--features fhc-history/sqlite`".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_names() {
        assert_eq!(Backend::parse("SQLite"), Some(Backend::Sqlite));
        assert_eq!(Backend::parse(" jsonl "), Some(Backend::Jsonl));
        assert_eq!(Backend::parse("csv"), None);
        assert_eq!(Backend::Sqlite.as_str(), "sqlite");
    }

    #[test]
    fn compact_keeps_last_line_per_id() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out").join("history.jsonl");
        let first = FieldEntry {
            id: EntryId(2),
            ..FieldEntry::new("a.com", "note", crate::types::FieldKind::Textarea, "old", 10)
        };
        let second = FieldEntry {
            value: "new".to_string(),
            ..first.clone()
        };
        let other = FieldEntry {
            id: EntryId(1),
            ..FieldEntry::new("b.com", "msg", crate::types::FieldKind::Html, "x", 5)
        };
        let text = format!(
            "{}\n\nnot json\n{}\n{}\n",
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&other).unwrap(),
            serde_json::to_string(&second).unwrap(),
        );
        std::fs::write(&input, text).unwrap();

        let (read, written) = compact_jsonl(&input, &output).unwrap();
        assert_eq!((read, written), (5, 2));
        let out = std::fs::read_to_string(&output).unwrap();
        let entries: Vec<FieldEntry> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries, vec![other, second]);
    }

    #[test]
    fn compact_of_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        assert_eq!(compact_jsonl(&dir.path().join("nope"), &out).unwrap(), (0, 0));
        assert!(!out.exists());
    }
}
