use super::*;

#[cfg(feature = "sqlite")]
use std::io::Read as _;

#[cfg(feature = "sqlite")]
use rusqlite::Connection;
#[cfg(feature = "sqlite")]
use rusqlite::OptionalExtension;
#[cfg(feature = "sqlite")]
use rusqlite::params;

#[cfg(feature = "sqlite")]
const COLUMNS: &str = "id, host, name, kind, value, first_used, last_used, use_count, source";

#[cfg(feature = "sqlite")]
fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        CREATE TABLE IF NOT EXISTS field_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            host TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            value TEXT NOT NULL,
            first_used INTEGER NOT NULL,
            last_used INTEGER NOT NULL,
            use_count INTEGER NOT NULL,
            source TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_entries_host
            ON field_entries(host, last_used DESC, name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_entries_last ON field_entries(last_used DESC);
        "#,
    )?;
    Ok(())
}

#[cfg(feature = "sqlite")]
fn open_conn(path: &std::path::Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| HistoryError::StoreUnavailable(format!("{}: {e}", path.display())))?;
    init_db(&conn)?;
    Ok(conn)
}

#[cfg(feature = "sqlite")]
fn id_to_sql(id: EntryId) -> Result<i64> {
    i64::try_from(id.0).map_err(|_| HistoryError::InvalidInput(format!("id out of range: {id}")))
}

#[cfg(feature = "sqlite")]
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<FieldEntry> {
    use rusqlite::types::Type;
    let raw_id: i64 = row.get(0)?;
    let id = u64::try_from(raw_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e))
    })?;
    let kind: String = row.get(3)?;
    Ok(FieldEntry {
        id: EntryId(id),
        host: row.get(1)?,
        name: row.get(2)?,
        kind: FieldKind::parse(&kind),
        value: row.get(4)?,
        first_used: row.get(5)?,
        last_used: row.get(6)?,
        use_count: u32::try_from(row.get::<_, i64>(7)?).unwrap_or(u32::MAX),
        source: row.get(8)?,
    })
}

#[cfg(feature = "sqlite")]
fn stream_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    visit: &mut Visitor<'_>,
) -> Result<()> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        if visit(row_to_entry(row)?).is_break() {
            break;
        }
    }
    Ok(())
}

/// SQLite-backed entry store with real host and recency indexes. Scans
/// stream rows and stop reading as soon as the visitor breaks.
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone)]
pub struct SqliteEntryStore {
    path: std::path::PathBuf,
}

#[cfg(feature = "sqlite")]
impl SqliteEntryStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl EntryStore for SqliteEntryStore {
    fn scan_by_host(&self, host: &str, visit: &mut Visitor<'_>) -> Result<()> {
        let conn = open_conn(&self.path)?;
        let sql = format!(
            "SELECT {COLUMNS} FROM field_entries
             WHERE host = ?1
             ORDER BY last_used DESC, name COLLATE NOCASE ASC, name ASC, id ASC"
        );
        stream_rows(&conn, &sql, params![host], visit)
    }

    fn scan_by_recency(&self, visit: &mut Visitor<'_>) -> Result<()> {
        let conn = open_conn(&self.path)?;
        let sql = format!("SELECT {COLUMNS} FROM field_entries ORDER BY last_used DESC, id ASC");
        stream_rows(&conn, &sql, [], visit)
    }

    fn get(&self, id: EntryId) -> Result<FieldEntry> {
        let conn = open_conn(&self.path)?;
        let sql = format!("SELECT {COLUMNS} FROM field_entries WHERE id = ?1");
        conn.query_row(&sql, params![id_to_sql(id)?], row_to_entry)
            .optional()?
            .ok_or(HistoryError::NotFound(id))
    }

    fn insert(&self, entry: FieldEntry) -> Result<EntryId> {
        let conn = open_conn(&self.path)?;
        conn.execute(
            "INSERT INTO field_entries (
                    host, name, kind, value, first_used, last_used, use_count, source
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.host,
                entry.name,
                entry.kind.as_str(),
                entry.value,
                entry.first_used,
                entry.last_used,
                i64::from(entry.use_count),
                entry.source,
            ],
        )?;
        let rowid = conn.last_insert_rowid();
        u64::try_from(rowid)
            .map(EntryId)
            .map_err(|_| HistoryError::StoreUnavailable(format!("negative rowid {rowid}")))
    }

    fn update(&self, entry: &FieldEntry) -> Result<()> {
        let conn = open_conn(&self.path)?;
        let n = conn.execute(
            "UPDATE field_entries SET
                host=?2, name=?3, kind=?4, value=?5,
                first_used=?6, last_used=?7, use_count=?8, source=?9
             WHERE id=?1",
            params![
                id_to_sql(entry.id)?,
                entry.host,
                entry.name,
                entry.kind.as_str(),
                entry.value,
                entry.first_used,
                entry.last_used,
                i64::from(entry.use_count),
                entry.source,
            ],
        )?;
        if n == 0 {
            return Err(HistoryError::NotFound(entry.id));
        }
        Ok(())
    }

    fn delete(&self, id: EntryId) -> Result<()> {
        let conn = open_conn(&self.path)?;
        let n = conn.execute(
            "DELETE FROM field_entries WHERE id=?1",
            params![id_to_sql(id)?],
        )?;
        if n == 0 {
            return Err(HistoryError::NotFound(id));
        }
        Ok(())
    }

    fn import(&self, input: &mut dyn std::io::Read) -> Result<usize> {
        let mut data = String::new();
        input.read_to_string(&mut data)?;
        let mut conn = open_conn(&self.path)?;
        let tx = conn.transaction()?;
        let mut count = 0usize;
        for line in data.lines() {
            let Some(entry) = parse_import_line(line)? else {
                continue;
            };
            tx.execute(
                "INSERT INTO field_entries (
                        id, host, name, kind, value, first_used, last_used, use_count, source
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                        host=excluded.host,
                        name=excluded.name,
                        kind=excluded.kind,
                        value=excluded.value,
                        first_used=excluded.first_used,
                        last_used=excluded.last_used,
                        use_count=excluded.use_count,
                        source=excluded.source",
                params![
                    id_to_sql(entry.id)?,
                    entry.host,
                    entry.name,
                    entry.kind.as_str(),
                    entry.value,
                    entry.first_used,
                    entry.last_used,
                    i64::from(entry.use_count),
                    entry.source,
                ],
            )?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    fn stats(&self) -> Result<serde_json::Value> {
        let conn = open_conn(&self.path)?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM field_entries", [], |r| r.get(0))?;
        let sensitive: i64 = conn.query_row(
            "SELECT COUNT(*) FROM field_entries WHERE kind='input'",
            [],
            |r| r.get(0),
        )?;
        let hosts: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT host) FROM field_entries",
            [],
            |r| r.get(0),
        )?;
        let by_kind = {
            let mut m = serde_json::Map::new();
            let mut stmt =
                conn.prepare("SELECT kind, COUNT(*) FROM field_entries GROUP BY kind")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let kind: String = row.get(0)?;
                let n: i64 = row.get(1)?;
                m.insert(kind, serde_json::json!(n));
            }
            serde_json::Value::Object(m)
        };
        Ok(serde_json::json!({
            "total": total,
            "sensitive": sensitive,
            "by_kind": by_kind,
            "hosts": hosts,
        }))
    }
}
