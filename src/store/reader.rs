use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Params, Row};
use tracing::{debug, warn};

use crate::entity::{core_data_timestamp, extract_tags, tag_matches, Note};
use crate::error::{BearError, Result};

pub const NOTE_TABLE: &str = "ZSFNOTE";
pub const TAG_TABLE: &str = "ZSFNOTETAG";

/// Columns of `ZSFNOTE` this reader depends on.
pub const NOTE_COLUMNS: &[&str] = &[
    "ZUNIQUEIDENTIFIER",
    "ZTITLE",
    "ZSUBTITLE",
    "ZTEXT",
    "ZPINNED",
    "ZARCHIVED",
    "ZTRASHED",
    "ZCREATIONDATE",
    "ZMODIFICATIONDATE",
];

const TAG_COLUMNS: &[&str] = &["ZTITLE"];

/// How long a read waits while Bear holds a write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

const SELECT_NOTES: &str = "SELECT ZUNIQUEIDENTIFIER, ZTITLE, ZSUBTITLE, ZTEXT, ZPINNED, \
     ZARCHIVED, ZTRASHED, ZCREATIONDATE, ZMODIFICATIONDATE FROM ZSFNOTE";

const ORDER_BY_MODIFIED: &str = "ORDER BY ZMODIFICATIONDATE DESC, ZUNIQUEIDENTIFIER ASC";

/// Read-only view of Bear's database.
///
/// Every call opens a fresh read-only connection, so results always reflect
/// what Bear has written so far and nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct NoteReader {
    path: PathBuf,
}

impl NoteReader {
    /// Open the database once to confirm it is reachable and has the
    /// expected shape.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = Self {
            path: path.to_path_buf(),
        };
        reader.connect()?;
        debug!(path = %path.display(), "Bear database verified");
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active notes: not archived, not trashed. Most recently modified first.
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let sql = format!(
            "{} WHERE ZUNIQUEIDENTIFIER IS NOT NULL AND ZARCHIVED = 0 AND ZTRASHED = 0 {}",
            SELECT_NOTES, ORDER_BY_MODIFIED
        );
        self.query_notes(&sql, [])
    }

    /// Archived notes that are not in the trash.
    pub fn list_archived(&self) -> Result<Vec<Note>> {
        let sql = format!(
            "{} WHERE ZUNIQUEIDENTIFIER IS NOT NULL AND ZARCHIVED = 1 AND ZTRASHED = 0 {}",
            SELECT_NOTES, ORDER_BY_MODIFIED
        );
        self.query_notes(&sql, [])
    }

    /// Active notes whose title or body contains `query`, ignoring case.
    pub fn search_text(&self, query: &str) -> Result<Vec<Note>> {
        if query.is_empty() {
            return Err(BearError::invalid("like", "Search text cannot be empty"));
        }

        // LIKE only folds ASCII case, so it can serve as a prefilter for ASCII
        // queries only.
        let candidates = if query.is_ascii() {
            let sql = format!(
                r"{} WHERE ZUNIQUEIDENTIFIER IS NOT NULL AND ZARCHIVED = 0 AND ZTRASHED = 0
                  AND (ZTITLE LIKE ?1 ESCAPE '\' OR ZTEXT LIKE ?1 ESCAPE '\') {}",
                SELECT_NOTES, ORDER_BY_MODIFIED
            );
            self.query_notes(&sql, params![like_pattern(query)])?
        } else {
            self.list_notes()?
        };

        Ok(candidates
            .into_iter()
            .filter(|note| note.contains_text(query))
            .collect())
    }

    /// Active notes tagged with `tag` or one of its nested children.
    /// An unused tag yields an empty list.
    pub fn get_by_tag(&self, tag: &str) -> Result<Vec<Note>> {
        let tag = normalize_tag(tag);
        if tag.is_empty() {
            return Err(BearError::invalid("tag", "Tag cannot be empty"));
        }

        let candidates = if tag.is_ascii() {
            let sql = format!(
                r"{} WHERE ZUNIQUEIDENTIFIER IS NOT NULL AND ZARCHIVED = 0 AND ZTRASHED = 0
                  AND ZTEXT LIKE ?1 ESCAPE '\' {}",
                SELECT_NOTES, ORDER_BY_MODIFIED
            );
            let pattern = format!("%#{}", &like_pattern(tag)[1..]);
            self.query_notes(&sql, params![pattern])?
        } else {
            self.list_notes()?
        };

        Ok(candidates
            .into_iter()
            .filter(|note| note.has_tag(tag))
            .collect())
    }

    /// The note whose identifier is exactly `id`, whatever its state.
    pub fn get_by_id(&self, id: &str) -> Result<Note> {
        let conn = self.connect()?;
        let sql = format!("{} WHERE ZUNIQUEIDENTIFIER = ?1", SELECT_NOTES);
        conn.query_row(&sql, params![id], row_to_note)
            .optional()?
            .ok_or_else(|| BearError::NotFound(id.to_string()))
    }

    /// Tag names as Bear stores them, limited to tags used by at least one
    /// note outside the trash. Sorted alphabetically without duplicates.
    pub fn list_tags(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;

        let mut stmt =
            conn.prepare("SELECT DISTINCT ZTITLE FROM ZSFNOTETAG WHERE ZTITLE IS NOT NULL")?;
        let stored = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare("SELECT ZTEXT FROM ZSFNOTE WHERE ZTRASHED = 0")?;
        let in_use: HashSet<String> = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .flat_map(|text| extract_tags(&text))
            .collect();

        let mut tags: Vec<String> = stored
            .into_iter()
            .filter(|name| in_use.iter().any(|used| tag_matches(used, name)))
            .collect();
        tags.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        tags.dedup();
        Ok(tags)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            BearError::StoreUnavailable(format!("Cannot open {}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        check_table(&conn, NOTE_TABLE, NOTE_COLUMNS)?;
        check_table(&conn, TAG_TABLE, TAG_COLUMNS)?;
        Ok(conn)
    }

    fn query_notes<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Note>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let notes = stmt
            .query_map(params, row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }
}

/// Fail with `StoreSchema` when `table` or any of `required` is absent.
fn check_table(conn: &Connection, table: &str, required: &[&str]) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;

    if columns.is_empty() {
        warn!(table, "Bear database is missing a table");
        return Err(BearError::StoreSchema(format!("table {} not found", table)));
    }

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !columns.contains(*column))
        .collect();
    if !missing.is_empty() {
        warn!(table, ?missing, "Bear database is missing columns");
        return Err(BearError::StoreSchema(format!(
            "table {} lacks column(s): {}",
            table,
            missing.join(", ")
        )));
    }
    Ok(())
}

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let text = row.get::<_, Option<String>>(3)?.unwrap_or_default();
    Ok(Note {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        subtitle: row.get(2)?,
        tags: extract_tags(&text),
        text,
        pinned: flag(row, 4)?,
        archived: flag(row, 5)?,
        trashed: flag(row, 6)?,
        created_at: row.get::<_, Option<f64>>(7)?.and_then(core_data_timestamp),
        modified_at: row.get::<_, Option<f64>>(8)?.and_then(core_data_timestamp),
    })
}

fn flag(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or(0) != 0)
}

/// Strip the optional `#` and surrounding slashes callers tend to include.
fn normalize_tag(tag: &str) -> &str {
    tag.trim().trim_start_matches('#').trim_matches('/').trim()
}

/// `%fragment%` with LIKE wildcards in `fragment` escaped by `\`.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
