//! Study subjects and their five activity counters.
//!
//! Counters never go below zero: adjustments apply `MAX(0, value + delta)`
//! in a single UPDATE, scoped to the owning user.

use rusqlite::{params, Connection};
use serde::Serialize;

use super::{new_id, now};

/// The five per-subject activity counters, addressed on the wire by their
/// camelCase field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Dpp,
    Class,
    Pyq,
    Book,
    ChatGpt,
}

impl Counter {
    /// Wire names accepted in `type` parameters
    pub const WIRE_NAMES: [&'static str; 5] = [
        "dppCount",
        "classCount",
        "pyqCount",
        "bookCount",
        "chatGptCount",
    ];

    /// Parse a wire name (`dppCount` .. `chatGptCount`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dppCount" => Some(Counter::Dpp),
            "classCount" => Some(Counter::Class),
            "pyqCount" => Some(Counter::Pyq),
            "bookCount" => Some(Counter::Book),
            "chatGptCount" => Some(Counter::ChatGpt),
            _ => None,
        }
    }

    /// Wire name of this counter
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Dpp => "dppCount",
            Counter::Class => "classCount",
            Counter::Pyq => "pyqCount",
            Counter::Book => "bookCount",
            Counter::ChatGpt => "chatGptCount",
        }
    }

    /// Backing column name. Static strings only, safe to splice into SQL.
    fn column(&self) -> &'static str {
        match self {
            Counter::Dpp => "dpp_count",
            Counter::Class => "class_count",
            Counter::Pyq => "pyq_count",
            Counter::Book => "book_count",
            Counter::ChatGpt => "chat_gpt_count",
        }
    }
}

/// A subject row as served to clients
#[derive(Debug, Clone, Serialize)]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    #[serde(rename = "subjectName")]
    pub subject_name: String,
    #[serde(rename = "dppCount")]
    pub dpp_count: i64,
    #[serde(rename = "classCount")]
    pub class_count: i64,
    #[serde(rename = "pyqCount")]
    pub pyq_count: i64,
    #[serde(rename = "bookCount")]
    pub book_count: i64,
    #[serde(rename = "chatGptCount")]
    pub chat_gpt_count: i64,
}

/// Per-subject rollup for the v1 summary
#[derive(Debug, Clone, Serialize)]
pub struct SubjectCount {
    #[serde(rename = "subjectName")]
    pub subject_name: String,
    pub count: i64,
}

/// Per-subject rollup for the v2 dashboard, counters included
#[derive(Debug, Clone, Serialize)]
pub struct SubjectTotals {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "subjectName")]
    pub subject_name: String,
    #[serde(rename = "dppCount")]
    pub dpp_count: i64,
    #[serde(rename = "classCount")]
    pub class_count: i64,
    #[serde(rename = "pyqCount")]
    pub pyq_count: i64,
    #[serde(rename = "bookCount")]
    pub book_count: i64,
    #[serde(rename = "chatGptCount")]
    pub chat_gpt_count: i64,
    pub totalcount: i64,
}

fn row_to_subject(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        subject_name: row.get("subject_name")?,
        dpp_count: row.get("dpp_count")?,
        class_count: row.get("class_count")?,
        pyq_count: row.get("pyq_count")?,
        book_count: row.get("book_count")?,
        chat_gpt_count: row.get("chat_gpt_count")?,
    })
}

/// Create a subject with zeroed counters
pub fn create(conn: &Connection, user_id: &str, subject_name: &str) -> rusqlite::Result<Subject> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO subjects (id, user_id, subject_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, user_id, subject_name, ts],
    )?;
    Ok(Subject {
        id,
        user_id: user_id.to_string(),
        subject_name: subject_name.to_string(),
        dpp_count: 0,
        class_count: 0,
        pyq_count: 0,
        book_count: 0,
        chat_gpt_count: 0,
    })
}

/// All of a user's subjects, oldest first
pub fn list(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<Subject>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, subject_name, dpp_count, class_count, pyq_count,
                book_count, chat_gpt_count
         FROM subjects
         WHERE user_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let subjects = stmt
        .query_map(params![user_id], row_to_subject)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(subjects)
}

/// Delete a subject scoped to its owner. Returns whether a row matched.
pub fn delete(conn: &Connection, user_id: &str, id: &str) -> rusqlite::Result<bool> {
    let affected = conn.execute(
        "DELETE FROM subjects WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(affected > 0)
}

/// Apply a signed delta to one counter, clamping at zero. Returns whether
/// a row matched; no match means the subject is absent or not the caller's.
pub fn adjust_counter(
    conn: &Connection,
    user_id: &str,
    id: &str,
    counter: Counter,
    delta: i64,
) -> rusqlite::Result<bool> {
    let col = counter.column();
    let sql = format!(
        "UPDATE subjects SET {col} = MAX(0, {col} + ?1), updated_at = ?2
         WHERE id = ?3 AND user_id = ?4"
    );
    let affected = conn.execute(&sql, params![delta, now(), id, user_id])?;
    Ok(affected > 0)
}

/// v1 summary: per-subject counter sums plus the overall total
pub fn summary(conn: &Connection, user_id: &str) -> rusqlite::Result<(Vec<SubjectCount>, i64)> {
    let mut stmt = conn.prepare(
        "SELECT subject_name,
                dpp_count + class_count + pyq_count + book_count + chat_gpt_count AS count
         FROM subjects
         WHERE user_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let subjects = stmt
        .query_map(params![user_id], |row| {
            Ok(SubjectCount {
                subject_name: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let total = subjects.iter().map(|s| s.count).sum();
    Ok((subjects, total))
}

/// v2 summary: full counter breakdown per subject plus the overall total
pub fn summary_v2(conn: &Connection, user_id: &str) -> rusqlite::Result<(Vec<SubjectTotals>, i64)> {
    let mut stmt = conn.prepare(
        "SELECT id, subject_name, dpp_count, class_count, pyq_count, book_count, chat_gpt_count,
                dpp_count + class_count + pyq_count + book_count + chat_gpt_count AS totalcount
         FROM subjects
         WHERE user_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let subjects = stmt
        .query_map(params![user_id], |row| {
            Ok(SubjectTotals {
                id: row.get(0)?,
                subject_name: row.get(1)?,
                dpp_count: row.get(2)?,
                class_count: row.get(3)?,
                pyq_count: row.get(4)?,
                book_count: row.get(5)?,
                chat_gpt_count: row.get(6)?,
                totalcount: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let overall = subjects.iter().map(|s| s.totalcount).sum();
    Ok((subjects, overall))
}
