//! The lag journal: Subject → Chapter → Body-entries with substring search
//! and category tags.
//!
//! Ownership is enforced on every operation by joining up to the owning
//! user; deletes cascade down the hierarchy via foreign keys.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::{new_id, now};

/// A lag journal subject
#[derive(Debug, Clone, Serialize)]
pub struct LagSubject {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "subjectName")]
    pub subject_name: String,
}

/// A chapter under a lag subject
#[derive(Debug, Clone, Serialize)]
pub struct LagChapter {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "chapterName")]
    pub chapter_name: String,
}

/// A free-text entry under a chapter, optionally tagged
#[derive(Debug, Clone, Serialize)]
pub struct LagBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// ============================================================================
// Subjects
// ============================================================================

/// Create a lag subject for a user
pub fn create_subject(
    conn: &Connection,
    user_id: &str,
    subject_name: &str,
) -> rusqlite::Result<LagSubject> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO lag_subjects (id, user_id, subject_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, user_id, subject_name, ts],
    )?;
    Ok(LagSubject {
        id,
        subject_name: subject_name.to_string(),
    })
}

/// A page of the caller's lag subjects, oldest first
pub fn list_subjects(
    conn: &Connection,
    user_id: &str,
    skip: i64,
    limit: i64,
) -> rusqlite::Result<Vec<LagSubject>> {
    let mut stmt = conn.prepare(
        "SELECT id, subject_name FROM lag_subjects
         WHERE user_id = ?1
         ORDER BY created_at, rowid
         LIMIT ?2 OFFSET ?3",
    )?;
    let subjects = stmt
        .query_map(params![user_id, limit, skip], |row| {
            Ok(LagSubject {
                id: row.get(0)?,
                subject_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(subjects)
}

/// Every lag subject the caller owns
pub fn list_all_subjects(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<LagSubject>> {
    list_subjects(conn, user_id, 0, i64::MAX)
}

/// Delete a lag subject; chapters and bodies cascade
pub fn delete_subject(conn: &Connection, user_id: &str, id: &str) -> rusqlite::Result<bool> {
    let affected = conn.execute(
        "DELETE FROM lag_subjects WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(affected > 0)
}

/// Does the given lag subject belong to this user?
pub fn subject_owned(conn: &Connection, user_id: &str, subject_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM lag_subjects WHERE id = ?1 AND user_id = ?2",
            params![subject_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// ============================================================================
// Chapters
// ============================================================================

/// Create a chapter under a lag subject
pub fn create_chapter(
    conn: &Connection,
    subject_id: &str,
    chapter_name: &str,
) -> rusqlite::Result<LagChapter> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO lag_chapters (id, lag_subject_id, chapter_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, subject_id, chapter_name, ts],
    )?;
    Ok(LagChapter {
        id,
        chapter_name: chapter_name.to_string(),
    })
}

/// A page of chapters under a subject, oldest first
pub fn list_chapters(
    conn: &Connection,
    subject_id: &str,
    skip: i64,
    limit: i64,
) -> rusqlite::Result<Vec<LagChapter>> {
    let mut stmt = conn.prepare(
        "SELECT id, chapter_name FROM lag_chapters
         WHERE lag_subject_id = ?1
         ORDER BY created_at, rowid
         LIMIT ?2 OFFSET ?3",
    )?;
    let chapters = stmt
        .query_map(params![subject_id, limit, skip], |row| {
            Ok(LagChapter {
                id: row.get(0)?,
                chapter_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(chapters)
}

/// Rename a chapter, scoped to the owning user. Returns the updated row.
pub fn rename_chapter(
    conn: &Connection,
    user_id: &str,
    id: &str,
    chapter_name: &str,
) -> rusqlite::Result<Option<LagChapter>> {
    let affected = conn.execute(
        "UPDATE lag_chapters SET chapter_name = ?1, updated_at = ?2
         WHERE id = ?3
           AND lag_subject_id IN (SELECT id FROM lag_subjects WHERE user_id = ?4)",
        params![chapter_name, now(), id, user_id],
    )?;
    if affected == 0 {
        return Ok(None);
    }
    Ok(Some(LagChapter {
        id: id.to_string(),
        chapter_name: chapter_name.to_string(),
    }))
}

/// Delete a chapter; bodies cascade
pub fn delete_chapter(conn: &Connection, user_id: &str, id: &str) -> rusqlite::Result<bool> {
    let affected = conn.execute(
        "DELETE FROM lag_chapters
         WHERE id = ?1
           AND lag_subject_id IN (SELECT id FROM lag_subjects WHERE user_id = ?2)",
        params![id, user_id],
    )?;
    Ok(affected > 0)
}

/// Does the given chapter roll up to this user?
pub fn chapter_owned(conn: &Connection, user_id: &str, chapter_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM lag_chapters c
             JOIN lag_subjects s ON s.id = c.lag_subject_id
             WHERE c.id = ?1 AND s.user_id = ?2",
            params![chapter_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// ============================================================================
// Bodies
// ============================================================================

/// Create a body entry under a chapter
pub fn create_body(
    conn: &Connection,
    chapter_id: &str,
    body: &str,
    category: Option<&str>,
) -> rusqlite::Result<LagBody> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO lag_bodies (id, lag_chapter_id, body, category, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, chapter_id, body, category, ts],
    )?;
    Ok(LagBody {
        id,
        body: body.to_string(),
        category: category.map(str::to_string),
    })
}

/// Escape LIKE metacharacters so a search string matches literally
fn escape_like(q: &str) -> String {
    q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// A page of body entries, newest first, optionally filtered by a
/// case-insensitive substring of the text and/or an exact category tag.
pub fn list_bodies(
    conn: &Connection,
    chapter_id: &str,
    skip: i64,
    limit: i64,
    q: Option<&str>,
    category: Option<&str>,
) -> rusqlite::Result<Vec<LagBody>> {
    let q = q.map(escape_like);
    let mut stmt = conn.prepare(
        "SELECT id, body, category FROM lag_bodies
         WHERE lag_chapter_id = ?1
           AND (?2 IS NULL OR body LIKE '%' || ?2 || '%' ESCAPE '\\')
           AND (?3 IS NULL OR category = ?3)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?4 OFFSET ?5",
    )?;
    let bodies = stmt
        .query_map(params![chapter_id, q, category, limit, skip], |row| {
            Ok(LagBody {
                id: row.get(0)?,
                body: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(bodies)
}

/// Update a body entry's text and tag, scoped to the owning user
pub fn update_body(
    conn: &Connection,
    user_id: &str,
    id: &str,
    body: &str,
    category: Option<&str>,
) -> rusqlite::Result<Option<LagBody>> {
    let affected = conn.execute(
        "UPDATE lag_bodies SET body = ?1, category = ?2, updated_at = ?3
         WHERE id = ?4
           AND lag_chapter_id IN (
               SELECT c.id FROM lag_chapters c
               JOIN lag_subjects s ON s.id = c.lag_subject_id
               WHERE s.user_id = ?5
           )",
        params![body, category, now(), id, user_id],
    )?;
    if affected == 0 {
        return Ok(None);
    }
    Ok(Some(LagBody {
        id: id.to_string(),
        body: body.to_string(),
        category: category.map(str::to_string),
    }))
}

/// Delete a body entry, scoped to the owning user
pub fn delete_body(conn: &Connection, user_id: &str, id: &str) -> rusqlite::Result<bool> {
    let affected = conn.execute(
        "DELETE FROM lag_bodies
         WHERE id = ?1
           AND lag_chapter_id IN (
               SELECT c.id FROM lag_chapters c
               JOIN lag_subjects s ON s.id = c.lag_subject_id
               WHERE s.user_id = ?2
           )",
        params![id, user_id],
    )?;
    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::{seed_user, test_db};

    #[test]
    fn test_subject_pagination() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");

        for i in 0..5 {
            create_subject(&conn, &user, &format!("Subject {i}")).unwrap();
        }

        let page1 = list_subjects(&conn, &user, 0, 2).unwrap();
        let page2 = list_subjects(&conn, &user, 2, 2).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_ne!(page1[0].id, page2[0].id);

        assert_eq!(list_all_subjects(&conn, &user).unwrap().len(), 5);
    }

    #[test]
    fn test_subjects_are_per_user() {
        let db = test_db();
        let conn = db.connection();
        let alice = seed_user(&conn, "alice@b.co");
        let bob = seed_user(&conn, "bob@b.co");

        let subject = create_subject(&conn, &alice, "Thermo").unwrap();
        assert!(subject_owned(&conn, &alice, &subject.id).unwrap());
        assert!(!subject_owned(&conn, &bob, &subject.id).unwrap());
        assert!(list_all_subjects(&conn, &bob).unwrap().is_empty());
    }

    #[test]
    fn test_delete_subject_cascades() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");

        let subject = create_subject(&conn, &user, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();
        create_body(&conn, &chapter.id, "revisit Carnot cycle", None).unwrap();

        assert!(delete_subject(&conn, &user, &subject.id).unwrap());

        let chapters: i64 = conn
            .query_row("SELECT COUNT(*) FROM lag_chapters", [], |r| r.get(0))
            .unwrap();
        let bodies: i64 = conn
            .query_row("SELECT COUNT(*) FROM lag_bodies", [], |r| r.get(0))
            .unwrap();
        assert_eq!(chapters, 0);
        assert_eq!(bodies, 0);
    }

    #[test]
    fn test_chapter_rename_and_ownership() {
        let db = test_db();
        let conn = db.connection();
        let alice = seed_user(&conn, "alice@b.co");
        let bob = seed_user(&conn, "bob@b.co");

        let subject = create_subject(&conn, &alice, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();

        // Bob cannot touch Alice's chapter
        assert!(rename_chapter(&conn, &bob, &chapter.id, "Hijack")
            .unwrap()
            .is_none());
        assert!(!delete_chapter(&conn, &bob, &chapter.id).unwrap());

        let renamed = rename_chapter(&conn, &alice, &chapter.id, "Second law")
            .unwrap()
            .unwrap();
        assert_eq!(renamed.chapter_name, "Second law");
        assert!(chapter_owned(&conn, &alice, &chapter.id).unwrap());
        assert!(delete_chapter(&conn, &alice, &chapter.id).unwrap());
    }

    #[test]
    fn test_bodies_newest_first() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");
        let subject = create_subject(&conn, &user, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();

        let first = create_body(&conn, &chapter.id, "first note", None).unwrap();
        let second = create_body(&conn, &chapter.id, "second note", None).unwrap();

        let bodies = list_bodies(&conn, &chapter.id, 0, 10, None, None).unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].id, second.id);
        assert_eq!(bodies[1].id, first.id);
    }

    #[test]
    fn test_body_search_is_case_insensitive() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");
        let subject = create_subject(&conn, &user, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();

        create_body(&conn, &chapter.id, "Carnot cycle derivation", None).unwrap();
        create_body(&conn, &chapter.id, "ideal gas law", None).unwrap();

        let hits = list_bodies(&conn, &chapter.id, 0, 10, Some("carnot"), None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, "Carnot cycle derivation");

        let none = list_bodies(&conn, &chapter.id, 0, 10, Some("osmosis"), None).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_body_search_wildcards_are_literal() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");
        let subject = create_subject(&conn, &user, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();

        create_body(&conn, &chapter.id, "plain note with no percent sign", None).unwrap();
        create_body(&conn, &chapter.id, "efficiency is 50% at best", None).unwrap();
        create_body(&conn, &chapter.id, "delta_s stays positive", None).unwrap();

        // % and _ match themselves, not everything
        let hits = list_bodies(&conn, &chapter.id, 0, 10, Some("%"), None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, "efficiency is 50% at best");

        let hits = list_bodies(&conn, &chapter.id, 0, 10, Some("50%"), None).unwrap();
        assert_eq!(hits.len(), 1);

        let hits = list_bodies(&conn, &chapter.id, 0, 10, Some("delta_s"), None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, "delta_s stays positive");

        let hits = list_bodies(&conn, &chapter.id, 0, 10, Some("delta\\"), None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_body_category_filter() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");
        let subject = create_subject(&conn, &user, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();

        create_body(&conn, &chapter.id, "note one", Some("formula")).unwrap();
        create_body(&conn, &chapter.id, "note two", Some("concept")).unwrap();
        create_body(&conn, &chapter.id, "note three", None).unwrap();

        let hits = list_bodies(&conn, &chapter.id, 0, 10, None, Some("formula")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category.as_deref(), Some("formula"));
    }

    #[test]
    fn test_update_and_delete_body_scoped() {
        let db = test_db();
        let conn = db.connection();
        let alice = seed_user(&conn, "alice@b.co");
        let bob = seed_user(&conn, "bob@b.co");

        let subject = create_subject(&conn, &alice, "Thermo").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Entropy").unwrap();
        let body = create_body(&conn, &chapter.id, "draft", None).unwrap();

        assert!(update_body(&conn, &bob, &body.id, "hijack", None)
            .unwrap()
            .is_none());
        assert!(!delete_body(&conn, &bob, &body.id).unwrap());

        let updated = update_body(&conn, &alice, &body.id, "final", Some("summary"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.body, "final");
        assert_eq!(updated.category.as_deref(), Some("summary"));

        assert!(delete_body(&conn, &alice, &body.id).unwrap());
        assert!(list_bodies(&conn, &chapter.id, 0, 10, None, None)
            .unwrap()
            .is_empty());
    }
}
