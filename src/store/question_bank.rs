//! Question bank: per-user subjects, chapters, and questions with an
//! image/source string and a numeric answer.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::{new_id, now};

/// A question bank subject
#[derive(Debug, Clone, Serialize)]
pub struct QbSubject {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "subjectName")]
    pub subject_name: String,
}

/// A chapter under a question bank subject
#[derive(Debug, Clone, Serialize)]
pub struct QbChapter {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "chapterName")]
    pub chapter_name: String,
}

/// A question: source string (usually an image URL) and numeric answer
#[derive(Debug, Clone, Serialize)]
pub struct QbQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub src: String,
    pub answer: f64,
}

/// Create a question bank subject for a user
pub fn create_subject(
    conn: &Connection,
    user_id: &str,
    subject_name: &str,
) -> rusqlite::Result<QbSubject> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO qb_subjects (id, user_id, subject_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, user_id, subject_name, ts],
    )?;
    Ok(QbSubject {
        id,
        subject_name: subject_name.to_string(),
    })
}

/// The caller's question bank subjects, oldest first
pub fn list_subjects(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<QbSubject>> {
    let mut stmt = conn.prepare(
        "SELECT id, subject_name FROM qb_subjects
         WHERE user_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let subjects = stmt
        .query_map(params![user_id], |row| {
            Ok(QbSubject {
                id: row.get(0)?,
                subject_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(subjects)
}

/// Does the given question bank subject belong to this user?
pub fn subject_owned(conn: &Connection, user_id: &str, subject_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM qb_subjects WHERE id = ?1 AND user_id = ?2",
            params![subject_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Create a chapter under a question bank subject
pub fn create_chapter(
    conn: &Connection,
    subject_id: &str,
    chapter_name: &str,
) -> rusqlite::Result<QbChapter> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO qb_chapters (id, qb_subject_id, chapter_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, subject_id, chapter_name, ts],
    )?;
    Ok(QbChapter {
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
) -> rusqlite::Result<Vec<QbChapter>> {
    let mut stmt = conn.prepare(
        "SELECT id, chapter_name FROM qb_chapters
         WHERE qb_subject_id = ?1
         ORDER BY created_at, rowid
         LIMIT ?2 OFFSET ?3",
    )?;
    let chapters = stmt
        .query_map(params![subject_id, limit, skip], |row| {
            Ok(QbChapter {
                id: row.get(0)?,
                chapter_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(chapters)
}

/// Does the given chapter roll up to this user?
pub fn chapter_owned(conn: &Connection, user_id: &str, chapter_id: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM qb_chapters c
             JOIN qb_subjects s ON s.id = c.qb_subject_id
             WHERE c.id = ?1 AND s.user_id = ?2",
            params![chapter_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Create a question under a chapter
pub fn create_question(
    conn: &Connection,
    chapter_id: &str,
    src: &str,
    answer: f64,
) -> rusqlite::Result<QbQuestion> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO qb_questions (id, qb_chapter_id, src, answer, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, chapter_id, src, answer, ts],
    )?;
    Ok(QbQuestion {
        id,
        src: src.to_string(),
        answer,
    })
}

/// A page of questions under a chapter, oldest first
pub fn list_questions(
    conn: &Connection,
    chapter_id: &str,
    skip: i64,
    limit: i64,
) -> rusqlite::Result<Vec<QbQuestion>> {
    let mut stmt = conn.prepare(
        "SELECT id, src, answer FROM qb_questions
         WHERE qb_chapter_id = ?1
         ORDER BY created_at, rowid
         LIMIT ?2 OFFSET ?3",
    )?;
    let questions = stmt
        .query_map(params![chapter_id, limit, skip], |row| {
            Ok(QbQuestion {
                id: row.get(0)?,
                src: row.get(1)?,
                answer: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::{seed_user, test_db};

    #[test]
    fn test_hierarchy_round_trip() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");

        let subject = create_subject(&conn, &user, "Physics").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Kinematics").unwrap();
        let question = create_question(&conn, &chapter.id, "https://img.example/q1.png", 42.0)
            .unwrap();

        assert_eq!(list_subjects(&conn, &user).unwrap().len(), 1);
        assert_eq!(list_chapters(&conn, &subject.id, 0, 10).unwrap().len(), 1);

        let questions = list_questions(&conn, &chapter.id, 0, 10).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, question.id);
        assert_eq!(questions[0].answer, 42.0);
    }

    #[test]
    fn test_ownership_checks() {
        let db = test_db();
        let conn = db.connection();
        let alice = seed_user(&conn, "alice@b.co");
        let bob = seed_user(&conn, "bob@b.co");

        let subject = create_subject(&conn, &alice, "Physics").unwrap();
        let chapter = create_chapter(&conn, &subject.id, "Kinematics").unwrap();

        assert!(subject_owned(&conn, &alice, &subject.id).unwrap());
        assert!(!subject_owned(&conn, &bob, &subject.id).unwrap());
        assert!(chapter_owned(&conn, &alice, &chapter.id).unwrap());
        assert!(!chapter_owned(&conn, &bob, &chapter.id).unwrap());
    }

    #[test]
    fn test_chapter_pagination() {
        let db = test_db();
        let conn = db.connection();
        let user = seed_user(&conn, "a@b.co");
        let subject = create_subject(&conn, &user, "Physics").unwrap();

        for i in 0..3 {
            create_chapter(&conn, &subject.id, &format!("Chapter {i}")).unwrap();
        }

        let page = list_chapters(&conn, &subject.id, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].chapter_name, "Chapter 1");
    }
}
