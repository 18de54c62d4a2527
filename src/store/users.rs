//! User rows: signup, lookup, last-issued token.

use rusqlite::{params, Connection, OptionalExtension};

use super::{new_id, now};

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    /// Last-issued bearer token, informational
    pub token: Option<String>,
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        token: row.get("token")?,
    })
}

/// Insert a new user. The email column is UNIQUE; callers check for an
/// existing registration first to report 409 cleanly.
pub fn create(conn: &Connection, email: &str, password_hash: &str) -> rusqlite::Result<User> {
    let id = new_id();
    let ts = now();
    conn.execute(
        "INSERT INTO users (id, email, password_hash, token, created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
        params![id, email, password_hash, ts],
    )?;
    Ok(User {
        id,
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        token: None,
    })
}

/// Look a user up by email
pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, password_hash, token FROM users WHERE email = ?1",
        params![email],
        row_to_user,
    )
    .optional()
}

/// Persist the most recently issued token for a user
pub fn set_token(conn: &Connection, user_id: &str, token: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET token = ?1, updated_at = ?2 WHERE id = ?3",
        params![token, now(), user_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::test_db;

    #[test]
    fn test_create_and_find() {
        let db = test_db();
        let conn = db.connection();

        let user = create(&conn, "a@b.co", "hash").unwrap();
        assert!(user.token.is_none());

        let found = find_by_email(&conn, "a@b.co").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "hash");

        assert!(find_by_email(&conn, "missing@b.co").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = test_db();
        let conn = db.connection();

        create(&conn, "a@b.co", "hash").unwrap();
        let err = create(&conn, "a@b.co", "hash2").unwrap_err();
        match err {
            rusqlite::Error::SqliteFailure(e, _) => {
                assert_eq!(e.code, rusqlite::ErrorCode::ConstraintViolation)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_set_token() {
        let db = test_db();
        let conn = db.connection();

        let user = create(&conn, "a@b.co", "hash").unwrap();
        set_token(&conn, &user.id, "jwt-goes-here").unwrap();

        let found = find_by_email(&conn, "a@b.co").unwrap().unwrap();
        assert_eq!(found.token.as_deref(), Some("jwt-goes-here"));
    }
}
