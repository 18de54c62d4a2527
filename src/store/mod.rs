//! Typed query functions over the SQLite store, one module per domain.

pub mod lags;
pub mod question_bank;
pub mod subjects;
pub mod users;

/// Fresh UUIDv4 row id
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as an RFC 3339 string
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
