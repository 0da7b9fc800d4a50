// Row mapping for stored types

use crate::models::{Task, User};
use rusqlite::Row;

/// Maps one result row onto a domain struct
pub trait FromRow: Sized {
    /// Column list, in the order `from_row` reads them
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl FromRow for Task {
    const COLUMNS: &'static str = "id, content, user_id, created_date, status";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Task {
            id: row.get(0)?,
            content: row.get(1)?,
            user_id: row.get(2)?,
            created_date: row.get(3)?,
            status: row.get(4)?,
        })
    }
}

/// For services reading `users` rows through `TaskStore::db`
impl FromRow for User {
    const COLUMNS: &'static str = "id, password, max_todo";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            password: row.get(1)?,
            max_todo: row.get(2)?,
        })
    }
}
