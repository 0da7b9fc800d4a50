// Task store implementation on SQLite

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::context::Context;
use crate::error::{Result, StoreError};
use crate::models::{Task, format_date};
use crate::record::FromRow;
use rusqlite::{Connection, OptionalExtension, params};
use std::ffi::c_int;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite VM steps between context checks while a statement runs
const INTERRUPT_CHECK_OPS: c_int = 1_000;

/// Data-access façade for tasks and users
///
/// Every operation runs a single parameterized statement under the caller's
/// [`Context`]. Nothing is retried and no transaction spans two calls.
pub struct TaskStore {
    db: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl TaskStore {
    /// Open or create a store backed by the SQLite file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_timeout(path.as_ref(), DEFAULT_BUSY_TIMEOUT)
    }

    /// Open the store described by `config`
    pub fn open_with(config: &Config) -> Result<Self> {
        Self::open_with_timeout(&config.database, config.busy_timeout())
    }

    /// Private in-memory store, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let store = Self::from_connection(Connection::open_in_memory()?);
        store.create_schema()?;
        Ok(store)
    }

    /// Wrap an existing connection. The schema is left as is; the `tasks`
    /// and `users` tables must already exist.
    pub fn from_connection(db: Connection) -> Self {
        Self {
            db: Mutex::new(db),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used by [`TaskStore::get_user_today_task`]
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Lock and borrow the underlying connection
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves the connection itself usable
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        info!(path = ?path, "Opening task store");

        let db = Connection::open(path)?;
        db.busy_timeout(busy_timeout)?;

        let store = Self::from_connection(db);
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT NOT NULL PRIMARY KEY,
                password TEXT NOT NULL,
                max_todo INTEGER NOT NULL DEFAULT 5
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT NOT NULL PRIMARY KEY,
                content TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_date TEXT NOT NULL,
                status TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_user_date ON tasks(user_id, created_date);
            "#,
        )?;

        Ok(())
    }

    /// Run one statement against the connection while `ctx` is live.
    ///
    /// The context is checked up front and polled by a progress handler for
    /// as long as the statement runs.
    fn run<T>(&self, ctx: &Context, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        ctx.check()?;

        let guard = self.db();
        let db: &Connection = &guard;
        let _interrupt = InterruptGuard::install(db, ctx);

        f(db).map_err(|err| match StoreError::from(err) {
            StoreError::Cancelled => ctx.err().unwrap_or(StoreError::Cancelled),
            other => other,
        })
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Tasks owned by `user_id` created on `created_date`, in store row order
    pub fn retrieve_tasks(&self, ctx: &Context, user_id: &str, created_date: &str) -> Result<Vec<Task>> {
        debug!(user_id, created_date, "retrieve_tasks: called");

        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 AND created_date = ?2",
            Task::COLUMNS
        );

        self.run(ctx, |db| {
            let mut stmt = db.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id, created_date], Task::from_row)?;
            let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Insert a new task. Its status, if any, is not written.
    pub fn add_task(&self, ctx: &Context, task: &Task) -> Result<()> {
        debug!(id = %task.id, user_id = %task.user_id, "add_task: called");

        self.run(ctx, |db| {
            db.execute(
                "INSERT INTO tasks (id, content, user_id, created_date) VALUES (?1, ?2, ?3, ?4)",
                params![task.id, task.content, task.user_id, task.created_date],
            )
        })?;

        Ok(())
    }

    /// Set the status of one task. Matching nothing is not an error.
    pub fn update_status_task(&self, ctx: &Context, user_id: &str, task_id: &str, status: &str) -> Result<()> {
        let changed = self.run(ctx, |db| {
            db.execute(
                "UPDATE tasks SET status = ?1 WHERE user_id = ?2 AND id = ?3",
                params![status, user_id, task_id],
            )
        })?;

        debug!(user_id, task_id, status, changed, "update_status_task: done");
        Ok(())
    }

    /// Set the status of every task a user created on one date
    pub fn update_all_status_tasks(
        &self,
        ctx: &Context,
        user_id: &str,
        created_date: &str,
        status: &str,
    ) -> Result<()> {
        let changed = self.run(ctx, |db| {
            db.execute(
                "UPDATE tasks SET status = ?1 WHERE user_id = ?2 AND created_date = ?3",
                params![status, user_id, created_date],
            )
        })?;

        debug!(user_id, created_date, status, changed, "update_all_status_tasks: done");
        Ok(())
    }

    /// Delete one task. Matching nothing is not an error.
    pub fn delete_task(&self, ctx: &Context, user_id: &str, task_id: &str) -> Result<()> {
        let deleted = self.run(ctx, |db| {
            db.execute(
                "DELETE FROM tasks WHERE user_id = ?1 AND id = ?2",
                params![user_id, task_id],
            )
        })?;

        debug!(user_id, task_id, deleted, "delete_task: done");
        Ok(())
    }

    /// Delete every task a user created on one date
    pub fn delete_tasks(&self, ctx: &Context, user_id: &str, created_date: &str) -> Result<()> {
        let deleted = self.run(ctx, |db| {
            db.execute(
                "DELETE FROM tasks WHERE user_id = ?1 AND created_date = ?2",
                params![user_id, created_date],
            )
        })?;

        debug!(user_id, created_date, deleted, "delete_tasks: done");
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Check credentials, reporting why they were rejected.
    ///
    /// No matching row is `StoreError::NotFound`; unknown user and wrong
    /// password are indistinguishable.
    pub fn authenticate(&self, ctx: &Context, user_id: &str, password: &str) -> Result<()> {
        let id: Option<String> = self.run(ctx, |db| {
            db.query_row(
                "SELECT id FROM users WHERE id = ?1 AND password = ?2",
                params![user_id, password],
                |row| row.get(0),
            )
            .optional()
        })?;

        match id {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("user", user_id)),
        }
    }

    /// True iff a user row matches both `user_id` and `password`.
    ///
    /// Any failure, including store errors, reads as `false`. The cause is
    /// logged; use [`TaskStore::authenticate`] to observe it.
    pub fn validate_user(&self, ctx: &Context, user_id: &str, password: &str) -> bool {
        match self.authenticate(ctx, user_id, password) {
            Ok(()) => true,
            Err(err) if err.is_not_found() => {
                debug!(user_id, "validate_user: credentials rejected");
                false
            }
            Err(err) => {
                warn!(user_id, error = %err, "validate_user: lookup failed, treating as invalid");
                false
            }
        }
    }

    /// Daily task quota of `user_id`
    pub fn get_user_max_task(&self, ctx: &Context, user_id: &str) -> Result<i64> {
        let max_todo: Option<i64> = self.run(ctx, |db| {
            db.query_row(
                "SELECT max_todo FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
        })?;

        max_todo.ok_or_else(|| StoreError::not_found("user", user_id))
    }

    /// Number of tasks `user_id` created today, per the store's clock
    pub fn get_user_today_task(&self, ctx: &Context, user_id: &str) -> Result<i64> {
        let today = format_date(self.clock.today());

        let count: i64 = self.run(ctx, |db| {
            db.query_row(
                "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND created_date = ?2",
                params![user_id, today],
                |row| row.get(0),
            )
        })?;

        debug!(user_id, today = %today, count, "get_user_today_task: done");
        Ok(count)
    }
}

/// Keeps a progress handler that aborts the running statement once the
/// context ends; removed on drop.
struct InterruptGuard<'a> {
    db: &'a Connection,
}

impl<'a> InterruptGuard<'a> {
    fn install(db: &'a Connection, ctx: &Context) -> Self {
        // The handler only reads the token and the deadline
        let ctx = AssertUnwindSafe(ctx.clone());
        db.progress_handler(INTERRUPT_CHECK_OPS, Some(move || ctx.err().is_some()));
        Self { db }
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.db.progress_handler(INTERRUPT_CHECK_OPS, None::<fn() -> bool>);
    }
}
