// togo-store - SQLite data-access layer for tasks and users

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod record;
pub mod store;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use context::Context;
pub use error::{Result, StoreError};
pub use models::{DATE_FORMAT, Task, User, format_date, parse_date};
pub use record::FromRow;
pub use store::TaskStore;

// Re-export rusqlite for callers that provision users or share connections
pub use rusqlite;
