// Data models for the task store

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage format of `tasks.created_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date the way `created_date` is stored
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date; lenient on zero padding
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

/// A unit of work owned by a user, scoped to its creation date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,
    pub user_id: String,
    /// `YYYY-MM-DD`
    pub created_date: String,
    /// Unset until one of the status updates touches the row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        user_id: impl Into<String>,
        created_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            user_id: user_id.into(),
            created_date: created_date.into(),
            status: None,
        }
    }
}

/// Account holding credentials and a daily task quota
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub max_todo: i64,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .field("max_todo", &self.max_todo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "2024-01-05");
    }

    #[test]
    fn test_parse_date_normalizes_padding() {
        let date = parse_date("2024-1-5").unwrap();
        assert_eq!(format_date(date), "2024-01-05");
        assert_eq!(parse_date("2024-01-15").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("15/01/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("2024-01-15T10:00:00").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_task_new_has_no_status() {
        let task = Task::new("t1", "write report", "u1", "2024-01-15");
        assert_eq!(task.id, "t1");
        assert_eq!(task.created_date, "2024-01-15");
        assert!(task.status.is_none());
    }

    #[test]
    fn test_task_serialization_omits_missing_status() {
        let task = Task::new("t1", "write report", "u1", "2024-01-15");
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("status"));

        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, task);
    }

    #[test]
    fn test_user_hides_password() {
        let user = User {
            id: "u1".to_string(),
            password: "hunter2".to_string(),
            max_todo: 5,
        };

        assert!(!format!("{:?}", user).contains("hunter2"));
        assert!(!serde_json::to_string(&user).unwrap().contains("hunter2"));
    }
}
