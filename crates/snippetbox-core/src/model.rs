// ABOUTME: The Snippet entity as read back from the store, plus date formatting for display.
// ABOUTME: Snippets are immutable once created; expiry is fixed at insert time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored text snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet is still visible at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Format a timestamp for display, e.g. `17 Mar 2024 at 10:15`.
pub fn human_date(date: &DateTime<Utc>) -> String {
    date.format("%d %b %Y at %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn human_date_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 59).unwrap();
        assert_eq!(human_date(&date), "07 Mar 2024 at 09:05");
    }

    #[test]
    fn liveness_boundary_is_exclusive() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let snippet = Snippet {
            id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            created,
            expires: created + Duration::days(1),
        };

        assert!(snippet.is_live_at(created));
        assert!(!snippet.is_live_at(snippet.expires));
        assert!(!snippet.is_live_at(snippet.expires + Duration::seconds(1)));
    }
}
