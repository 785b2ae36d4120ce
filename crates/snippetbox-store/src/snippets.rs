// ABOUTME: Data access for the snippets table: fetch one, insert, and list the latest.
// ABOUTME: Expired snippets are never returned; rows are kept and only filtered at read time.

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use rusqlite::{OptionalExtension, Row, params};
use snippetbox_core::Snippet;

use crate::db::Database;
use crate::error::StoreError;

/// Maximum number of snippets returned by [`SnippetStore::latest`].
pub const LATEST_LIMIT: i64 = 10;

/// The only way callers reach the snippets table.
#[derive(Clone)]
pub struct SnippetStore {
    db: Database,
}

impl SnippetStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetch a live snippet by id.
    ///
    /// Returns `StoreError::NoRecord` if the id does not exist or the snippet
    /// has expired.
    pub async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        self.db
            .run("get snippet", move |conn| {
                conn.query_row(
                    "SELECT id, title, content, created, expires FROM snippets
                     WHERE expires > ?1 AND id = ?2",
                    params![Utc::now(), id],
                    snippet_from_row,
                )
                .optional()?
                .ok_or(StoreError::NoRecord)
            })
            .await
    }

    /// Insert a snippet that expires `expires_days` days from now and return its id.
    pub async fn insert(
        &self,
        title: String,
        content: String,
        expires_days: i64,
    ) -> Result<i64, StoreError> {
        let created = Utc::now();
        let expires = expiry_after(created, expires_days)?;

        let id = self
            .db
            .run("insert snippet", move |conn| {
                conn.execute(
                    "INSERT INTO snippets (title, content, created, expires)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![title, content, created, expires],
                )?;
                // Same locked connection as the INSERT, so no other write can interleave.
                Ok(conn.last_insert_rowid())
            })
            .await?;

        tracing::debug!(id, expires_days, "snippet inserted");
        Ok(id)
    }

    /// Up to ten live snippets, newest id first.
    pub async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        self.db
            .run("latest snippets", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, content, created, expires FROM snippets
                     WHERE expires > ?1 ORDER BY id DESC LIMIT ?2",
                )?;

                let rows = stmt.query_map(params![Utc::now(), LATEST_LIMIT], snippet_from_row)?;

                let mut snippets = Vec::new();
                for row in rows {
                    snippets.push(row?);
                }
                Ok(snippets)
            })
            .await
    }
}

fn snippet_from_row(row: &Row<'_>) -> rusqlite::Result<Snippet> {
    Ok(Snippet {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created: row.get(3)?,
        expires: row.get(4)?,
    })
}

/// Timestamps are stored as text and compared as strings, which only orders
/// correctly for four-digit years.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

fn expiry_after(created: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, StoreError> {
    TimeDelta::try_days(days)
        .and_then(|delta| created.checked_add_signed(delta))
        .filter(|expires| STORABLE_YEARS.contains(&expires.year()))
        .ok_or_else(|| StoreError::failure_msg(format!("expiry of {days} days is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn store() -> SnippetStore {
        SnippetStore::new(Database::open_in_memory().unwrap())
    }

    async fn insert(store: &SnippetStore, title: &str, days: i64) -> i64 {
        store
            .insert(title.to_string(), format!("{title} body"), days)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trip() {
        let store = store();
        let id = store
            .insert("Test".to_string(), "Body".to_string(), 7)
            .await
            .unwrap();

        let snippet = store.get(id).await.unwrap();
        assert_eq!(snippet.id, id);
        assert_eq!(snippet.title, "Test");
        assert_eq!(snippet.content, "Body");
        assert_eq!(snippet.expires - snippet.created, Duration::days(7));

        let age = Utc::now() - snippet.created;
        assert!(age >= Duration::zero() && age < Duration::seconds(30));
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = store();
        let first = insert(&store, "one", 1).await;
        let second = insert(&store, "two", 1).await;
        assert!(second > first);
    }

    #[tokio::test]
    async fn get_missing_id_is_no_record() {
        let store = store();
        insert(&store, "present", 7).await;

        for id in [0, -1, 9999] {
            let err = store.get(id).await.unwrap_err();
            assert!(err.is_no_record(), "id {id} should be NoRecord, got {err}");
        }
    }

    #[tokio::test]
    async fn expired_snippet_is_hidden_from_get() {
        let store = store();
        let id = insert(&store, "stale", -1).await;

        let err = store.get(id).await.unwrap_err();
        assert!(err.is_no_record());
    }

    #[tokio::test]
    async fn latest_returns_ten_newest_first() {
        let store = store();
        let mut ids = Vec::new();
        for n in 1..=12 {
            ids.push(insert(&store, &format!("snippet {n}"), 365).await);
        }

        let latest = store.latest().await.unwrap();
        let got: Vec<i64> = latest.iter().map(|s| s.id).collect();
        let expected: Vec<i64> = ids.iter().rev().take(10).copied().collect();

        assert_eq!(got.len(), 10);
        assert_eq!(got, expected);
        assert_eq!(latest[0].title, "snippet 12");
        assert_eq!(latest[9].title, "snippet 3");
    }

    #[tokio::test]
    async fn latest_skips_expired() {
        let store = store();
        let live = insert(&store, "live", 7).await;
        insert(&store, "stale", -7).await;

        let latest = store.latest().await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, live);
    }

    #[tokio::test]
    async fn latest_on_empty_table_is_empty() {
        let store = store();
        assert!(store.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_on_fully_expired_table_is_empty() {
        let store = store();
        insert(&store, "old", -1).await;
        insert(&store, "older", -365).await;

        assert!(store.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_expiry_is_failure() {
        let store = store();
        let err = store
            .insert("t".to_string(), "c".to_string(), i64::MAX)
            .await
            .unwrap_err();
        assert!(!err.is_no_record());
        assert!(store.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expiry_past_year_9999_is_failure() {
        let store = store();
        for days in [3_000_000, -3_000_000] {
            let err = store
                .insert("far".to_string(), "body".to_string(), days)
                .await
                .unwrap_err();
            assert!(!err.is_no_record(), "{days} days: {err}");
        }
        assert!(store.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expiry_in_year_9999_is_still_live() {
        let store = store();
        let last_day = Utc.with_ymd_and_hms(9999, 12, 30, 0, 0, 0).unwrap();
        let days = (last_day - Utc::now()).num_days();

        let id = insert(&store, "far", days).await;
        let snippet = store.get(id).await.unwrap();
        assert_eq!(snippet.expires.year(), 9999);
        assert_eq!(store.latest().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_row_is_failure_not_no_record() {
        let db = Database::open_in_memory().unwrap();
        let store = SnippetStore::new(db.clone());
        db.run("corrupt row", |conn| {
            conn.execute(
                "INSERT INTO snippets (title, content, created, expires)
                 VALUES ('bad', 'row', 'not a date', '9999-12-31 00:00:00+00:00')",
                [],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .unwrap();

        let err = store.latest().await.unwrap_err();
        assert!(!err.is_no_record());

        let err = store.get(1).await.unwrap_err();
        assert!(!err.is_no_record());
    }
}
