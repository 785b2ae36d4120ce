// ABOUTME: SQLite-backed session storage keyed by an opaque token.
// ABOUTME: Session data is a flat string map serialized as JSON; expired rows are invisible and purgeable.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::db::Database;
use crate::error::StoreError;

pub type SessionData = HashMap<String, String>;

#[derive(Clone)]
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load the data for an unexpired session, or `None` if there is none.
    pub async fn find(&self, token: &str) -> Result<Option<SessionData>, StoreError> {
        let token = token.to_string();
        let raw: Option<String> = self
            .db
            .run("find session", move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT data FROM sessions WHERE token = ?1 AND expiry > ?2",
                        params![token, Utc::now()],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| StoreError::failure("corrupt session data", e))
        })
        .transpose()
    }

    /// Insert or replace the data for `token`.
    pub async fn commit(
        &self,
        token: &str,
        data: &SessionData,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let token = token.to_string();
        let json = serde_json::to_string(data)
            .map_err(|e| StoreError::failure("failed to encode session data", e))?;

        self.db
            .run("commit session", move |conn| {
                conn.execute(
                    "INSERT INTO sessions (token, data, expiry) VALUES (?1, ?2, ?3)
                     ON CONFLICT(token) DO UPDATE SET
                        data = excluded.data,
                        expiry = excluded.expiry",
                    params![token, json, expiry],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let token = token.to_string();
        self.db
            .run("delete session", move |conn| {
                conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
                Ok(())
            })
            .await
    }

    /// Remove every expired session row. Returns the number removed.
    pub async fn delete_expired(&self) -> Result<usize, StoreError> {
        self.db
            .run("delete expired sessions", |conn| {
                Ok(conn.execute(
                    "DELETE FROM sessions WHERE expiry <= ?1",
                    params![Utc::now()],
                )?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> SessionStore {
        SessionStore::new(Database::open_in_memory().unwrap())
    }

    fn flash(message: &str) -> SessionData {
        HashMap::from([("flash".to_string(), message.to_string())])
    }

    #[tokio::test]
    async fn find_unknown_token_is_none() {
        let store = store();
        assert!(store.find("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_then_find() {
        let store = store();
        let expiry = Utc::now() + Duration::hours(12);
        store.commit("tok", &flash("hello"), expiry).await.unwrap();

        let data = store.find("tok").await.unwrap().unwrap();
        assert_eq!(data.get("flash").map(String::as_str), Some("hello"));
    }

    #[tokio::test]
    async fn commit_replaces_existing_data() {
        let store = store();
        let expiry = Utc::now() + Duration::hours(1);
        store.commit("tok", &flash("first"), expiry).await.unwrap();
        store.commit("tok", &SessionData::new(), expiry).await.unwrap();

        let data = store.find("tok").await.unwrap().unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn expired_session_is_not_found() {
        let store = store();
        store
            .commit("old", &flash("stale"), Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        assert!(store.find("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_session() {
        let store = store();
        store
            .commit("tok", &flash("bye"), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store.delete("tok").await.unwrap();

        assert!(store.find("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_expired_only_removes_stale_rows() {
        let store = store();
        let now = Utc::now();
        store.commit("a", &flash("a"), now - Duration::hours(1)).await.unwrap();
        store.commit("b", &flash("b"), now - Duration::seconds(1)).await.unwrap();
        store.commit("c", &flash("c"), now + Duration::hours(1)).await.unwrap();

        assert_eq!(store.delete_expired().await.unwrap(), 2);
        assert!(store.find("c").await.unwrap().is_some());
        assert_eq!(store.delete_expired().await.unwrap(), 0);
    }
}
