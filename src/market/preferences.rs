use crate::error::AppError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

pub const WATCHLIST_KEY: &str = "watchlist";

fn now_unix_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis().min(i64::MAX as u128) as i64,
        Err(_) => 0,
    }
}

pub trait PreferencesStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, AppError>>;
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), AppError>>;
}

#[derive(Clone)]
pub struct SqlitePreferences {
    pool: SqlitePool,
}

impl SqlitePreferences {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PreferencesStore for SqlitePreferences {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, AppError>> {
        async move {
            let value = sqlx::query_scalar::<_, String>("SELECT value FROM preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
            Ok(value)
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            sqlx::query(
                "INSERT INTO preferences (key, value, updated_at_ms) VALUES (?, ?, ?) \
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at_ms=excluded.updated_at_ms",
            )
            .bind(key)
            .bind(value)
            .bind(now_unix_ms())
            .execute(&self.pool)
            .await?;
            Ok(())
        }
        .boxed()
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl PreferencesStore for MemoryPreferences {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, AppError>> {
        let value = self.values.lock().get(key).cloned();
        async move { Ok(value) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), AppError>> {
        self.values.lock().insert(key.to_string(), value);
        async move { Ok(()) }.boxed()
    }
}

pub struct Watchlist<P> {
    store: P,
    write_lock: tokio::sync::Mutex<()>,
}

impl<P: PreferencesStore> Watchlist<P> {
    pub fn new(store: P) -> Self {
        Self {
            store,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn ids(&self) -> Result<Vec<String>, AppError> {
        let Some(raw) = self.store.get(WATCHLIST_KEY).await? else {
            return Ok(Vec::new());
        };

        let mut bytes = raw.into_bytes();
        match simd_json::serde::from_slice::<Vec<String>>(&mut bytes) {
            Ok(ids) => Ok(dedup_preserving_order(ids)),
            Err(error) => {
                warn!(%error, "stored watchlist is not a JSON id list, treating it as empty");
                Ok(Vec::new())
            }
        }
    }

    pub async fn contains(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.ids().await?.iter().any(|entry| entry == id))
    }

    pub async fn add(&self, id: &str) -> Result<Vec<String>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.ids().await?;
        if !ids.iter().any(|entry| entry == id) {
            ids.push(id.to_string());
            self.write(&ids).await?;
        }
        Ok(ids)
    }

    pub async fn remove(&self, id: &str) -> Result<Vec<String>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.ids().await?;
        let before = ids.len();
        ids.retain(|entry| entry != id);
        if ids.len() != before {
            self.write(&ids).await?;
        }
        Ok(ids)
    }

    pub async fn toggle(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.ids().await?;
        let watched = match ids.iter().position(|entry| entry == id) {
            Some(position) => {
                ids.remove(position);
                false
            }
            None => {
                ids.push(id.to_string());
                true
            }
        };
        self.write(&ids).await?;
        Ok(watched)
    }

    pub async fn replace(&self, ids: Vec<String>) -> Result<Vec<String>, AppError> {
        let _guard = self.write_lock.lock().await;
        let ids = dedup_preserving_order(ids);
        self.write(&ids).await?;
        Ok(ids)
    }

    async fn write(&self, ids: &[String]) -> Result<(), AppError> {
        let encoded = simd_json::serde::to_string(&ids)?;
        self.store.set(WATCHLIST_KEY, encoded).await
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should initialize");
        run_migrations(&pool)
            .await
            .expect("migrations should apply");
        pool
    }

    #[tokio::test]
    async fn sqlite_preferences_upsert_last_write_wins() {
        let prefs = SqlitePreferences::new(memory_pool().await);

        assert_eq!(prefs.get("theme").await.expect("get"), None);
        prefs.set("theme", "dark".to_string()).await.expect("set");
        prefs.set("theme", "light".to_string()).await.expect("set");

        assert_eq!(
            prefs.get("theme").await.expect("get"),
            Some("light".to_string())
        );
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let watchlist = Watchlist::new(MemoryPreferences::default());

        assert!(watchlist.toggle("bitcoin").await.expect("toggle"));
        assert!(watchlist.toggle("solana").await.expect("toggle"));
        assert!(watchlist.contains("bitcoin").await.expect("contains"));
        assert!(!watchlist.toggle("bitcoin").await.expect("toggle"));

        assert_eq!(
            watchlist.ids().await.expect("ids"),
            vec!["solana".to_string()]
        );
    }

    #[tokio::test]
    async fn add_and_replace_keep_order_without_duplicates() {
        let watchlist = Watchlist::new(MemoryPreferences::default());

        watchlist.add("eth").await.expect("add");
        watchlist.add("btc").await.expect("add");
        let ids = watchlist.add("eth").await.expect("add");
        assert_eq!(ids, vec!["eth".to_string(), "btc".to_string()]);

        let ids = watchlist
            .replace(vec!["sol".into(), "btc".into(), "sol".into()])
            .await
            .expect("replace");
        assert_eq!(ids, vec!["sol".to_string(), "btc".to_string()]);

        let ids = watchlist.remove("sol").await.expect("remove");
        assert_eq!(ids, vec!["btc".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_value_reads_as_empty() {
        let prefs = MemoryPreferences::default();
        prefs
            .set(WATCHLIST_KEY, "{not json".to_string())
            .await
            .expect("set");
        let watchlist = Watchlist::new(prefs);

        assert!(watchlist.ids().await.expect("ids").is_empty());
        assert!(watchlist.toggle("bitcoin").await.expect("toggle"));
        assert_eq!(
            watchlist.ids().await.expect("ids"),
            vec!["bitcoin".to_string()]
        );
    }

    #[tokio::test]
    async fn watchlist_persists_through_sqlite() {
        let pool = memory_pool().await;
        Watchlist::new(SqlitePreferences::new(pool.clone()))
            .add("bitcoin")
            .await
            .expect("add");

        let reopened = Watchlist::new(SqlitePreferences::new(pool));
        assert_eq!(
            reopened.ids().await.expect("ids"),
            vec!["bitcoin".to_string()]
        );
    }
}
