use crate::profile::Profile;
use anyhow::Context;
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::PathBuf;

pub const PROFILE_KEY: &str = "snakeUser";
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankBy {
    #[default]
    High,
    Total,
}

impl RankBy {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("total") => Self::Total,
            _ => Self::High,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            Self::High => "high_score DESC, updated_at ASC",
            Self::Total => "total_score DESC, updated_at ASC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub high_score: i64,
    pub total_score: i64,
}

/// SQLite-backed profile snapshot, known profiles and leaderboard.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        ensure_db_dir(database_url)?;
        let mut options = SqlitePoolOptions::new().max_connections(5);
        if is_memory(database_url) {
            // Every connection to `:memory:` is its own database.
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let db = options
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open {database_url}"))?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("failed to run migrations")?;
        Ok(Self { db })
    }

    pub async fn load_profile(&self) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query("SELECT value FROM snapshots WHERE key = ?")
            .bind(PROFILE_KEY)
            .fetch_optional(&self.db)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let value: String = row.try_get("value")?;
        let profile = serde_json::from_str(&value).context("corrupt profile snapshot")?;
        Ok(Some(profile))
    }

    /// Most recently saved profile signed in under `username`.
    pub async fn find_profile(&self, username: &str) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query(
            "SELECT value FROM profiles WHERE username = ? ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let value: String = row.try_get("value")?;
        let profile = serde_json::from_str(&value)
            .with_context(|| format!("corrupt stored profile for {username}"))?;
        Ok(Some(profile))
    }

    /// Overwrites the snapshot and upserts the profile's stored copy and
    /// leaderboard row.
    pub async fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        let value = serde_json::to_string(profile)?;
        let now = current_time_millis();
        let mut tx = self.db.begin().await?;
        sqlx::query(
            "INSERT INTO snapshots (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(PROFILE_KEY)
        .bind(&value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO profiles (profile_id, username, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(profile_id) DO UPDATE SET
               username = excluded.username,
               value = excluded.value,
               updated_at = excluded.updated_at",
        )
        .bind(profile.id.to_string())
        .bind(&profile.username)
        .bind(&value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO leaderboard (profile_id, username, high_score, total_score, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(profile_id) DO UPDATE SET
               username = excluded.username,
               high_score = excluded.high_score,
               total_score = excluded.total_score,
               updated_at = excluded.updated_at",
        )
        .bind(profile.id.to_string())
        .bind(&profile.username)
        .bind(i64::from(profile.high_score))
        .bind(i64::from(profile.total_score))
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn clear_profile(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM snapshots WHERE key = ?")
            .bind(PROFILE_KEY)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn leaderboard(&self, by: RankBy, limit: i64) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let query = format!(
            "SELECT username, high_score, total_score FROM leaderboard ORDER BY {} LIMIT ?",
            by.order_clause()
        );
        let rows = sqlx::query(&query)
            .bind(limit.clamp(1, MAX_LIMIT))
            .fetch_all(&self.db)
            .await?;
        rows.iter()
            .map(|row| {
                Ok::<_, anyhow::Error>(LeaderboardEntry {
                    username: row.try_get("username")?,
                    high_score: row.try_get("high_score")?,
                    total_score: row.try_get("total_score")?,
                })
            })
            .collect()
    }
}

fn is_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.ends_with(":memory:")
}

fn ensure_db_dir(database_url: &str) -> anyhow::Result<()> {
    if is_memory(database_url) {
        return Ok(());
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"));
    let Some(path) = path else { return Ok(()) };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return Ok(());
    }
    let db_path = PathBuf::from(path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if !db_path.exists() {
        std::fs::File::create(&db_path)
            .with_context(|| format!("failed to create {}", db_path.display()))?;
    }
    Ok(())
}

fn current_time_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn profile(name: &str, high_score: u32, total_score: u32) -> Profile {
        let mut profile = Profile::starter(name);
        profile.high_score = high_score;
        profile.total_score = total_score;
        profile
    }

    #[tokio::test]
    async fn empty_store_has_no_profile() {
        let store = memory_store().await;
        assert!(store.load_profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_profile_loads_back() {
        let store = memory_store().await;
        let mut saved = profile("ana", 12, 40);
        saved.purchased_power_ups.push("lemon".to_string());
        store.save_profile(&saved).await.unwrap();
        saved.points = 7;
        store.save_profile(&saved).await.unwrap();
        assert_eq!(store.load_profile().await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn clear_removes_the_snapshot_only() {
        let store = memory_store().await;
        store.save_profile(&profile("ana", 3, 3)).await.unwrap();
        store.clear_profile().await.unwrap();
        assert!(store.load_profile().await.unwrap().is_none());
        assert_eq!(store.leaderboard(RankBy::High, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profiles_are_found_by_name_after_logout() {
        let store = memory_store().await;
        let mut saved = profile("ana", 12, 40);
        saved.points = 33;
        store.save_profile(&saved).await.unwrap();
        store.save_profile(&profile("bea", 1, 1)).await.unwrap();
        store.clear_profile().await.unwrap();

        assert_eq!(store.find_profile("ana").await.unwrap(), Some(saved));
        assert!(store.find_profile("cleo").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resaving_a_profile_keeps_one_leaderboard_row() {
        let store = memory_store().await;
        let mut saved = profile("ana", 5, 5);
        store.save_profile(&saved).await.unwrap();
        let found = store.find_profile("ana").await.unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        saved.high_score = 9;
        store.save_profile(&saved).await.unwrap();
        let board = store.leaderboard(RankBy::High, 10).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].high_score, 9);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_requested_column() {
        let store = memory_store().await;
        store.save_profile(&profile("sprinter", 90, 100)).await.unwrap();
        store.save_profile(&profile("grinder", 20, 900)).await.unwrap();
        store.save_profile(&profile("casual", 5, 10)).await.unwrap();

        let by_high = store.leaderboard(RankBy::High, 10).await.unwrap();
        let names: Vec<_> = by_high.iter().map(|entry| entry.username.as_str()).collect();
        assert_eq!(names, ["sprinter", "grinder", "casual"]);

        let by_total = store.leaderboard(RankBy::Total, 2).await.unwrap();
        let names: Vec<_> = by_total.iter().map(|entry| entry.username.as_str()).collect();
        assert_eq!(names, ["grinder", "sprinter"]);
    }

    #[tokio::test]
    async fn leaderboard_row_follows_profile_updates() {
        let store = memory_store().await;
        let mut saved = profile("ana", 1, 1);
        store.save_profile(&saved).await.unwrap();
        saved.high_score = 30;
        saved.username = "ana b".to_string();
        store.save_profile(&saved).await.unwrap();
        let board = store.leaderboard(RankBy::High, 10).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, "ana b");
        assert_eq!(board[0].high_score, 30);
    }
}
