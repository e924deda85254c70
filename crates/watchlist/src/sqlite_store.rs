use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scoring_core::{DataResult, WatchlistEntry, WatchlistStore};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};

/// Row returned from the watchlist query
#[derive(Debug, FromRow)]
struct EntryRow {
    symbol: String,
    name: String,
    score: i64,
    added_at: DateTime<Utc>,
}

impl From<EntryRow> for WatchlistEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            symbol: row.symbol,
            name: row.name,
            score: u32::try_from(row.score).unwrap_or(0),
            added_at: row.added_at,
        }
    }
}

pub struct SqliteWatchlistStore {
    pool: SqlitePool,
}

impl SqliteWatchlistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open `database_url` and make sure the table exists.
    pub async fn connect(database_url: &str) -> DataResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> DataResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS watchlist_entries (
                symbol TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                score INTEGER NOT NULL,
                added_at TEXT NOT NULL,
                position INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for SqliteWatchlistStore {
    async fn load(&self) -> DataResult<Vec<WatchlistEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT symbol, name, score, added_at
            FROM watchlist_entries
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WatchlistEntry::from).collect())
    }

    /// Replaces the stored list in one transaction.
    async fn save(&self, entries: &[WatchlistEntry]) -> DataResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM watchlist_entries")
            .execute(&mut *tx)
            .await?;

        for (position, entry) in entries.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO watchlist_entries (symbol, name, score, added_at, position)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(symbol) DO UPDATE SET
                    name = excluded.name,
                    score = excluded.score,
                    position = excluded.position
                "#,
            )
            .bind(&entry.symbol)
            .bind(&entry.name)
            .bind(entry.score as i64)
            .bind(entry.added_at)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
