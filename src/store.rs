use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, FromRow};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PopularityRow {
    pub id: i64,
    pub popularity: f64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub backdrop_path: Option<String>,
}

#[async_trait]
pub trait PopularityStore: Send + Sync {
    async fn top_by_popularity(&self, limit: u32) -> Result<Vec<PopularityRow>>;
}

#[derive(Debug)]
pub struct SqliteStore {
    options: SqliteConnectOptions,
    open: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct Lease(Arc<AtomicUsize>);

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct StoreConnection {
    conn: SqliteConnection,
    _lease: Lease,
}

impl StoreConnection {
    async fn close(self) -> Result<()> {
        let StoreConnection { conn, _lease } = self;
        conn.close().await?;
        Ok(())
    }
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>, busy_timeout: Duration) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(busy_timeout);
        Self {
            options,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Connections currently held by in-flight calls.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    async fn acquire(&self) -> Result<StoreConnection> {
        let conn = SqliteConnection::connect_with(&self.options).await?;
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(StoreConnection {
            conn,
            _lease: Lease(self.open.clone()),
        })
    }
}

#[async_trait]
impl PopularityStore for SqliteStore {
    async fn top_by_popularity(&self, limit: u32) -> Result<Vec<PopularityRow>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query_as::<_, PopularityRow>(
            "SELECT id, \
                 COALESCE(CAST(popularity AS REAL), 0.0) AS popularity, \
                 CAST(title AS TEXT) AS title, \
                 CAST(release_date AS TEXT) AS release_date, \
                 CAST(vote_average AS REAL) AS vote_average, \
                 CAST(backdrop_path AS TEXT) AS backdrop_path \
             FROM movies ORDER BY popularity DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&mut conn.conn)
        .await?;
        conn.close().await?;

        tracing::debug!(rows = rows.len(), "loaded popular movies");
        Ok(rows)
    }
}
