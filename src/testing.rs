use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::gemini::QueryRouter;
use crate::store::{PopularityRow, PopularityStore};
use crate::tmdb::{Catalog, CatalogRecord, StreamingProvider};
use crate::youtube::VideoLookup;

pub fn record(id: i64, title: &str) -> CatalogRecord {
    CatalogRecord {
        id,
        title: title.to_string(),
        release_date: "2001-01-01".to_string(),
        vote_average: 7.0,
        backdrop_path: Some(format!("/{id}.jpg")),
    }
}

pub fn pool(ids: std::ops::RangeInclusive<i64>) -> Vec<CatalogRecord> {
    ids.map(|id| record(id, &format!("Movie {id}"))).collect()
}

#[derive(Default)]
pub struct FakeCatalog {
    pub trending: Vec<CatalogRecord>,
    pub top_rated: Vec<CatalogRecord>,
    pub by_title: HashMap<String, CatalogRecord>,
    pub failing_provider: HashSet<i64>,
    pub provider_calls: Mutex<Vec<i64>>,
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn get_movie_by_id(&self, id: i64) -> Result<CatalogRecord> {
        if id < 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(record(id, &format!("Movie {id}")))
    }

    async fn get_movie_by_title(&self, title: &str) -> Result<CatalogRecord> {
        self.by_title
            .get(title)
            .cloned()
            .ok_or_else(|| Error::NotFound(title.to_string()))
    }

    async fn get_trending_movies(&self) -> Result<Vec<CatalogRecord>> {
        Ok(self.trending.clone())
    }

    async fn get_top_rated_movies(&self) -> Result<Vec<CatalogRecord>> {
        Ok(self.top_rated.clone())
    }

    async fn get_streaming_provider(&self, id: i64) -> Result<Option<StreamingProvider>> {
        self.provider_calls.lock().unwrap().push(id);
        if self.failing_provider.contains(&id) {
            return Err(Error::UpstreamStatus {
                service: "tmdb",
                status: 503,
            });
        }
        Ok(Some(StreamingProvider {
            provider_id: id * 10,
            provider_name: format!("Provider {id}"),
            logo_path: None,
            link: None,
        }))
    }
}

pub struct FakeVideos;

#[async_trait]
impl VideoLookup for FakeVideos {
    async fn resolve_video_id(&self, query: &str) -> Result<Option<String>> {
        if query.contains("obscure") {
            return Ok(None);
        }
        let padded = format!("{:_<11}", query.replace(' ', "-"));
        Ok(Some(padded.chars().take(11).collect()))
    }
}

pub struct FakeStore {
    pub rows: Vec<PopularityRow>,
    pub requested: Mutex<Option<u32>>,
}

#[async_trait]
impl PopularityStore for FakeStore {
    async fn top_by_popularity(&self, limit: u32) -> Result<Vec<PopularityRow>> {
        *self.requested.lock().unwrap() = Some(limit);
        Ok(self.rows.iter().take(limit as usize).cloned().collect())
    }
}

pub struct FakeRouter(pub Vec<&'static str>);

#[async_trait]
impl QueryRouter for FakeRouter {
    async fn suggest_titles(&self, _query: &str) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|title| title.to_string()).collect())
    }
}

pub const MOVIES_SCHEMA: &str = "CREATE TABLE movies (
    id INTEGER PRIMARY KEY,
    popularity REAL NOT NULL,
    title TEXT NOT NULL,
    release_date TEXT,
    vote_average REAL,
    backdrop_path TEXT
)";

pub async fn seed_db(statements: &[&str]) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("movies.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("create db");
    for statement in statements {
        sqlx::query(statement)
            .execute(&mut conn)
            .await
            .expect("seed db");
    }
    conn.close().await.expect("close seed connection");
    (dir, path)
}
