use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogRecord {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamingProvider {
    pub provider_id: i64,
    pub provider_name: String,
    pub logo_path: Option<String>,
    pub link: Option<String>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_movie_by_id(&self, id: i64) -> Result<CatalogRecord>;
    async fn get_movie_by_title(&self, title: &str) -> Result<CatalogRecord>;
    async fn get_trending_movies(&self) -> Result<Vec<CatalogRecord>>;
    async fn get_top_rated_movies(&self) -> Result<Vec<CatalogRecord>>;
    /// First subscription provider in the configured watch region, if any.
    async fn get_streaming_provider(&self, id: i64) -> Result<Option<StreamingProvider>>;
}

#[derive(Debug)]
pub struct TMDB {
    api_key: String,
    api_base: String,
    watch_region: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WatchProvidersResponse {
    #[serde(default)]
    results: HashMap<String, RegionProviders>,
}

#[derive(Debug, Deserialize)]
struct RegionProviders {
    link: Option<String>,
    #[serde(default)]
    flatrate: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider_id: i64,
    provider_name: String,
    logo_path: Option<String>,
}

impl TMDB {
    pub fn new(api_key: String, watch_region: String, client: Client) -> Self {
        Self::with_base_url(
            api_key,
            watch_region,
            client,
            "https://api.themoviedb.org/3".to_string(),
        )
    }

    pub fn with_base_url(
        api_key: String,
        watch_region: String,
        client: Client,
        api_base: String,
    ) -> Self {
        Self {
            api_key,
            api_base,
            watch_region,
            client,
        }
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut request = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json");

        for (key, value) in params {
            request = request.query(&[(*key, *value)]);
        }

        tracing::debug!(path, "tmdb request");
        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(Error::NotFound(path.to_string())),
            status => Err(Error::UpstreamStatus {
                service: "tmdb",
                status: status.as_u16(),
            }),
        }
    }

    async fn get_list(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<CatalogRecord>> {
        let page: PagedResponse<CatalogRecord> = self.get_data(path, params).await?;
        Ok(page.results)
    }
}

#[async_trait]
impl Catalog for TMDB {
    async fn get_movie_by_id(&self, id: i64) -> Result<CatalogRecord> {
        self.get_data(&format!("/movie/{}", id), &[]).await
    }

    async fn get_movie_by_title(&self, title: &str) -> Result<CatalogRecord> {
        self.get_list("/search/movie", &[("query", title), ("page", "1")])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(title.to_string()))
    }

    async fn get_trending_movies(&self) -> Result<Vec<CatalogRecord>> {
        self.get_list("/trending/movie/week", &[]).await
    }

    async fn get_top_rated_movies(&self) -> Result<Vec<CatalogRecord>> {
        self.get_list("/movie/top_rated", &[("page", "1")]).await
    }

    async fn get_streaming_provider(&self, id: i64) -> Result<Option<StreamingProvider>> {
        let mut providers: WatchProvidersResponse = self
            .get_data(&format!("/movie/{}/watch/providers", id), &[])
            .await?;
        let Some(region) = providers.results.remove(&self.watch_region) else {
            return Ok(None);
        };

        let link = region.link;
        Ok(region
            .flatrate
            .into_iter()
            .next()
            .map(|entry| StreamingProvider {
                provider_id: entry.provider_id,
                provider_name: entry.provider_name,
                logo_path: entry.logo_path,
                link,
            }))
    }
}
