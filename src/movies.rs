use futures::future::try_join_all;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Result;
use crate::gemini::QueryRouter;
use crate::sample::{sample, shuffle};
use crate::store::PopularityStore;
use crate::tmdb::{Catalog, CatalogRecord, StreamingProvider};
use crate::youtube::VideoLookup;

const TRENDING_PICKS: usize = 8;
const TOP_RATED_PICKS: usize = 2;
const POPULAR_POOL: u32 = 1000;
const POPULAR_PICKS: usize = 10;
const TRAILER_SUFFIX: &str = "trailer";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMovie {
    pub id: i64,
    pub title: String,
    pub release_date: String,
    pub vote_average: f64,
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub streaming_provider: Option<StreamingProvider>,
}

pub async fn enrich(
    catalog: &dyn Catalog,
    videos: &dyn VideoLookup,
    record: CatalogRecord,
) -> Result<EnrichedMovie> {
    let query = format!("{} {}", record.title, TRAILER_SUFFIX);
    let (video_id, streaming_provider) = tokio::try_join!(
        videos.resolve_video_id(&query),
        catalog.get_streaming_provider(record.id),
    )?;

    Ok(EnrichedMovie {
        id: record.id,
        title: record.title,
        release_date: record.release_date,
        vote_average: record.vote_average,
        backdrop_path: record.backdrop_path,
        video_id,
        streaming_provider,
    })
}

// Output order matches input order; the first failure drops the rest.
async fn enrich_all(
    catalog: &dyn Catalog,
    videos: &dyn VideoLookup,
    records: Vec<CatalogRecord>,
) -> Result<Vec<EnrichedMovie>> {
    try_join_all(
        records
            .into_iter()
            .map(|record| enrich(catalog, videos, record)),
    )
    .await
}

pub async fn movie_details(
    catalog: &dyn Catalog,
    videos: &dyn VideoLookup,
    id: i64,
) -> Result<EnrichedMovie> {
    let record = catalog.get_movie_by_id(id).await?;
    enrich(catalog, videos, record).await
}

pub async fn build_landing_page<R: Rng + Send>(
    catalog: &dyn Catalog,
    videos: &dyn VideoLookup,
    rng: &mut R,
) -> Result<Vec<EnrichedMovie>> {
    let (trending, top_rated) =
        tokio::try_join!(catalog.get_trending_movies(), catalog.get_top_rated_movies())?;
    tracing::debug!(
        trending = trending.len(),
        top_rated = top_rated.len(),
        "landing page pools"
    );

    let mut picks = sample(trending, TRENDING_PICKS, rng);
    picks.extend(sample(top_rated, TOP_RATED_PICKS, rng));
    shuffle(&mut picks, rng);

    enrich_all(catalog, videos, picks).await
}

pub async fn random_popular_movies<R: Rng + Send>(
    store: &dyn PopularityStore,
    catalog: &dyn Catalog,
    videos: &dyn VideoLookup,
    rng: &mut R,
) -> Result<Vec<EnrichedMovie>> {
    let rows = store.top_by_popularity(POPULAR_POOL).await?;
    let ids = sample(
        rows.into_iter().map(|row| row.id).collect(),
        POPULAR_PICKS,
        rng,
    );

    try_join_all(ids.into_iter().map(|id| movie_details(catalog, videos, id))).await
}

pub async fn search_movies(
    router: &dyn QueryRouter,
    catalog: &dyn Catalog,
    videos: &dyn VideoLookup,
    query: &str,
) -> Result<Vec<EnrichedMovie>> {
    let titles = router.suggest_titles(query).await?;

    let lookups = titles.iter().map(|title| async move {
        match catalog.get_movie_by_title(title).await {
            Ok(record) => enrich(catalog, videos, record).await.map(Some),
            Err(err) if err.is_not_found() => {
                tracing::debug!(title = %title, "suggested title not in catalog");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    });

    let movies = try_join_all(lookups).await?;
    Ok(movies.into_iter().flatten().collect())
}
