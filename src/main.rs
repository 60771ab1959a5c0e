use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod gemini;
mod movies;
mod sample;
mod store;
#[cfg(test)]
mod testing;
mod tmdb;
mod youtube;

use config::Config;
use error::Error;
use gemini::{GeminiClient, QueryRouter};
use movies::EnrichedMovie;
use store::{PopularityStore, SqliteStore};
use tmdb::{Catalog, StreamingProvider, TMDB};
use youtube::{VideoLookup, YoutubeSearch};

#[derive(Clone)]
struct AppState {
    catalog: Arc<dyn Catalog>,
    videos: Arc<dyn VideoLookup>,
    store: Arc<dyn PopularityStore>,
    router: Option<Arc<dyn QueryRouter>>,
}

#[derive(Deserialize, ToSchema)]
struct SearchParam {
    #[serde(default)]
    query: String,
}

type MovieList = (StatusCode, Json<Vec<EnrichedMovie>>);

#[derive(OpenApi)]
#[openapi(
    info(
        title = "marquee",
        version = "0.1.0",
        license(
            name = "MIT",
            identifier = "MIT"
        )
    ),
    paths(trending, popular, search, movie, healthcheck),
    components(schemas(EnrichedMovie, StreamingProvider, SearchParam)),
    tags(
        (name = "marquee", description = "Movie discovery endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    let http = http_client(config.upstream_timeout).expect("build http client");

    let router = config.gemini_api_key.as_ref().map(|api_key| {
        Arc::new(GeminiClient::new(
            api_key.clone(),
            config.gemini_model.clone(),
            http.clone(),
        )) as Arc<dyn QueryRouter>
    });
    if router.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; /search is disabled");
    }

    let state = AppState {
        catalog: Arc::new(TMDB::new(
            config.tmdb_api_key.clone(),
            config.watch_region.clone(),
            http.clone(),
        )),
        videos: Arc::new(YoutubeSearch::new(http)),
        store: Arc::new(SqliteStore::new(
            &config.database_path,
            config.upstream_timeout,
        )),
        router,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("bind listener");
    tracing::info!(
        addr = %listener.local_addr().expect("local addr"),
        database = %config.database_path,
        "listening"
    );
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/healthcheck", get(healthcheck).head(healthcheck))
        .route("/trending", get(trending))
        .route("/popular", get(popular))
        .route("/search", get(search))
        .route("/movie/{id}", get(movie))
        .with_state(state)
        .layer(from_fn(request_logging_middleware))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn movie_list(endpoint: &'static str, result: error::Result<Vec<EnrichedMovie>>) -> MovieList {
    match result {
        Ok(movies) => (StatusCode::OK, Json(movies)),
        Err(err) => {
            tracing::error!(endpoint, error = %err, "movie list failed");
            let status = match err {
                Error::SearchUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Json(Vec::new()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/trending",
    responses(
        (status = 200, description = "Eight trending and two top-rated movies", body = [EnrichedMovie]),
        (status = 502, description = "Upstream error, empty list", body = [EnrichedMovie])
    ),
    tag = "marquee"
)]
async fn trending(State(state): State<AppState>) -> MovieList {
    let mut rng = StdRng::from_os_rng();
    let result =
        movies::build_landing_page(state.catalog.as_ref(), state.videos.as_ref(), &mut rng).await;
    movie_list("trending", result)
}

#[utoipa::path(
    get,
    path = "/popular",
    responses(
        (status = 200, description = "Ten random movies from the popularity store", body = [EnrichedMovie]),
        (status = 502, description = "Store or upstream error, empty list", body = [EnrichedMovie])
    ),
    tag = "marquee"
)]
async fn popular(State(state): State<AppState>) -> MovieList {
    let mut rng = StdRng::from_os_rng();
    let result = movies::random_popular_movies(
        state.store.as_ref(),
        state.catalog.as_ref(),
        state.videos.as_ref(),
        &mut rng,
    )
    .await;
    movie_list("popular", result)
}

#[utoipa::path(
    get,
    path = "/search",
    params(
        ("query" = Option<String>, Query, description = "Free-text description of what to watch")
    ),
    responses(
        (status = 200, description = "Movies suggested for the query", body = [EnrichedMovie]),
        (status = 400, description = "Missing or empty query, empty list", body = [EnrichedMovie]),
        (status = 502, description = "Upstream error, empty list", body = [EnrichedMovie]),
        (status = 503, description = "Search is not configured", body = [EnrichedMovie])
    ),
    tag = "marquee"
)]
async fn search(State(state): State<AppState>, Query(params): Query<SearchParam>) -> MovieList {
    let query = params.query.trim();
    if query.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(Vec::new()));
    }

    let result = match &state.router {
        Some(router) => {
            movies::search_movies(
                router.as_ref(),
                state.catalog.as_ref(),
                state.videos.as_ref(),
                query,
            )
            .await
        }
        None => Err(Error::SearchUnavailable),
    };
    movie_list("search", result)
}

#[utoipa::path(
    get,
    path = "/movie/{id}",
    params(
        ("id" = i64, Path, description = "TMDB movie id")
    ),
    responses(
        (status = 200, description = "The enriched movie", body = EnrichedMovie),
        (status = 404, description = "Movie not found"),
        (status = 502, description = "Upstream error")
    ),
    tag = "marquee"
)]
async fn movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EnrichedMovie>, (StatusCode, String)> {
    movies::movie_details(state.catalog.as_ref(), state.videos.as_ref(), id)
        .await
        .map(Json)
        .map_err(|err| {
            if err.is_not_found() {
                return (StatusCode::NOT_FOUND, "movie not found".to_string());
            }
            tracing::error!(id, error = %err, "movie lookup failed");
            (StatusCode::BAD_GATEWAY, "upstream request failed".to_string())
        })
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "OK")
    ),
    tag = "marquee"
)]
async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

async fn request_logging_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path();
    if path == "/healthcheck" {
        return next.run(req).await;
    }

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis(),
        "request"
    );
    response
}
