use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::info;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ApiError, ServerConfig};
use crate::catalog_store::validation;
use crate::catalog_store::{AlbumFilter, ArtistFilter, PageRequest, SongFilter};
use crate::resources::{
    AlbumRecord, AlbumResource, ArtistResource, Paginated, SongRecord, SongResource,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

impl MessageResponse {
    fn deleted(entity: &str) -> Self {
        MessageResponse {
            message: format!("{} deleted successfully", entity),
        }
    }
}

#[derive(Serialize)]
struct ArtistAlbumsResponse {
    artist: ArtistResource,
    albums: Vec<AlbumRecord>,
}

#[derive(Serialize)]
struct AlbumSongsResponse {
    album: AlbumResource,
    songs: Vec<SongRecord>,
}

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Debug, Deserialize)]
struct ArtistListQuery {
    genre: Option<String>,
    country: Option<String>,
    name: Option<String>,
    per_page: Option<u32>,
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AlbumListQuery {
    year: Option<i32>,
    artist_id: Option<i64>,
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SongListQuery {
    min_duration: Option<i64>,
    max_duration: Option<i64>,
    title: Option<String>,
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: env!("GIT_HASH").to_string(),
    };
    Json(stats)
}

// =============================================================================
// Artist handlers
// =============================================================================

async fn list_artists(
    State(store): State<SharedCatalogStore>,
    Query(query): Query<ArtistListQuery>,
) -> Result<Json<Paginated<ArtistResource>>, ApiError> {
    let filter = ArtistFilter {
        genre: query.genre,
        country: query.country,
        name: query.name,
    };
    // per_page is client-controlled with no upper bound, as in the original API
    let page = PageRequest::new(query.page, query.per_page);
    let artists = store.list_artists(&filter, &page)?;
    Ok(Json(Paginated::from_page(artists, |a| ArtistResource::from(a))))
}

async fn create_artist(
    State(store): State<SharedCatalogStore>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<ArtistResource>), ApiError> {
    let input = validation::validate_new_artist(&body).map_err(ApiError::Validation)?;
    let artist = store.create_artist(&input)?;
    Ok((StatusCode::CREATED, Json(ArtistResource::from(&artist))))
}

async fn get_artist(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<ArtistResource>, ApiError> {
    let artist = store.get_artist(id)?.ok_or(ApiError::NotFound("Artist"))?;
    Ok(Json(ArtistResource::from(&artist)))
}

async fn update_artist(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ArtistResource>, ApiError> {
    if !store.artist_exists(id)? {
        return Err(ApiError::NotFound("Artist"));
    }
    let patch = validation::validate_artist_patch(&body).map_err(ApiError::Validation)?;
    let artist = store
        .update_artist(id, &patch)?
        .ok_or(ApiError::NotFound("Artist"))?;
    Ok(Json(ArtistResource::from(&artist)))
}

async fn delete_artist(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !store.delete_artist(id)? {
        return Err(ApiError::NotFound("Artist"));
    }
    Ok(Json(MessageResponse::deleted("Artist")))
}

async fn get_artist_albums(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<ArtistAlbumsResponse>, ApiError> {
    let result = store
        .get_artist_albums(id)?
        .ok_or(ApiError::NotFound("Artist"))?;
    Ok(Json(ArtistAlbumsResponse {
        artist: ArtistResource::from(&result.artist),
        albums: result.albums.iter().map(AlbumRecord::from).collect(),
    }))
}

// =============================================================================
// Album handlers
// =============================================================================

async fn list_albums(
    State(store): State<SharedCatalogStore>,
    Query(query): Query<AlbumListQuery>,
) -> Result<Json<Paginated<AlbumResource>>, ApiError> {
    let filter = AlbumFilter {
        year: query.year,
        artist_id: query.artist_id,
    };
    let page = PageRequest::new(query.page, None);
    let albums = store.list_albums(&filter, &page)?;
    Ok(Json(Paginated::from_page(albums, |a| AlbumResource::from(a))))
}

async fn create_album(
    State(store): State<SharedCatalogStore>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<AlbumResource>), ApiError> {
    let input = validation::validate_new_album(&body, store.as_ref())?;
    let album = store.create_album(&input)?;
    Ok((StatusCode::CREATED, Json(AlbumResource::from(&album))))
}

async fn get_album(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<AlbumResource>, ApiError> {
    let details = store.get_album(id)?.ok_or(ApiError::NotFound("Album"))?;
    Ok(Json(AlbumResource::with_songs(&details)))
}

async fn update_album(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AlbumResource>, ApiError> {
    if !store.album_exists(id)? {
        return Err(ApiError::NotFound("Album"));
    }
    let patch = validation::validate_album_patch(&body, store.as_ref())?;
    let album = store
        .update_album(id, &patch)?
        .ok_or(ApiError::NotFound("Album"))?;
    Ok(Json(AlbumResource::from(&album)))
}

async fn delete_album(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !store.delete_album(id)? {
        return Err(ApiError::NotFound("Album"));
    }
    Ok(Json(MessageResponse::deleted("Album")))
}

async fn get_album_songs(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<AlbumSongsResponse>, ApiError> {
    let result = store
        .get_album_songs(id)?
        .ok_or(ApiError::NotFound("Album"))?;
    Ok(Json(AlbumSongsResponse {
        album: AlbumResource::new(&result.album, result.artist.as_ref()),
        songs: result.songs.iter().map(SongRecord::from).collect(),
    }))
}

// =============================================================================
// Song handlers
// =============================================================================

async fn list_songs(
    State(store): State<SharedCatalogStore>,
    Query(query): Query<SongListQuery>,
) -> Result<Json<Paginated<SongResource>>, ApiError> {
    let filter = SongFilter {
        min_duration: query.min_duration,
        max_duration: query.max_duration,
        title: query.title,
    };
    let page = PageRequest::new(query.page, None);
    let songs = store.list_songs(&filter, &page)?;
    Ok(Json(Paginated::from_page(songs, |s| SongResource::from(s))))
}

async fn create_song(
    State(store): State<SharedCatalogStore>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<SongResource>), ApiError> {
    let input = validation::validate_new_song(&body, store.as_ref())?;
    let song = store.create_song(&input)?;
    Ok((StatusCode::CREATED, Json(SongResource::from(&song))))
}

async fn get_song(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<SongResource>, ApiError> {
    let song = store.get_song(id)?.ok_or(ApiError::NotFound("Song"))?;
    Ok(Json(SongResource::from(&song)))
}

async fn update_song(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SongResource>, ApiError> {
    if store.get_song(id)?.is_none() {
        return Err(ApiError::NotFound("Song"));
    }
    let patch = validation::validate_song_patch(&body, store.as_ref())?;
    let song = store
        .update_song(id, &patch)?
        .ok_or(ApiError::NotFound("Song"))?;
    Ok(Json(SongResource::from(&song)))
}

async fn delete_song(
    State(store): State<SharedCatalogStore>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !store.delete_song(id)? {
        return Err(ApiError::NotFound("Song"));
    }
    Ok(Json(MessageResponse::deleted("Song")))
}

/// Keyword search over song titles. The result is the raw matching records,
/// unpaginated; an empty keyword counts as missing.
async fn search_songs(
    State(store): State<SharedCatalogStore>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SongRecord>>, ApiError> {
    let keyword = match query.q {
        Some(q) if !q.is_empty() => q,
        _ => return Err(ApiError::MissingSearchQuery),
    };
    let songs = store.search_songs(&keyword)?;
    if songs.is_empty() {
        return Err(ApiError::EmptySearchResult);
    }
    Ok(Json(songs.iter().map(SongRecord::from).collect()))
}

// =============================================================================
// Router
// =============================================================================

pub fn make_app(store: SharedCatalogStore, config: ServerConfig) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        store,
    };

    Router::new()
        .route("/", get(home))
        .route("/artists", get(list_artists).post(create_artist))
        .route(
            "/artists/{id}",
            get(get_artist)
                .put(update_artist)
                .patch(update_artist)
                .delete(delete_artist),
        )
        .route("/artists/{id}/albums", get(get_artist_albums))
        .route("/albums", get(list_albums).post(create_album))
        .route(
            "/albums/{id}",
            get(get_album)
                .put(update_album)
                .patch(update_album)
                .delete(delete_album),
        )
        .route("/albums/{id}/songs", get(get_album_songs))
        .route("/songs", get(list_songs).post(create_song))
        .route("/songs/search", get(search_songs))
        .route(
            "/songs/{id}",
            get(get_song)
                .put(update_song)
                .patch(update_song)
                .delete(delete_song),
        )
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

pub async fn run_server(store: SharedCatalogStore, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let app = make_app(store, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
