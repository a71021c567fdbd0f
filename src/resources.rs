//! JSON output shapes.
//!
//! Two shaping conventions coexist and are intentionally not unified, to stay
//! wire-compatible with the original API: the entity shape (albums nest their
//! artist as a stripped object and carry date-only timestamps) and the song
//! shape (the nested album is flattened, its artist reduced to a bare name
//! string, timestamps at full precision). Nested lookups are null-safe so
//! orphaned rows serialize instead of erroring.

use crate::catalog_store::models::{
    Album, AlbumDetails, AlbumWithArtist, Artist, Page, Song, SongWithAlbum,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

fn format_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn format_datetime(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
        .unwrap_or_default()
}

// =============================================================================
// Entity shape
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ArtistResource {
    pub id: i64,
    pub name: String,
    pub genre: String,
    pub country: String,
}

impl From<&Artist> for ArtistResource {
    fn from(artist: &Artist) -> Self {
        ArtistResource {
            id: artist.id,
            name: artist.name.clone(),
            genre: artist.genre.clone(),
            country: artist.country.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AlbumResource {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub artist: Option<ArtistResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub songs: Option<Vec<SongRecord>>,
    pub created_at: String,
    pub updated_at: String,
}

impl AlbumResource {
    pub fn new(album: &Album, artist: Option<&Artist>) -> Self {
        AlbumResource {
            id: album.id,
            title: album.title.clone(),
            year: album.year,
            artist: artist.map(ArtistResource::from),
            songs: None,
            created_at: format_date(album.created_at),
            updated_at: format_date(album.updated_at),
        }
    }

    /// The single-album view carries the song relation as raw records.
    pub fn with_songs(details: &AlbumDetails) -> Self {
        let mut resource = AlbumResource::new(&details.album, details.artist.as_ref());
        resource.songs = Some(details.songs.iter().map(SongRecord::from).collect());
        resource
    }
}

impl From<&AlbumWithArtist> for AlbumResource {
    fn from(entry: &AlbumWithArtist) -> Self {
        AlbumResource::new(&entry.album, entry.artist.as_ref())
    }
}

// =============================================================================
// Song shape
// =============================================================================

/// The flattened album reference of the song shape: all fields null when the
/// album (or its artist) no longer exists.
#[derive(Debug, Serialize)]
pub struct SongAlbumRef {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongResource {
    pub id: i64,
    pub title: String,
    pub duration: i64,
    pub album: SongAlbumRef,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&SongWithAlbum> for SongResource {
    fn from(entry: &SongWithAlbum) -> Self {
        SongResource {
            id: entry.song.id,
            title: entry.song.title.clone(),
            duration: entry.song.duration,
            album: SongAlbumRef {
                id: entry.album.as_ref().map(|a| a.id),
                title: entry.album.as_ref().map(|a| a.title.clone()),
                artist: entry.artist.as_ref().map(|a| a.name.clone()),
            },
            created_at: format_datetime(entry.song.created_at),
            updated_at: format_datetime(entry.song.updated_at),
        }
    }
}

// =============================================================================
// Raw records
// =============================================================================

/// An album serialized from its own columns only, as the nested listings
/// return it.
#[derive(Debug, Serialize)]
pub struct AlbumRecord {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub artist_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Album> for AlbumRecord {
    fn from(album: &Album) -> Self {
        AlbumRecord {
            id: album.id,
            title: album.title.clone(),
            year: album.year,
            artist_id: album.artist_id,
            created_at: format_datetime(album.created_at),
            updated_at: format_datetime(album.updated_at),
        }
    }
}

/// A song serialized from its own columns only, as the nested listing and
/// the search endpoint return it.
#[derive(Debug, Serialize)]
pub struct SongRecord {
    pub id: i64,
    pub title: String,
    pub duration: i64,
    pub album_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Song> for SongRecord {
    fn from(song: &Song) -> Self {
        SongRecord {
            id: song.id,
            title: song.title.clone(),
            duration: song.duration,
            album_id: song.album_id,
            created_at: format_datetime(song.created_at),
            updated_at: format_datetime(song.updated_at),
        }
    }
}

// =============================================================================
// Pagination envelope
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn from_page<U>(page: Page<U>, shape: impl Fn(&U) -> T) -> Self {
        Paginated {
            meta: PageMeta {
                page: page.page,
                per_page: page.per_page,
                total: page.total,
                total_pages: page.total_pages(),
            },
            data: page.items.iter().map(shape).collect(),
        }
    }
}
