//! Catalog data model.
//!
//! Entity structs carry only data; the per-operation input structs name
//! exactly the fields a client may set, and the filter structs parameterize
//! the list queries. Timestamps are unix seconds, formatted by the resource
//! layer on the way out.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub genre: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub artist_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub duration: i64,
    pub album_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

// =============================================================================
// Write inputs
// =============================================================================

#[derive(Debug, Clone)]
pub struct NewArtist {
    pub name: String,
    pub genre: String,
    pub country: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtistPatch {
    pub name: Option<String>,
    pub genre: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub title: String,
    pub year: i32,
    pub artist_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub artist_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub duration: i64,
    pub album_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SongPatch {
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub album_id: Option<i64>,
}

// =============================================================================
// List filters
// =============================================================================

/// A filter field applies whenever it is `Some`, even for an empty string:
/// the original API distinguishes "parameter omitted" from "parameter empty".
#[derive(Debug, Clone, Default)]
pub struct ArtistFilter {
    pub genre: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumFilter {
    pub year: Option<i32>,
    pub artist_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct SongFilter {
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
    pub title: Option<String>,
}

// =============================================================================
// Pagination
// =============================================================================

pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Page numbers are 1-based; both values clamp to at least 1. There is
    /// deliberately no upper bound on `per_page`.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        (self.total.div_ceil(self.per_page as u64)).max(1)
    }
}

// =============================================================================
// Composite results
// =============================================================================

/// An album with its artist looked up; `None` when the artist row has been
/// deleted out from under it.
#[derive(Debug)]
pub struct AlbumWithArtist {
    pub album: Album,
    pub artist: Option<Artist>,
}

/// An album with both relations eagerly fetched, for the single-album view.
#[derive(Debug)]
pub struct AlbumDetails {
    pub album: Album,
    pub artist: Option<Artist>,
    pub songs: Vec<Song>,
}

/// A song with its album and the album's artist looked up, null-safe on both.
#[derive(Debug)]
pub struct SongWithAlbum {
    pub song: Song,
    pub album: Option<Album>,
    pub artist: Option<Artist>,
}

#[derive(Debug)]
pub struct ArtistWithAlbums {
    pub artist: Artist,
    pub albums: Vec<Album>,
}

#[derive(Debug)]
pub struct AlbumWithSongs {
    pub album: Album,
    pub artist: Option<Artist>,
    pub songs: Vec<Song>,
}
