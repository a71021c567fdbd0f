//! CatalogStore trait definition.
//!
//! One repository surface per entity: list (filtered + paginated), get,
//! create, update, delete, plus the explicit relation-fetching methods the
//! nested endpoints need. Methods that join relations say so in their name
//! and return a composite struct; nothing is loaded implicitly.

use super::models::*;
use anyhow::Result;

pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn list_artists(&self, filter: &ArtistFilter, page: &PageRequest) -> Result<Page<Artist>>;

    fn get_artist(&self, id: i64) -> Result<Option<Artist>>;

    fn create_artist(&self, input: &NewArtist) -> Result<Artist>;

    /// Apply a partial update. Returns `None` when the id does not exist.
    fn update_artist(&self, id: i64, patch: &ArtistPatch) -> Result<Option<Artist>>;

    /// Hard delete. Returns `false` when the id does not exist. Dependent
    /// albums are left in place, referencing the removed id.
    fn delete_artist(&self, id: i64) -> Result<bool>;

    /// Fetch an artist together with all of its albums, unpaginated.
    fn get_artist_albums(&self, id: i64) -> Result<Option<ArtistWithAlbums>>;

    /// Existence probe used by the validation layer's reference checks.
    fn artist_exists(&self, id: i64) -> Result<bool>;

    // =========================================================================
    // Albums
    // =========================================================================

    /// Each page item carries the album's artist (null-safe).
    fn list_albums(&self, filter: &AlbumFilter, page: &PageRequest)
        -> Result<Page<AlbumWithArtist>>;

    /// Fetch an album with artist and songs eagerly attached.
    fn get_album(&self, id: i64) -> Result<Option<AlbumDetails>>;

    fn create_album(&self, input: &NewAlbum) -> Result<AlbumWithArtist>;

    fn update_album(&self, id: i64, patch: &AlbumPatch) -> Result<Option<AlbumWithArtist>>;

    /// Hard delete; songs of the album are not cascaded.
    fn delete_album(&self, id: i64) -> Result<bool>;

    /// Fetch an album together with all of its songs, unpaginated.
    fn get_album_songs(&self, id: i64) -> Result<Option<AlbumWithSongs>>;

    fn album_exists(&self, id: i64) -> Result<bool>;

    // =========================================================================
    // Songs
    // =========================================================================

    /// Each page item carries the song's album and that album's artist.
    fn list_songs(&self, filter: &SongFilter, page: &PageRequest) -> Result<Page<SongWithAlbum>>;

    fn get_song(&self, id: i64) -> Result<Option<SongWithAlbum>>;

    fn create_song(&self, input: &NewSong) -> Result<SongWithAlbum>;

    fn update_song(&self, id: i64, patch: &SongPatch) -> Result<Option<SongWithAlbum>>;

    fn delete_song(&self, id: i64) -> Result<bool>;

    /// Keyword search over song titles only (substring match), unpaginated.
    fn search_songs(&self, keyword: &str) -> Result<Vec<Song>>;
}
