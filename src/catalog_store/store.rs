//! SQLite-backed catalog store implementation.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const ARTIST_COLUMNS: &str = "id, name, genre, country";
const ALBUM_COLUMNS: &str = "id, title, year, artist_id, created_at, updated_at";
const SONG_COLUMNS: &str = "id, title, duration, album_id, created_at, updated_at";

/// SQLite-backed music catalog store.
///
/// A single connection guarded by a mutex; statement execution is serialized,
/// request handlers lock per call.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Open an existing catalog database or create a new one with the current
    /// schema. Existing databases are validated against the expected schema.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open catalog database {:?}", db_path.as_ref()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::initialize(conn)
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        let latest = CATALOG_VERSIONED_SCHEMAS
            .last()
            .context("No schemas defined")?;

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);

        if table_count == 0 {
            info!("Creating catalog db schema at version {}", latest.version);
            latest.create(&conn)?;
        } else {
            let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
            if db_version != (BASE_DB_VERSION + latest.version) as i64 {
                bail!(
                    "Catalog database version {} is not supported (expected {})",
                    db_version,
                    BASE_DB_VERSION + latest.version
                );
            }
            latest.validate(&conn)?;
        }

        let artist_count: i64 = conn.query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))?;
        let album_count: i64 = conn.query_row("SELECT COUNT(*) FROM albums", [], |r| r.get(0))?;
        let song_count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
        info!(
            "Opened music catalog: {} artists, {} albums, {} songs",
            artist_count, album_count, song_count
        );

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // =========================================================================
    // Row parsing
    // =========================================================================

    fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
            genre: row.get(2)?,
            country: row.get(3)?,
        })
    }

    fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
        Ok(Album {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            artist_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            duration: row.get(2)?,
            album_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    // =========================================================================
    // Internal lookups (callers hold the connection lock)
    // =========================================================================

    fn artist_by_id(conn: &Connection, id: i64) -> Result<Option<Artist>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM artists WHERE id = ?1",
            ARTIST_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![id], Self::parse_artist_row)
            .optional()?)
    }

    fn album_by_id(conn: &Connection, id: i64) -> Result<Option<Album>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM albums WHERE id = ?1",
            ALBUM_COLUMNS
        ))?;
        Ok(stmt
            .query_row(params![id], Self::parse_album_row)
            .optional()?)
    }

    fn song_by_id(conn: &Connection, id: i64) -> Result<Option<Song>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs WHERE id = ?1",
            SONG_COLUMNS
        ))?;
        Ok(stmt.query_row(params![id], Self::parse_song_row).optional()?)
    }

    fn albums_by_artist(conn: &Connection, artist_id: i64) -> Result<Vec<Album>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM albums WHERE artist_id = ?1 ORDER BY id",
            ALBUM_COLUMNS
        ))?;
        let albums = stmt
            .query_map(params![artist_id], Self::parse_album_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn songs_by_album(conn: &Connection, album_id: i64) -> Result<Vec<Song>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs WHERE album_id = ?1 ORDER BY id",
            SONG_COLUMNS
        ))?;
        let songs = stmt
            .query_map(params![album_id], Self::parse_song_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    /// Resolve a song's album and the album's artist; both lookups are
    /// null-safe since deletes never cascade.
    fn resolve_song(conn: &Connection, song: Song) -> Result<SongWithAlbum> {
        let album = Self::album_by_id(conn, song.album_id)?;
        let artist = match &album {
            Some(album) => Self::artist_by_id(conn, album.artist_id)?,
            None => None,
        };
        Ok(SongWithAlbum {
            song,
            album,
            artist,
        })
    }

    fn count(conn: &Connection, sql: &str, values: &[SqlValue]) -> Result<u64> {
        let total: i64 =
            conn.query_row(sql, params_from_iter(values.iter().cloned()), |r| r.get(0))?;
        Ok(total as u64)
    }
}

fn where_sql(clauses: &[&str]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

/// `LIKE '%value%'` pattern for the substring filters.
fn contains_pattern(value: &str) -> String {
    format!("%{}%", value)
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Artists
    // =========================================================================

    fn list_artists(&self, filter: &ArtistFilter, page: &PageRequest) -> Result<Page<Artist>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(genre) = &filter.genre {
            clauses.push("genre = ?");
            values.push(SqlValue::Text(genre.clone()));
        }
        if let Some(country) = &filter.country {
            clauses.push("country = ?");
            values.push(SqlValue::Text(country.clone()));
        }
        if let Some(name) = &filter.name {
            clauses.push("name LIKE ?");
            values.push(SqlValue::Text(contains_pattern(name)));
        }
        let where_part = where_sql(&clauses);

        let total = Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM artists{}", where_part),
            &values,
        )?;

        values.push(SqlValue::Integer(page.limit()));
        values.push(SqlValue::Integer(page.offset()));
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artists{} ORDER BY id LIMIT ? OFFSET ?",
            ARTIST_COLUMNS, where_part
        ))?;
        let items = stmt
            .query_map(params_from_iter(values), Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    fn get_artist(&self, id: i64) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        Self::artist_by_id(&conn, id)
    }

    fn create_artist(&self, input: &NewArtist) -> Result<Artist> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO artists (name, genre, country) VALUES (?1, ?2, ?3)",
            params![input.name, input.genre, input.country],
        )?;
        Ok(Artist {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            genre: input.genre.clone(),
            country: input.country.clone(),
        })
    }

    fn update_artist(&self, id: i64, patch: &ArtistPatch) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        if Self::artist_by_id(&conn, id)?.is_none() {
            return Ok(None);
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(name) = &patch.name {
            sets.push("name = ?");
            values.push(SqlValue::Text(name.clone()));
        }
        if let Some(genre) = &patch.genre {
            sets.push("genre = ?");
            values.push(SqlValue::Text(genre.clone()));
        }
        if let Some(country) = &patch.country {
            sets.push("country = ?");
            values.push(SqlValue::Text(country.clone()));
        }
        if !sets.is_empty() {
            values.push(SqlValue::Integer(id));
            conn.execute(
                &format!("UPDATE artists SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values),
            )?;
        }
        Self::artist_by_id(&conn, id)
    }

    fn delete_artist(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn get_artist_albums(&self, id: i64) -> Result<Option<ArtistWithAlbums>> {
        let conn = self.conn.lock().unwrap();
        let artist = match Self::artist_by_id(&conn, id)? {
            Some(artist) => artist,
            None => return Ok(None),
        };
        let albums = Self::albums_by_artist(&conn, id)?;
        Ok(Some(ArtistWithAlbums { artist, albums }))
    }

    fn artist_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        Ok(Self::artist_by_id(&conn, id)?.is_some())
    }

    // =========================================================================
    // Albums
    // =========================================================================

    fn list_albums(
        &self,
        filter: &AlbumFilter,
        page: &PageRequest,
    ) -> Result<Page<AlbumWithArtist>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(year) = filter.year {
            clauses.push("year = ?");
            values.push(SqlValue::Integer(year as i64));
        }
        if let Some(artist_id) = filter.artist_id {
            clauses.push("artist_id = ?");
            values.push(SqlValue::Integer(artist_id));
        }
        let where_part = where_sql(&clauses);

        let total = Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM albums{}", where_part),
            &values,
        )?;

        values.push(SqlValue::Integer(page.limit()));
        values.push(SqlValue::Integer(page.offset()));
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM albums{} ORDER BY id LIMIT ? OFFSET ?",
            ALBUM_COLUMNS, where_part
        ))?;
        let albums = stmt
            .query_map(params_from_iter(values), Self::parse_album_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(albums.len());
        for album in albums {
            let artist = Self::artist_by_id(&conn, album.artist_id)?;
            items.push(AlbumWithArtist { album, artist });
        }

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    fn get_album(&self, id: i64) -> Result<Option<AlbumDetails>> {
        let conn = self.conn.lock().unwrap();
        let album = match Self::album_by_id(&conn, id)? {
            Some(album) => album,
            None => return Ok(None),
        };
        let artist = Self::artist_by_id(&conn, album.artist_id)?;
        let songs = Self::songs_by_album(&conn, id)?;
        Ok(Some(AlbumDetails {
            album,
            artist,
            songs,
        }))
    }

    fn create_album(&self, input: &NewAlbum) -> Result<AlbumWithArtist> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO albums (title, year, artist_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![input.title, input.year, input.artist_id, now],
        )?;
        let album = Album {
            id: conn.last_insert_rowid(),
            title: input.title.clone(),
            year: input.year,
            artist_id: input.artist_id,
            created_at: now,
            updated_at: now,
        };
        let artist = Self::artist_by_id(&conn, input.artist_id)?;
        Ok(AlbumWithArtist { album, artist })
    }

    fn update_album(&self, id: i64, patch: &AlbumPatch) -> Result<Option<AlbumWithArtist>> {
        let conn = self.conn.lock().unwrap();
        if Self::album_by_id(&conn, id)?.is_none() {
            return Ok(None);
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(title) = &patch.title {
            sets.push("title = ?");
            values.push(SqlValue::Text(title.clone()));
        }
        if let Some(year) = patch.year {
            sets.push("year = ?");
            values.push(SqlValue::Integer(year as i64));
        }
        if let Some(artist_id) = patch.artist_id {
            sets.push("artist_id = ?");
            values.push(SqlValue::Integer(artist_id));
        }
        if !sets.is_empty() {
            sets.push("updated_at = ?");
            values.push(SqlValue::Integer(Utc::now().timestamp()));
            values.push(SqlValue::Integer(id));
            conn.execute(
                &format!("UPDATE albums SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values),
            )?;
        }

        match Self::album_by_id(&conn, id)? {
            Some(album) => {
                let artist = Self::artist_by_id(&conn, album.artist_id)?;
                Ok(Some(AlbumWithArtist { album, artist }))
            }
            None => Ok(None),
        }
    }

    fn delete_album(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM albums WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn get_album_songs(&self, id: i64) -> Result<Option<AlbumWithSongs>> {
        let conn = self.conn.lock().unwrap();
        let album = match Self::album_by_id(&conn, id)? {
            Some(album) => album,
            None => return Ok(None),
        };
        let artist = Self::artist_by_id(&conn, album.artist_id)?;
        let songs = Self::songs_by_album(&conn, id)?;
        Ok(Some(AlbumWithSongs {
            album,
            artist,
            songs,
        }))
    }

    fn album_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        Ok(Self::album_by_id(&conn, id)?.is_some())
    }

    // =========================================================================
    // Songs
    // =========================================================================

    fn list_songs(&self, filter: &SongFilter, page: &PageRequest) -> Result<Page<SongWithAlbum>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(min_duration) = filter.min_duration {
            clauses.push("duration >= ?");
            values.push(SqlValue::Integer(min_duration));
        }
        if let Some(max_duration) = filter.max_duration {
            clauses.push("duration <= ?");
            values.push(SqlValue::Integer(max_duration));
        }
        if let Some(title) = &filter.title {
            clauses.push("title LIKE ?");
            values.push(SqlValue::Text(contains_pattern(title)));
        }
        let where_part = where_sql(&clauses);

        let total = Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM songs{}", where_part),
            &values,
        )?;

        values.push(SqlValue::Integer(page.limit()));
        values.push(SqlValue::Integer(page.offset()));
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM songs{} ORDER BY id LIMIT ? OFFSET ?",
            SONG_COLUMNS, where_part
        ))?;
        let songs = stmt
            .query_map(params_from_iter(values), Self::parse_song_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(songs.len());
        for song in songs {
            items.push(Self::resolve_song(&conn, song)?);
        }

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    fn get_song(&self, id: i64) -> Result<Option<SongWithAlbum>> {
        let conn = self.conn.lock().unwrap();
        match Self::song_by_id(&conn, id)? {
            Some(song) => Ok(Some(Self::resolve_song(&conn, song)?)),
            None => Ok(None),
        }
    }

    fn create_song(&self, input: &NewSong) -> Result<SongWithAlbum> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO songs (title, duration, album_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![input.title, input.duration, input.album_id, now],
        )?;
        let song = Song {
            id: conn.last_insert_rowid(),
            title: input.title.clone(),
            duration: input.duration,
            album_id: input.album_id,
            created_at: now,
            updated_at: now,
        };
        Self::resolve_song(&conn, song)
    }

    fn update_song(&self, id: i64, patch: &SongPatch) -> Result<Option<SongWithAlbum>> {
        let conn = self.conn.lock().unwrap();
        if Self::song_by_id(&conn, id)?.is_none() {
            return Ok(None);
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(title) = &patch.title {
            sets.push("title = ?");
            values.push(SqlValue::Text(title.clone()));
        }
        if let Some(duration) = patch.duration {
            sets.push("duration = ?");
            values.push(SqlValue::Integer(duration));
        }
        if let Some(album_id) = patch.album_id {
            sets.push("album_id = ?");
            values.push(SqlValue::Integer(album_id));
        }
        if !sets.is_empty() {
            sets.push("updated_at = ?");
            values.push(SqlValue::Integer(Utc::now().timestamp()));
            values.push(SqlValue::Integer(id));
            conn.execute(
                &format!("UPDATE songs SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values),
            )?;
        }

        match Self::song_by_id(&conn, id)? {
            Some(song) => Ok(Some(Self::resolve_song(&conn, song)?)),
            None => Ok(None),
        }
    }

    fn delete_song(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM songs WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn search_songs(&self, keyword: &str) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs WHERE title LIKE ?1 ORDER BY id",
            SONG_COLUMNS
        ))?;
        let songs = stmt
            .query_map(params![contains_pattern(keyword)], Self::parse_song_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }
}
