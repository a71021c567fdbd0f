//! Per-operation input validation.
//!
//! Each write endpoint has a validator that checks the raw JSON body against
//! the operation's field rules and produces the typed input struct. Failures
//! are collected per field and surfaced together, never one at a time; the
//! foreign-key existence checks run through the store and report as field
//! errors, not storage errors.

use super::models::{AlbumPatch, ArtistPatch, NewAlbum, NewArtist, NewSong, SongPatch};
use super::trait_def::CatalogStore;
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const MIN_ALBUM_YEAR: i64 = 1900;
const MAX_ALBUM_TITLE_CHARS: usize = 255;

/// Field failures keyed by field name, in the order fields are declared to
/// fail is irrelevant: the map keeps them sorted by field for stable output.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Outcome of a validator: field failures or a storage error from a
/// reference check.
#[derive(Debug)]
pub enum ValidationFailure {
    Invalid(ValidationErrors),
    Storage(anyhow::Error),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::Invalid(errors) => write!(f, "{}", errors),
            ValidationFailure::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ValidationFailure {}

impl From<anyhow::Error> for ValidationFailure {
    fn from(err: anyhow::Error) -> Self {
        ValidationFailure::Storage(err)
    }
}

// =============================================================================
// Field extraction
// =============================================================================

fn required_string(data: &Value, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match data.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", field));
            None
        }
    }
}

fn optional_string(data: &Value, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match data.get(field) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", field));
            None
        }
    }
}

fn required_integer(data: &Value, field: &str, errors: &mut ValidationErrors) -> Option<i64> {
    match data.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, format!("The {} field is required.", field));
            None
        }
        Some(value) => match value.as_i64() {
            Some(n) => Some(n),
            None => {
                errors.add(field, format!("The {} field must be an integer.", field));
                None
            }
        },
    }
}

fn optional_integer(data: &Value, field: &str, errors: &mut ValidationErrors) -> Option<i64> {
    match data.get(field) {
        None => None,
        Some(value) => match value.as_i64() {
            Some(n) => Some(n),
            None => {
                errors.add(field, format!("The {} field must be an integer.", field));
                None
            }
        },
    }
}

fn check_max_chars(
    value: String,
    field: &str,
    max: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    if value.chars().count() > max {
        errors.add(
            field,
            format!(
                "The {} field must not be greater than {} characters.",
                field, max
            ),
        );
        None
    } else {
        Some(value)
    }
}

fn check_year_range(year: i64, errors: &mut ValidationErrors) -> Option<i32> {
    let current_year = Utc::now().year() as i64;
    if year < MIN_ALBUM_YEAR {
        errors.add(
            "year",
            format!("The year field must be at least {}.", MIN_ALBUM_YEAR),
        );
        None
    } else if year > current_year {
        errors.add(
            "year",
            format!("The year field must not be greater than {}.", current_year),
        );
        None
    } else {
        Some(year as i32)
    }
}

fn check_artist_exists(
    artist_id: i64,
    store: &dyn CatalogStore,
    errors: &mut ValidationErrors,
) -> Result<(), ValidationFailure> {
    if !store.artist_exists(artist_id)? {
        errors.add("artist_id", "The selected artist_id is invalid.".to_string());
    }
    Ok(())
}

fn check_album_exists(
    album_id: i64,
    store: &dyn CatalogStore,
    errors: &mut ValidationErrors,
) -> Result<(), ValidationFailure> {
    if !store.album_exists(album_id)? {
        errors.add("album_id", "The selected album_id is invalid.".to_string());
    }
    Ok(())
}

// =============================================================================
// Artist operations
// =============================================================================

pub fn validate_new_artist(data: &Value) -> Result<NewArtist, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let name = required_string(data, "name", &mut errors);
    let genre = required_string(data, "genre", &mut errors);
    let country = required_string(data, "country", &mut errors);

    match (name, genre, country) {
        (Some(name), Some(genre), Some(country)) => Ok(NewArtist {
            name,
            genre,
            country,
        }),
        _ => Err(errors),
    }
}

pub fn validate_artist_patch(data: &Value) -> Result<ArtistPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let patch = ArtistPatch {
        name: optional_string(data, "name", &mut errors),
        genre: optional_string(data, "genre", &mut errors),
        country: optional_string(data, "country", &mut errors),
    };

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

// =============================================================================
// Album operations
// =============================================================================

pub fn validate_new_album(
    data: &Value,
    store: &dyn CatalogStore,
) -> Result<NewAlbum, ValidationFailure> {
    let mut errors = ValidationErrors::default();
    let title = required_string(data, "title", &mut errors)
        .and_then(|t| check_max_chars(t, "title", MAX_ALBUM_TITLE_CHARS, &mut errors));
    let year =
        required_integer(data, "year", &mut errors).and_then(|y| check_year_range(y, &mut errors));
    let artist_id = required_integer(data, "artist_id", &mut errors);
    if let Some(artist_id) = artist_id {
        check_artist_exists(artist_id, store, &mut errors)?;
    }

    match (title, year, artist_id) {
        (Some(title), Some(year), Some(artist_id)) if errors.is_empty() => Ok(NewAlbum {
            title,
            year,
            artist_id,
        }),
        _ => Err(ValidationFailure::Invalid(errors)),
    }
}

pub fn validate_album_patch(
    data: &Value,
    store: &dyn CatalogStore,
) -> Result<AlbumPatch, ValidationFailure> {
    let mut errors = ValidationErrors::default();
    let title = optional_string(data, "title", &mut errors)
        .and_then(|t| check_max_chars(t, "title", MAX_ALBUM_TITLE_CHARS, &mut errors));
    let year =
        optional_integer(data, "year", &mut errors).and_then(|y| check_year_range(y, &mut errors));
    let artist_id = optional_integer(data, "artist_id", &mut errors);
    if let Some(artist_id) = artist_id {
        check_artist_exists(artist_id, store, &mut errors)?;
    }

    if errors.is_empty() {
        Ok(AlbumPatch {
            title,
            year,
            artist_id,
        })
    } else {
        Err(ValidationFailure::Invalid(errors))
    }
}

// =============================================================================
// Song operations
// =============================================================================

pub fn validate_new_song(
    data: &Value,
    store: &dyn CatalogStore,
) -> Result<NewSong, ValidationFailure> {
    let mut errors = ValidationErrors::default();
    let title = required_string(data, "title", &mut errors);
    let duration = required_integer(data, "duration", &mut errors);
    let album_id = required_integer(data, "album_id", &mut errors);
    if let Some(album_id) = album_id {
        check_album_exists(album_id, store, &mut errors)?;
    }

    match (title, duration, album_id) {
        (Some(title), Some(duration), Some(album_id)) if errors.is_empty() => Ok(NewSong {
            title,
            duration,
            album_id,
        }),
        _ => Err(ValidationFailure::Invalid(errors)),
    }
}

pub fn validate_song_patch(
    data: &Value,
    store: &dyn CatalogStore,
) -> Result<SongPatch, ValidationFailure> {
    let mut errors = ValidationErrors::default();
    let title = optional_string(data, "title", &mut errors);
    let duration = optional_integer(data, "duration", &mut errors);
    let album_id = optional_integer(data, "album_id", &mut errors);
    if let Some(album_id) = album_id {
        check_album_exists(album_id, store, &mut errors)?;
    }

    if errors.is_empty() {
        Ok(SongPatch {
            title,
            duration,
            album_id,
        })
    } else {
        Err(ValidationFailure::Invalid(errors))
    }
}
