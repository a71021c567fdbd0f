//! End-to-end tests for album endpoints

mod common;

use chrono::{Datelike, Utc};
use common::{TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn create_album_nests_artist_and_date_only_timestamps() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;

    let response = client
        .post(
            "/albums",
            &json!({"title": "Kind of Blue", "year": 1959, "artist_id": artist_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], json!("Kind of Blue"));
    assert_eq!(body["year"], json!(1959));
    assert_eq!(body["artist"]["id"], json!(artist_id));
    assert_eq!(body["artist"]["name"], json!("Miles Davis"));
    assert_eq!(body["artist"]["genre"], json!("Jazz"));

    // Date-only timestamps (YYYY-MM-DD)
    let created_at = body["created_at"].as_str().unwrap();
    assert_eq!(created_at.len(), 10);
    assert_eq!(created_at, Utc::now().format("%Y-%m-%d").to_string());
}

#[tokio::test]
async fn create_album_rejects_out_of_range_years() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;

    let response = client
        .post(
            "/albums",
            &json!({"title": "X", "year": 1899, "artist_id": artist_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"]["year"],
        json!(["The year field must be at least 1900."])
    );

    let next_year = Utc::now().year() + 1;
    let response = client
        .post(
            "/albums",
            &json!({"title": "X", "year": next_year, "artist_id": artist_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Boundary years pass
    let response = client
        .post(
            "/albums",
            &json!({"title": "X", "year": 1900, "artist_id": artist_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = client
        .post(
            "/albums",
            &json!({"title": "X", "year": Utc::now().year(), "artist_id": artist_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn create_album_rejects_unknown_artist_as_validation_error() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post(
            "/albums",
            &json!({"title": "Kind of Blue", "year": 1959, "artist_id": 404}),
        )
        .await;
    // A validation failure, not a storage error
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"]["artist_id"],
        json!(["The selected artist_id is invalid."])
    );
}

#[tokio::test]
async fn create_album_rejects_overlong_title() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;

    let response = client
        .post(
            "/albums",
            &json!({"title": "x".repeat(256), "year": 1959, "artist_id": artist_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"]["title"],
        json!(["The title field must not be greater than 255 characters."])
    );
}

#[tokio::test]
async fn create_album_collects_all_field_failures() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post("/albums", &json!({"year": 1850, "artist_id": 404}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await.unwrap();
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("title"));
    assert!(errors.contains_key("year"));
    assert!(errors.contains_key("artist_id"));
}

// =============================================================================
// List / Get
// =============================================================================

#[tokio::test]
async fn list_albums_filters_by_year_and_artist() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let miles = client.create_artist("Miles Davis", "Jazz", "USA").await;
    let coltrane = client.create_artist("John Coltrane", "Jazz", "USA").await;
    client.create_album("Kind of Blue", 1959, miles).await;
    client.create_album("Giant Steps", 1960, coltrane).await;
    client.create_album("A Love Supreme", 1965, coltrane).await;

    let response = client.get("/albums?year=1959").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["meta"]["total"], json!(1));
    assert_eq!(body["data"][0]["title"], json!("Kind of Blue"));

    let response = client.get(&format!("/albums?artist_id={}", coltrane)).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["meta"]["total"], json!(2));
    // Each list item carries its artist
    assert_eq!(body["data"][0]["artist"]["name"], json!("John Coltrane"));
}

#[tokio::test]
async fn list_albums_uses_fixed_page_size_of_ten() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;
    for i in 0..11 {
        client.create_album(&format!("Album {:02}", i), 1970, artist_id).await;
    }

    let response = client.get("/albums").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["meta"]["total_pages"], json!(2));

    let response = client.get("/albums?page=2").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_album_attaches_artist_and_songs() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;
    let album_id = client.create_album("Kind of Blue", 1959, artist_id).await;
    client.create_song("So What", 545, album_id).await;
    client.create_song("Blue in Green", 337, album_id).await;

    let response = client.get(&format!("/albums/{}", album_id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["artist"]["name"], json!("Miles Davis"));
    let songs = body["songs"].as_array().unwrap();
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0]["title"], json!("So What"));
    assert_eq!(songs[0]["album_id"], json!(album_id));
}

#[tokio::test]
async fn get_missing_album_is_404() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get("/albums/5").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], json!("Album not found"));
}

// =============================================================================
// Update / Delete
// =============================================================================

#[tokio::test]
async fn update_album_preserves_unsupplied_fields() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;
    let album_id = client.create_album("Kind of Blue", 1959, artist_id).await;

    let response = client
        .patch(
            &format!("/albums/{}", album_id),
            &json!({"title": "Kind of Blue (Legacy Edition)"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], json!("Kind of Blue (Legacy Edition)"));
    assert_eq!(body["year"], json!(1959));
    assert_eq!(body["artist"]["id"], json!(artist_id));
}

#[tokio::test]
async fn update_album_validates_supplied_fields_only() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;
    let album_id = client.create_album("Kind of Blue", 1959, artist_id).await;

    let response = client
        .put(&format!("/albums/{}", album_id), &json!({"year": 1800}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"]["year"],
        json!(["The year field must be at least 1900."])
    );
    // title was not supplied, so it is not in the error map
    assert!(body["errors"].get("title").is_none());
}

#[tokio::test]
async fn delete_album_leaves_songs_orphaned() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;
    let album_id = client.create_album("Kind of Blue", 1959, artist_id).await;
    let song_id = client.create_song("So What", 545, album_id).await;

    let response = client.delete(&format!("/albums/{}", album_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], json!("Album deleted successfully"));

    // The song survives; its nested album fields fall back to null
    let response = client.get(&format!("/songs/{}", song_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["album"],
        json!({"id": null, "title": null, "artist": null})
    );
}

// =============================================================================
// Nested listing
// =============================================================================

#[tokio::test]
async fn album_songs_returns_shaped_album_and_raw_songs() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist_id = client.create_artist("Miles Davis", "Jazz", "USA").await;
    let album_id = client.create_album("Kind of Blue", 1959, artist_id).await;
    let song_id = client.create_song("So What", 545, album_id).await;

    let response = client.get(&format!("/albums/{}/songs", album_id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    // The album goes through the resource shape (artist nested)
    assert_eq!(body["album"]["title"], json!("Kind of Blue"));
    assert_eq!(body["album"]["artist"]["name"], json!("Miles Davis"));

    // The songs do not: raw entity records with plain album_id
    let songs = body["songs"].as_array().unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0]["id"], json!(song_id));
    assert_eq!(songs[0]["title"], json!("So What"));
    assert_eq!(songs[0]["duration"], json!(545));
    assert_eq!(songs[0]["album_id"], json!(album_id));
    assert!(songs[0].get("album").is_none());
}

#[tokio::test]
async fn album_songs_for_missing_album_is_404() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get("/albums/9/songs").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
