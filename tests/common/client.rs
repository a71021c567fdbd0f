//! HTTP client wrapper for tests
//!
//! Thin helpers over reqwest plus seeding shortcuts that create entities
//! through the public API and return their ids.

use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

pub struct TestClient {
    base_url: String,
    http: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        TestClient {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.http
            .put(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.http
            .patch(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("PATCH request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.http
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    // =========================================================================
    // Seeding helpers
    // =========================================================================

    pub async fn create_artist(&self, name: &str, genre: &str, country: &str) -> i64 {
        let response = self
            .post(
                "/artists",
                &json!({"name": name, "genre": genre, "country": country}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn create_album(&self, title: &str, year: i32, artist_id: i64) -> i64 {
        let response = self
            .post(
                "/albums",
                &json!({"title": title, "year": year, "artist_id": artist_id}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn create_song(&self, title: &str, duration: i64, album_id: i64) -> i64 {
        let response = self
            .post(
                "/songs",
                &json!({"title": title, "duration": duration, "album_id": album_id}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}
