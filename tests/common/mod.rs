//! Shared Picker API fixtures.
#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_ID: &str = "session-1";

pub fn session_json(id: &str, media_items_set: bool) -> Value {
    json!({
        "id": id,
        "pickerUri": format!("https://photos.google.com/picker/{id}"),
        "pollingConfig": { "pollInterval": "1s", "timeoutIn": "1800s" },
        "expireTime": "2030-01-01T00:00:00Z",
        "mediaItemsSet": media_items_set
    })
}

/// A picked item whose bytes are served from `server` under `/media/<id>`.
pub fn item_json(server: &MockServer, id: &str, filename: &str, mime: &str, created: &str) -> Value {
    let kind = if mime.starts_with("video/") { "VIDEO" } else { "PHOTO" };
    json!({
        "id": id,
        "createTime": created,
        "type": kind,
        "mediaFile": {
            "baseUrl": format!("{}/media/{id}", server.uri()),
            "mimeType": mime,
            "filename": filename
        }
    })
}

pub async fn mount_session(server: &MockServer, id: &str, media_items_set: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/sessions/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(id, media_items_set)))
        .mount(server)
        .await;
}

/// Serve `items` as a single `mediaItems.list` page.
pub async fn mount_items(server: &MockServer, id: &str, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/v1/mediaItems"))
        .and(query_param("sessionId", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mediaItems": items })))
        .mount(server)
        .await;
}

pub async fn mount_media(server: &MockServer, media_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(media_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

pub fn api_base(server: &MockServer) -> String {
    format!("{}/v1", server.uri())
}

pub fn session(id: &str) -> photopick::picker::PickerSession {
    serde_json::from_value(session_json(id, false)).expect("session fixture")
}
