//! In-process mock of the events API and the geocoder.

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const MISSING_ID: i64 = 404;
pub const GARBLED_ID: i64 = 500;

/// Request log shared between the mock handlers and the test body
#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, line: String) {
        self.requests.lock().unwrap().push(line);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn spawn_server(recorder: Recorder) -> String {
    let app = Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/search", get(search_events))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/geo/search", get(geocode))
        .with_state(recorder);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn event_json(id: i64, title: &str, location: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "location": location,
        "startDate": "2024-05-01T09:00:00",
        "endDate": "2024-05-01T10:00:00",
        "weatherData": "sunny",
        "createdAt": "2024-04-01T10:00:00",
        "updatedAt": "2024-04-01T10:00:00"
    })
}

fn page_json(content: Vec<Value>) -> Value {
    json!({
        "content": content,
        "pageable": {"pageNumber": 0, "pageSize": 10},
        "totalElements": content.len(),
        "totalPages": 1,
        "last": true,
        "first": true,
        "empty": content.is_empty(),
        "numberOfElements": content.len(),
        "size": 10,
        "number": 0
    })
}

fn not_found(id: i64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": 404,
            "error": "Not Found",
            "message": format!("Event {} not found", id),
            "path": format!("/api/events/{}", id)
        })),
    )
        .into_response()
}

async fn list_events(State(rec): State<Recorder>, RawQuery(query): RawQuery) -> Json<Value> {
    rec.record(format!("GET /events?{}", query.unwrap_or_default()));
    Json(page_json(vec![
        event_json(1, "Standup", "Berlin, Germany"),
        event_json(2, "Retro", ""),
    ]))
}

async fn search_events(State(rec): State<Recorder>, RawQuery(query): RawQuery) -> Json<Value> {
    rec.record(format!("GET /events/search?{}", query.unwrap_or_default()));
    Json(page_json(vec![]))
}

async fn get_event(State(rec): State<Recorder>, Path(id): Path<i64>) -> Response {
    rec.record(format!("GET /events/{}", id));
    match id {
        MISSING_ID => not_found(id),
        GARBLED_ID => (StatusCode::OK, "<html>oops</html>").into_response(),
        _ => Json(event_json(id, "Standup", "Berlin, Germany")).into_response(),
    }
}

async fn create_event(State(rec): State<Recorder>, Json(body): Json<Value>) -> Response {
    rec.record(format!("POST /events {}", body));
    let mut event = body;
    event["id"] = json!(42);
    event["createdAt"] = json!("2024-04-01T10:00:00");
    event["updatedAt"] = json!("2024-04-01T10:00:00");
    (StatusCode::CREATED, Json(event)).into_response()
}

async fn update_event(
    State(rec): State<Recorder>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    rec.record(format!("PUT /events/{} {}", id, body));
    if id == MISSING_ID {
        return not_found(id);
    }
    let mut event = body;
    event["id"] = json!(id);
    event["createdAt"] = json!("2024-04-01T10:00:00");
    event["updatedAt"] = json!("2024-04-02T10:00:00");
    Json(event).into_response()
}

async fn delete_event(State(rec): State<Recorder>, Path(id): Path<i64>) -> Response {
    rec.record(format!("DELETE /events/{}", id));
    if id == MISSING_ID {
        return not_found(id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn geocode(
    State(rec): State<Recorder>,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    rec.record(format!("GET /search?{}", raw.unwrap_or_default()));
    let q = params.get("q").map(String::as_str).unwrap_or_default();
    match q {
        "fail" => (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        "Par" => Json(json!([
            {"display_name": "Paris, France", "lat": "48.85", "lon": "2.35"}
        ]))
        .into_response(),
        "Paris" => Json(json!([
            {"display_name": "Paris, France", "lat": "48.85", "lon": "2.35"},
            {"display_name": "Paris, Ile-de-France, France", "lat": "48.85", "lon": "2.35"},
            {"display_name": "Paris, Texas", "lat": "33.66", "lon": "-95.55"}
        ]))
        .into_response(),
        _ => Json(json!([])).into_response(),
    }
}
