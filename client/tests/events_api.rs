mod common;

use chrono::{NaiveDate, NaiveDateTime};
use events_client::{ClientError, EventService};
use shared::api::{EventPayload, EventSearchQuery, ListEventsQuery, SortDirection};
use tokio_test::assert_ok;

use common::{spawn_server, Recorder, GARBLED_ID, MISSING_ID};

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

async fn service() -> (EventService, Recorder) {
    let recorder = Recorder::default();
    let base = spawn_server(recorder.clone()).await;
    let service = EventService::new(reqwest::Client::new(), format!("{}/api/", base));
    (service, recorder)
}

fn payload() -> EventPayload {
    EventPayload {
        title: "Launch".to_string(),
        description: "Release party".to_string(),
        location: "Paris, France".to_string(),
        start_date: at(18),
        end_date: at(22),
    }
}

#[tokio::test]
async fn test_list_events_uses_default_sort() {
    let (service, recorder) = service().await;

    let page = assert_ok!(service.list_events(&ListEventsQuery::default()).await);
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].title, "Standup");
    assert!(!page.has_next());

    assert_eq!(
        recorder.requests(),
        vec!["GET /events?page=0&size=10&sortBy=startDate&direction=desc"]
    );
}

#[tokio::test]
async fn test_list_events_custom_page() {
    let (service, recorder) = service().await;
    let query = ListEventsQuery {
        page: 3,
        size: 25,
        sort_by: "title".to_string(),
        direction: SortDirection::Asc,
    };
    assert_ok!(service.list_events(&query).await);
    assert_eq!(
        recorder.requests(),
        vec!["GET /events?page=3&size=25&sortBy=title&direction=asc"]
    );
}

#[tokio::test]
async fn test_search_only_sends_given_filters() {
    let (service, recorder) = service().await;
    let query = EventSearchQuery {
        title: Some("team day".to_string()),
        location: Some(String::new()),
        start_date: Some(at(9)),
        page: Some(1),
        ..Default::default()
    };

    let page = assert_ok!(service.search_events(query).await);
    assert!(page.content.is_empty());
    assert_eq!(
        recorder.requests(),
        vec!["GET /events/search?title=team+day&startDate=2024-06-03T09%3A00%3A00&page=1"]
    );
}

#[tokio::test]
async fn test_get_event() {
    let (service, _) = service().await;
    let event = assert_ok!(service.get_event(7).await);
    assert_eq!(event.id, 7);
    assert_eq!(event.weather_data.as_deref(), Some("sunny"));
}

#[tokio::test]
async fn test_missing_event_reports_server_detail() {
    let (service, _) = service().await;
    let err = service.get_event(MISSING_ID).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "Failed to fetch event (HTTP 404 Not Found): Event 404 not found"
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (service, _) = service().await;
    let err = service.get_event(GARBLED_ID).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_create_event_posts_camel_case_body() {
    let (service, recorder) = service().await;

    let event = assert_ok!(service.create_event(&payload()).await);
    assert_eq!(event.id, 42);
    assert_eq!(event.title, "Launch");
    assert_eq!(event.end_date, at(22));

    let requests = recorder.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /events "));
    assert!(requests[0].contains(r#""startDate":"2024-06-03T18:00:00""#));
}

#[tokio::test]
async fn test_invalid_payload_is_not_sent() {
    let (service, recorder) = service().await;
    let bad = EventPayload {
        start_date: at(22),
        end_date: at(18),
        ..payload()
    };

    let err = service.create_event(&bad).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(recorder.requests().is_empty());
}

#[tokio::test]
async fn test_update_event() {
    let (service, recorder) = service().await;
    let event = assert_ok!(service.update_event(9, &payload()).await);
    assert_eq!(event.id, 9);
    assert!(recorder.requests()[0].starts_with("PUT /events/9 "));

    let err = service.update_event(MISSING_ID, &payload()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("Failed to update event"));
}

#[tokio::test]
async fn test_delete_event() {
    let (service, recorder) = service().await;
    assert_ok!(service.delete_event(5).await);

    let err = service.delete_event(MISSING_ID).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to delete event"));
    assert_eq!(
        recorder.requests(),
        vec!["DELETE /events/5", "DELETE /events/404"]
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let service = EventService::new(reqwest::Client::new(), "http://127.0.0.1:9/");
    assert_eq!(service.base_url(), "http://127.0.0.1:9");
    let err = service.get_event(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
