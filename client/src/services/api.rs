use reqwest::Client;
use shared::api::{EventPayload, EventSearchQuery, ListEventsQuery};
use shared::models::{Event, Page};
use validator::Validate;

use super::{decode_json, ensure_success};
use crate::config::AppConfig;
use crate::error::ClientResult;

/// Client for the events REST API
#[derive(Debug, Clone)]
pub struct EventService {
    http: Client,
    base_url: String,
}

impl EventService {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::new(http, config.api_base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    fn event_url(&self, id: i64) -> String {
        format!("{}/events/{}", self.base_url, id)
    }

    pub async fn list_events(&self, query: &ListEventsQuery) -> ClientResult<Page<Event>> {
        tracing::debug!(page = query.page, size = query.size, "Listing events");
        let response = self
            .http
            .get(self.events_url())
            .query(query)
            .send()
            .await?;
        decode_json(response, "Failed to fetch events").await
    }

    pub async fn search_events(&self, query: EventSearchQuery) -> ClientResult<Page<Event>> {
        let query = query.normalized();
        tracing::debug!(?query, "Searching events");
        let response = self
            .http
            .get(format!("{}/search", self.events_url()))
            .query(&query)
            .send()
            .await?;
        decode_json(response, "Failed to search events").await
    }

    pub async fn get_event(&self, id: i64) -> ClientResult<Event> {
        let response = self.http.get(self.event_url(id)).send().await?;
        decode_json(response, "Failed to fetch event").await
    }

    pub async fn create_event(&self, payload: &EventPayload) -> ClientResult<Event> {
        payload.validate()?;
        let response = self
            .http
            .post(self.events_url())
            .json(payload)
            .send()
            .await?;
        let event: Event = decode_json(response, "Failed to create event").await?;
        tracing::info!(id = event.id, title = %event.title, "Created event");
        Ok(event)
    }

    pub async fn update_event(&self, id: i64, payload: &EventPayload) -> ClientResult<Event> {
        payload.validate()?;
        let response = self
            .http
            .put(self.event_url(id))
            .json(payload)
            .send()
            .await?;
        let event: Event = decode_json(response, "Failed to update event").await?;
        tracing::info!(id = event.id, "Updated event");
        Ok(event)
    }

    pub async fn delete_event(&self, id: i64) -> ClientResult<()> {
        let response = self.http.delete(self.event_url(id)).send().await?;
        ensure_success(response, "Failed to delete event").await?;
        tracing::info!(id, "Deleted event");
        Ok(())
    }
}
