use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use shared::models::Place;
use std::collections::HashSet;

use super::decode_json;
use crate::autocomplete::PlaceSearch;
use crate::config::AppConfig;
use crate::error::ClientResult;

pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Forward geocoding against a Nominatim-compatible `/search` endpoint
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: Client,
    base_url: String,
    limit: usize,
}

impl NominatimClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn from_config(config: &AppConfig) -> ClientResult<Self> {
        // Nominatim's usage policy rejects requests without an identifying agent.
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::new(http, config.nominatim_url.clone()).with_limit(config.result_limit))
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?format=json&q={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            self.limit
        )
    }

    pub async fn search(&self, query: &str) -> ClientResult<Vec<Place>> {
        let response = self
            .http
            .get(self.search_url(query))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let places = distinct_places(decode_json(response, "Failed to fetch locations").await?);
        tracing::debug!(query, count = places.len(), "Geocoding search finished");
        Ok(places)
    }
}

/// Keeps the first place seen at each coordinate pair.
fn distinct_places(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| seen.insert(place.key()))
        .collect()
}

#[async_trait]
impl PlaceSearch for NominatimClient {
    async fn search_places(&self, query: &str) -> ClientResult<Vec<Place>> {
        self.search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let client = NominatimClient::new(Client::new(), "https://geo.example.com/");
        assert_eq!(
            client.search_url("Saint-Étienne & co"),
            "https://geo.example.com/search?format=json&q=Saint-%C3%89tienne%20%26%20co&limit=5"
        );
    }

    #[test]
    fn test_places_at_same_coordinates_collapse() {
        let at = |name: &str, lat: &str, lon: &str| Place {
            display_name: name.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
        };
        let places = distinct_places(vec![
            at("Paris, France", "48.85", "2.35"),
            at("Paris, Ile-de-France, France", "48.85", "2.35"),
            at("Paris, Texas", "33.66", "-95.55"),
        ]);
        assert_eq!(
            places.iter().map(|p| p.display_name.as_str()).collect::<Vec<_>>(),
            vec!["Paris, France", "Paris, Texas"]
        );
    }

    #[test]
    fn test_limit_is_at_least_one() {
        let client = NominatimClient::new(Client::new(), "https://geo.example.com").with_limit(0);
        assert!(client.search_url("Par").ends_with("&limit=1"));
    }
}
