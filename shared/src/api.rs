use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// ============================================================================
// Event API Types
// ============================================================================

/// Body of `POST /events` and `PUT /events/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_event_window"))]
pub struct EventPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: String,

    #[validate(length(max = 500))]
    pub location: String,

    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

fn validate_event_window(payload: &EventPayload) -> Result<(), ValidationError> {
    if payload.end_date < payload.start_date {
        let mut err = ValidationError::new("event_window");
        err.message = Some("end date must not be before start date".into());
        return Err(err);
    }
    Ok(())
}

impl From<&crate::models::Event> for EventPayload {
    fn from(event: &crate::models::Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Query string of `GET /events`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub direction: SortDirection,
}

impl Default for ListEventsQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: "startDate".to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Query string of `GET /events/search`. Unset fields are left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl EventSearchQuery {
    /// Empty strings count as "not given", matching how the search form behaves.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.filter(|t| !t.trim().is_empty());
        self.location = self.location.filter(|l| !l.trim().is_empty());
        self
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error body returned by the events API on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ErrorResponse {
    /// Most specific human-readable text the server gave, if any.
    pub fn detail(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(self.error.as_deref())
    }
}
