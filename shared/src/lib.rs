//! Wire types shared between the events API client and its front ends.

pub mod api;
pub mod models;

pub use api::{EventPayload, EventSearchQuery, ListEventsQuery, SortDirection};
pub use models::{Event, Page, Place};
