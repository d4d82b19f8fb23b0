//! Client for the events REST API, with a debounced location autocomplete
//! backed by a Nominatim-compatible geocoder.

pub mod autocomplete;
pub mod cli;
pub mod config;
pub mod error;
pub mod services;

pub use autocomplete::{LocationAutocomplete, LookupConfig, PlaceSearch, Snapshot};
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
pub use services::{EventService, NominatimClient};
