use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use shared::api::{EventPayload, EventSearchQuery, ListEventsQuery, SortDirection};
use shared::models::{Event, Page, Place};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::autocomplete::{LocationAutocomplete, LookupConfig, LookupState, PlaceSearch, Snapshot};
use crate::config::{normalize_url, AppConfig};
use crate::services::{EventService, NominatimClient};

#[derive(Parser)]
#[command(name = "events")]
#[command(about = "Manage events and look up locations via the events API")]
pub struct Cli {
    /// Events API base URL, overriding EVENTS_API_BASE_URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Nominatim-compatible geocoder base URL, overriding EVENTS_NOMINATIM_URL
    #[arg(long, value_name = "URL")]
    pub geocoder_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List events, newest start date first by default
    List {
        /// Zero-based page index
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        #[arg(short, long, default_value_t = 10)]
        size: u32,

        #[arg(long, default_value = "startDate")]
        sort_by: String,

        /// Sort direction: asc or desc
        #[arg(long, default_value = "desc", value_parser = parse_direction)]
        direction: SortDirection,
    },

    /// Search events by title, location and date range
    Search {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// Only events starting at or after this time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_datetime)]
        from: Option<NaiveDateTime>,

        /// Only events ending at or before this time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_datetime)]
        to: Option<NaiveDateTime>,

        #[arg(short, long)]
        page: Option<u32>,

        #[arg(short, long)]
        size: Option<u32>,
    },

    /// Show one event in full
    Show { id: i64 },

    /// Create a new event
    Create {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, default_value = "", conflicts_with = "pick_location")]
        location: String,

        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,

        #[arg(long, value_parser = parse_datetime)]
        end: NaiveDateTime,

        /// Choose the location interactively with the autocomplete picker
        #[arg(long)]
        pick_location: bool,
    },

    /// Update an existing event. Only the given fields change.
    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long, value_parser = parse_datetime)]
        start: Option<NaiveDateTime>,

        #[arg(long, value_parser = parse_datetime)]
        end: Option<NaiveDateTime>,
    },

    /// Permanently delete an event
    Delete { id: i64 },

    /// One-shot geocoding search
    Places { query: String },

    /// Interactive location picker.
    ///
    /// Every line read from stdin replaces the query, as if typed into the
    /// field. `:N` picks suggestion N, `:q` quits.
    Locate,
}

pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let raw = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got {:?}", raw))
}

fn parse_direction(raw: &str) -> Result<SortDirection, String> {
    match raw.to_ascii_lowercase().as_str() {
        "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        other => Err(format!("expected asc or desc, got {:?}", other)),
    }
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(url) = &cli.api_url {
        config.api_base_url = normalize_url("--api-url", url)?;
    }
    if let Some(url) = &cli.geocoder_url {
        config.nominatim_url = normalize_url("--geocoder-url", url)?;
    }

    let events = EventService::from_config(&config)?;
    let geocoder = NominatimClient::from_config(&config)?;
    tracing::debug!(api = events.base_url(), geocoder = %config.nominatim_url, "Clients ready");

    match cli.command {
        Commands::List {
            page,
            size,
            sort_by,
            direction,
        } => {
            let query = ListEventsQuery {
                page,
                size,
                sort_by,
                direction,
            };
            let page = events.list_events(&query).await?;
            print_page(&page);
        }
        Commands::Search {
            title,
            location,
            from,
            to,
            page,
            size,
        } => {
            let query = EventSearchQuery {
                title,
                location,
                start_date: from,
                end_date: to,
                page,
                size,
            };
            let page = events.search_events(query).await?;
            print_page(&page);
        }
        Commands::Show { id } => {
            let event = events.get_event(id).await?;
            print!("{}", format_event_details(&event));
        }
        Commands::Create {
            title,
            description,
            location,
            start,
            end,
            pick_location,
        } => {
            let location = if pick_location {
                match pick_place(Arc::new(geocoder), config.lookup()).await? {
                    Some(place) => place.display_name,
                    None => bail!("No location picked, event not created"),
                }
            } else {
                location
            };
            let payload = EventPayload {
                title,
                description,
                location,
                start_date: start,
                end_date: end,
            };
            let event = events.create_event(&payload).await?;
            println!("Created event: {}", format_event_line(&event));
        }
        Commands::Update {
            id,
            title,
            description,
            location,
            start,
            end,
        } => {
            let current = events
                .get_event(id)
                .await
                .with_context(|| format!("Cannot update event {}", id))?;
            let mut payload = EventPayload::from(&current);
            if let Some(title) = title {
                payload.title = title;
            }
            if let Some(description) = description {
                payload.description = description;
            }
            if let Some(location) = location {
                payload.location = location;
            }
            if let Some(start) = start {
                payload.start_date = start;
            }
            if let Some(end) = end {
                payload.end_date = end;
            }
            let event = events.update_event(id, &payload).await?;
            println!("Updated event: {}", format_event_line(&event));
        }
        Commands::Delete { id } => {
            events.delete_event(id).await?;
            println!("Deleted event: {}", id);
        }
        Commands::Places { query } => {
            if query.trim().is_empty() {
                bail!("Location query must not be empty");
            }
            let places = geocoder.search(&query).await?;
            if places.is_empty() {
                println!("No location found.");
            }
            for (i, place) in places.iter().enumerate() {
                println!("{}", format_place(i, place));
            }
        }
        Commands::Locate => {
            if let Some(place) = pick_place(Arc::new(geocoder), config.lookup()).await? {
                println!("Selected: {}", place.display_name);
                if let Some((lat, lon)) = place.coordinates() {
                    println!("    Coordinates: {}, {}", lat, lon);
                }
            }
        }
    }

    Ok(())
}

/// Runs the picker on stdin and stdout.
pub async fn pick_place(
    search: Arc<dyn PlaceSearch>,
    config: LookupConfig,
) -> anyhow::Result<Option<Place>> {
    let stdin = BufReader::new(tokio::io::stdin());
    pick_place_from(search, config, stdin, &mut std::io::stdout()).await
}

/// Drives a `LocationAutocomplete` from `input` until a suggestion is picked,
/// `:q` is entered or input ends. Suggestions are written to `out`.
pub async fn pick_place_from<R, W>(
    search: Arc<dyn PlaceSearch>,
    config: LookupConfig,
    input: R,
    out: &mut W,
) -> anyhow::Result<Option<Place>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lookup = LocationAutocomplete::spawn(search, config);
    let mut snapshots = lookup.subscribe();
    let mut lines = input.lines();

    writeln!(out, "Search location... (:N to pick, :q to quit)")?;

    let picked = loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break None;
                };
                match parse_picker_input(&line) {
                    PickerInput::Quit => break None,
                    PickerInput::Pick(index) => lookup.select_suggestion(index),
                    PickerInput::Query(query) => lookup.set_query(query),
                    PickerInput::Invalid(msg) => eprintln!("{}", msg),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break None;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                for line in render_snapshot(&snapshot) {
                    writeln!(out, "{}", line)?;
                }
            }
            selection = lookup.next_selection() => break selection,
        }
    };

    lookup.shutdown().await;
    Ok(picked)
}

#[derive(Debug, PartialEq, Eq)]
enum PickerInput {
    Query(String),
    /// Zero-based index into the current suggestions
    Pick(usize),
    Quit,
    Invalid(String),
}

fn parse_picker_input(line: &str) -> PickerInput {
    let Some(command) = line.trim().strip_prefix(':') else {
        return PickerInput::Query(line.to_string());
    };
    if command == "q" {
        return PickerInput::Quit;
    }
    match command.parse::<usize>() {
        Ok(n) if n >= 1 => PickerInput::Pick(n - 1),
        _ => PickerInput::Invalid(format!("Unknown command :{} (use :N or :q)", command)),
    }
}

/// Lines to print for a snapshot; empty while nothing worth showing changed.
fn render_snapshot(snapshot: &Snapshot) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(err) = &snapshot.last_error {
        out.push(format!("! {}", err));
    }
    match snapshot.state {
        LookupState::InFlight => out.push("Searching locations...".to_string()),
        LookupState::Ready if snapshot.suggestions.is_empty() => {
            out.push("No location found.".to_string())
        }
        LookupState::Ready => out.extend(
            snapshot
                .suggestions
                .iter()
                .enumerate()
                .map(|(i, place)| format_place(i, place)),
        ),
        LookupState::Idle | LookupState::Scheduled => {}
    }
    out
}

fn format_place(index: usize, place: &Place) -> String {
    let region = place.region();
    if region.is_empty() {
        format!("{:>2}. {}", index + 1, place.name())
    } else {
        format!("{:>2}. {} ({})", index + 1, place.name(), region)
    }
}

fn format_event_line(event: &Event) -> String {
    let mut line = format!(
        "[{}] {}  {} -> {}",
        event.id,
        event.title,
        event.start_date.format("%Y-%m-%d %H:%M"),
        event.end_date.format("%Y-%m-%d %H:%M"),
    );
    if !event.location.is_empty() {
        line.push_str(&format!("  @ {}", event.location));
    }
    line
}

fn format_event_details(event: &Event) -> String {
    let mut out = format!("{}\n", format_event_line(event));
    if !event.description.is_empty() {
        out.push_str(&format!("    {}\n", event.description));
    }
    if let Some(weather) = event.weather_data.as_deref().filter(|w| !w.is_empty()) {
        out.push_str(&format!("    Weather: {}\n", weather));
    }
    out.push_str(&format!(
        "    Created {} / updated {}\n",
        event.created_at.format("%Y-%m-%d %H:%M"),
        event.updated_at.format("%Y-%m-%d %H:%M"),
    ));
    out
}

fn print_page(page: &Page<Event>) {
    if page.content.is_empty() {
        println!("No events found.");
        return;
    }
    for event in &page.content {
        println!("{}", format_event_line(event));
    }
    println!("{}", page_footer(page));
}

/// Position line with the `--page` values of the neighbouring pages.
fn page_footer<T>(page: &Page<T>) -> String {
    let mut footer = format!(
        "Page {} of {} ({} events)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
    if page.has_previous() {
        footer.push_str(&format!("  previous: --page {}", page.number - 1));
    }
    if page.has_next() {
        footer.push_str(&format!("  next: --page {}", page.number + 1));
    }
    footer
}
