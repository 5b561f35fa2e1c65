use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::event::{Event, EventColor};
use crate::timefmt::format_clock;

const BUNDLED_FIXTURE: &str = include_str!("../fixtures/events.json");

/// Field values collected by the add form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    pub color: EventColor,
}

/// Insertion-ordered, append-only event collection.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
    last_issued_id: i64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self {
            events,
            last_issued_id: 0,
        }
    }

    #[tracing::instrument(skip(raw))]
    pub fn from_fixture_json(raw: &str) -> anyhow::Result<Self> {
        let events: Vec<Event> =
            serde_json::from_str(raw).context("failed parsing event fixture")?;
        debug!(count = events.len(), "parsed event fixture");
        Ok(Self::from_events(events))
    }

    /// The fixture compiled into the crate.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_fixture_json(BUNDLED_FIXTURE).context("bundled fixture is invalid")
    }

    #[tracing::instrument(skip(path))]
    pub fn load_fixture(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let store = Self::from_fixture_json(&raw)
            .with_context(|| format!("failed loading fixture {}", path.display()))?;
        info!(file = %path.display(), count = store.len(), "loaded fixture");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Events whose date equals `date`, in insertion order.
    pub fn events_on(&self, date: NaiveDate) -> Vec<Event> {
        self.events
            .iter()
            .filter(|event| event.occurs_on(date))
            .cloned()
            .collect()
    }

    /// Formats the times, assigns a fresh id and appends the event.
    #[tracing::instrument(skip(self, new, now), fields(date = %new.date, color = %new.color))]
    pub fn add_event(&mut self, new: NewEvent, now: DateTime<Utc>) -> anyhow::Result<Event> {
        if new.title.trim().is_empty() {
            bail!("event title cannot be empty");
        }

        let start_time = format_clock(new.start_hour, new.start_minute)
            .context("invalid start time")?;
        let end_time =
            format_clock(new.end_hour, new.end_minute).context("invalid end time")?;

        let id = self.next_id(now);
        let event = Event {
            id,
            title: new.title,
            date: new.date,
            start_time,
            end_time: Some(end_time),
            color: new.color,
            all_day: false,
        };

        self.events.push(event.clone());
        info!(id = %event.id, count = self.events.len(), "event added");
        Ok(event)
    }

    /// Millisecond timestamp, bumped past every id issued so far and any
    /// colliding fixture id.
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let mut candidate = now.timestamp_millis().max(self.last_issued_id + 1);
        while self.contains_id(&candidate.to_string()) {
            candidate += 1;
        }
        self.last_issued_id = candidate;
        candidate.to_string()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.events.iter().any(|event| event.id == id)
    }
}
