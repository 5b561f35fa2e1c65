use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    #[default]
    Blue,
    Green,
    Red,
    Purple,
    Orange,
    Gray,
}

impl EventColor {
    pub const ALL: [EventColor; 6] = [
        EventColor::Blue,
        EventColor::Green,
        EventColor::Red,
        EventColor::Purple,
        EventColor::Orange,
        EventColor::Gray,
    ];

    pub fn as_key(self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Green => "green",
            EventColor::Red => "red",
            EventColor::Purple => "purple",
            EventColor::Orange => "orange",
            EventColor::Gray => "gray",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventColor::Blue => "Blue",
            EventColor::Green => "Green",
            EventColor::Red => "Red",
            EventColor::Purple => "Purple",
            EventColor::Orange => "Orange",
            EventColor::Gray => "Gray",
        }
    }

    /// SGR code used for the bullet in front of an event.
    pub fn ansi_code(self) -> &'static str {
        match self {
            EventColor::Blue => "34",
            EventColor::Green => "32",
            EventColor::Red => "31",
            EventColor::Purple => "35",
            EventColor::Orange => "38;5;208",
            EventColor::Gray => "90",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for EventColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = if wanted == "grey" { "gray".to_string() } else { wanted };
        EventColor::ALL
            .into_iter()
            .find(|color| color.as_key() == wanted)
            .ok_or_else(|| {
                let known = EventColor::ALL.map(EventColor::as_key).join(", ");
                anyhow!("unknown event color: {s} (expected one of {known})")
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,

    pub title: String,

    pub date: NaiveDate,

    pub start_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    pub color: EventColor,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_day: bool,
}

impl Event {
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.date == date
    }

    /// "All day", "start - end", or just the start for open-ended events.
    pub fn time_label(&self) -> String {
        if self.all_day {
            return "All day".to_string();
        }
        match self.end_time.as_deref() {
            Some(end) if !end.is_empty() => format!("{} - {}", self.start_time, end),
            _ => self.start_time.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(all_day: bool, end_time: Option<&str>) -> Event {
        Event {
            id: "1".to_string(),
            title: "Standup".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date"),
            start_time: "9:00 AM".to_string(),
            end_time: end_time.map(str::to_string),
            color: EventColor::Green,
            all_day,
        }
    }

    #[test]
    fn time_label_variants() {
        assert_eq!(sample(false, Some("9:30 AM")).time_label(), "9:00 AM - 9:30 AM");
        assert_eq!(sample(false, None).time_label(), "9:00 AM");
        assert_eq!(sample(false, Some("")).time_label(), "9:00 AM");
        assert_eq!(sample(true, Some("9:30 AM")).time_label(), "All day");
    }

    #[test]
    fn parses_fixture_shaped_json() {
        let raw = r#"{"id":"7","title":"Offsite","date":"2024-06-16","startTime":"8:00 AM","color":"purple","allDay":true}"#;
        let event: Event = serde_json::from_str(raw).expect("parse event");
        assert_eq!(event.color, EventColor::Purple);
        assert!(event.all_day);
        assert_eq!(event.end_time, None);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 6, 16).expect("valid date"));
    }

    #[test]
    fn fixture_entries_must_name_a_color() {
        let raw = r#"{"id":"7","title":"Offsite","date":"2024-06-16","startTime":"8:00 AM"}"#;
        assert!(serde_json::from_str::<Event>(raw).is_err());

        let raw = r#"{"id":"7","title":"Offsite","date":"2024-06-16","startTime":"8:00 AM","color":"teal"}"#;
        assert!(serde_json::from_str::<Event>(raw).is_err());
    }

    #[test]
    fn color_parsing_is_case_insensitive() {
        assert_eq!("Orange".parse::<EventColor>().expect("parse"), EventColor::Orange);
        assert_eq!("grey".parse::<EventColor>().expect("parse"), EventColor::Gray);
        assert!("teal".parse::<EventColor>().is_err());
    }
}
