//! What a cell and the day dialog show, independent of how they are drawn.

use chrono::{Datelike, Weekday};

use crate::event::{Event, EventColor};
use crate::grid::{Day, MONTH_NAMES};

pub const DEFAULT_BREAKPOINT: u32 = 768;
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_WIDE_LIMIT: usize = 2;
pub const DEFAULT_NARROW_LIMIT: usize = 1;

pub const EMPTY_DAY_MESSAGE: &str = "No events scheduled for this day";

const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const SHORT_WEEKDAY_NAMES: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub breakpoint: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            breakpoint: DEFAULT_BREAKPOINT,
        }
    }
}

impl Viewport {
    pub fn is_narrow(&self) -> bool {
        self.width < self.breakpoint
    }
}

/// How many events a cell lists before collapsing the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLimits {
    pub wide: usize,
    pub narrow: usize,
}

impl Default for CellLimits {
    fn default() -> Self {
        Self {
            wide: DEFAULT_WIDE_LIMIT,
            narrow: DEFAULT_NARROW_LIMIT,
        }
    }
}

impl CellLimits {
    pub fn for_viewport(&self, viewport: &Viewport) -> usize {
        if viewport.is_narrow() {
            self.narrow
        } else {
            self.wide
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSummary<'a> {
    pub shown: &'a [Event],
    pub hidden: usize,
}

impl CellSummary<'_> {
    pub fn more_label(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("+{} more", self.hidden))
    }
}

pub fn summarize_cell(day: &Day, limit: usize) -> CellSummary<'_> {
    let shown = &day.events[..day.events.len().min(limit)];
    CellSummary {
        shown,
        hidden: day.events.len() - shown.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry {
    pub title: String,
    pub color: EventColor,
    pub time: String,
}

/// Contents of the dialog opened by clicking a cell. Never truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDetail {
    pub title: String,
    pub is_today: bool,
    pub entries: Vec<DetailEntry>,
}

impl DayDetail {
    pub fn from_day(day: &Day) -> Self {
        let date_label = format!(
            "{} {}, {}",
            MONTH_NAMES[day.full_date.month0() as usize],
            day.date,
            day.full_date.year()
        );
        let title = if day.is_current_day {
            format!("Today - {date_label}")
        } else {
            date_label
        };

        Self {
            title,
            is_today: day.is_current_day,
            entries: day
                .events
                .iter()
                .map(|event| DetailEntry {
                    title: event.title.clone(),
                    color: event.color,
                    time: event.time_label(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn weekday_labels(narrow: bool) -> [&'static str; 7] {
    if narrow {
        SHORT_WEEKDAY_NAMES
    } else {
        WEEKDAY_NAMES
    }
}

/// Column index of `weekday` in a Sunday-first header.
pub fn weekday_column(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn event(n: usize) -> Event {
        Event {
            id: n.to_string(),
            title: format!("event {n}"),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date"),
            start_time: "9:00 AM".to_string(),
            end_time: Some("10:00 AM".to_string()),
            color: EventColor::Blue,
            all_day: n == 0,
        }
    }

    fn day_with(count: usize, is_current_day: bool) -> Day {
        Day {
            date: 15,
            full_date: NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date"),
            events: (0..count).map(event).collect(),
            is_current_month: true,
            is_current_day,
        }
    }

    #[test]
    fn truncates_to_limit_with_more_indicator() {
        let day = day_with(5, false);
        let summary = summarize_cell(&day, 2);
        assert_eq!(summary.shown.len(), 2);
        assert_eq!(summary.more_label().as_deref(), Some("+3 more"));

        let detail = DayDetail::from_day(&day);
        assert_eq!(detail.entries.len(), 5);
        assert_eq!(detail.entries[0].time, "All day");
        assert_eq!(detail.entries[1].time, "9:00 AM - 10:00 AM");
    }

    #[test]
    fn no_indicator_when_everything_fits() {
        let day = day_with(1, false);
        let summary = summarize_cell(&day, 2);
        assert_eq!(summary.shown.len(), 1);
        assert_eq!(summary.more_label(), None);
    }

    #[test]
    fn narrow_viewport_lowers_the_limit() {
        let limits = CellLimits::default();
        let narrow = Viewport {
            width: 500,
            breakpoint: DEFAULT_BREAKPOINT,
        };
        assert_eq!(limits.for_viewport(&narrow), 1);
        assert_eq!(limits.for_viewport(&Viewport::default()), 2);
        assert!(!Viewport { width: 768, breakpoint: 768 }.is_narrow());
    }

    #[test]
    fn detail_title_marks_today() {
        assert_eq!(DayDetail::from_day(&day_with(0, true)).title, "Today - Jun 15, 2024");
        let plain = DayDetail::from_day(&day_with(0, false));
        assert_eq!(plain.title, "Jun 15, 2024");
        assert!(plain.is_empty());
    }

    #[test]
    fn weekday_labels_follow_viewport() {
        assert_eq!(weekday_labels(false)[0], "SUN");
        assert_eq!(weekday_labels(true), ["S", "M", "T", "W", "T", "F", "S"]);
        assert_eq!(weekday_column(Weekday::Sat), 6);
    }
}
