use anyhow::{anyhow, bail};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::event::Event;
use crate::store::EventStore;

pub const DAYS_PER_WEEK: usize = 7;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One square of the month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    pub date: u32,
    pub full_date: NaiveDate,
    pub events: Vec<Event>,
    pub is_current_month: bool,
    pub is_current_day: bool,
}

/// The displayed month. `month0` is zero based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthCursor {
    pub month0: u32,
    pub year: i32,
}

impl MonthCursor {
    pub fn new(month0: u32, year: i32) -> anyhow::Result<Self> {
        if month0 > 11 {
            bail!("month out of range (0-11): {month0}");
        }
        first_day_of_month(year, month0 + 1)?;
        Ok(Self { month0, year })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month0: date.month0(),
            year: date.year(),
        }
    }

    pub fn next(self) -> Self {
        if self.month0 == 11 {
            Self {
                month0: 0,
                year: self.year.saturating_add(1),
            }
        } else {
            Self {
                month0: self.month0 + 1,
                year: self.year,
            }
        }
    }

    pub fn prev(self) -> Self {
        if self.month0 == 0 {
            Self {
                month0: 11,
                year: self.year.saturating_sub(1),
            }
        } else {
            Self {
                month0: self.month0 - 1,
                year: self.year,
            }
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.month0() == self.month0 && date.year() == self.year
    }

    /// Header text, e.g. "Jun 2024".
    pub fn label(self) -> String {
        format!("{} {}", MONTH_NAMES[self.month0 as usize % 12], self.year)
    }
}

pub fn first_day_of_month(year: i32, month: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("invalid month: {year}-{month:02}"))
}

pub fn last_day_of_month(year: i32, month: u32) -> anyhow::Result<NaiveDate> {
    let (next_year, next_month) = if month >= 12 {
        (year.saturating_add(1), 1_u32)
    } else {
        (year, month + 1)
    };
    first_day_of_month(next_year, next_month)?
        .pred_opt()
        .ok_or_else(|| anyhow!("no day before {next_year}-{next_month:02}-01"))
}

pub fn add_days(date: NaiveDate, days: i64) -> anyhow::Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| anyhow!("date out of range: {date} + {days} days"))
}

pub fn start_of_week(day: NaiveDate, week_start: Weekday) -> anyhow::Result<NaiveDate> {
    let day_idx = day.weekday().num_days_from_sunday() as i64;
    let start_idx = week_start.num_days_from_sunday() as i64;
    let diff = (7 + day_idx - start_idx) % 7;
    add_days(day, -diff)
}

pub fn end_of_week(day: NaiveDate, week_start: Weekday) -> anyhow::Result<NaiveDate> {
    add_days(start_of_week(day, week_start)?, 6)
}

/// Builds the Sunday-first grid for `cursor`, padded to whole weeks with
/// days from the adjacent months.
#[tracing::instrument(skip(store), fields(month = cursor.month0, year = cursor.year))]
pub fn generate(cursor: MonthCursor, store: &EventStore, today: NaiveDate) -> anyhow::Result<Vec<Day>> {
    let month = cursor.month0 + 1;
    let first = first_day_of_month(cursor.year, month)?;
    let last = last_day_of_month(cursor.year, month)?;

    let grid_start = start_of_week(first, Weekday::Sun)?;
    let grid_end = end_of_week(last, Weekday::Sun)?;
    let viewing_today = cursor.contains(today);

    let mut days = Vec::with_capacity(42);
    for full_date in grid_start.iter_days().take_while(|d| *d <= grid_end) {
        days.push(Day {
            date: full_date.day(),
            full_date,
            events: store.events_on(full_date),
            is_current_month: cursor.contains(full_date),
            is_current_day: viewing_today && full_date == today,
        });
    }

    debug!(
        cells = days.len(),
        start = %grid_start,
        end = %grid_end,
        events = days.iter().map(|d| d.events.len()).sum::<usize>(),
        "generated month grid"
    );
    Ok(days)
}

/// Convenience wrapper taking the zero-based month and year directly.
pub fn generate_month(
    month0: u32,
    year: i32,
    store: &EventStore,
    today: NaiveDate,
) -> anyhow::Result<Vec<Day>> {
    generate(MonthCursor::new(month0, year)?, store, today)
}

/// Splits a grid into rows of seven cells.
pub fn weeks(days: &[Day]) -> impl Iterator<Item = &[Day]> {
    days.chunks(DAYS_PER_WEEK)
}
