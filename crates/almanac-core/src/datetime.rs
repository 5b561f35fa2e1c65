use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;

use crate::config::Config;
use crate::grid::{
  MonthCursor,
  add_days
};

const TIMEZONE_ENV_VAR: &str =
  "ALMANAC_TIMEZONE";

/// Timezone used to decide what
/// "today" is. `None` means the host's
/// local time.
pub fn resolve_timezone(
  cfg: &Config
) -> Option<Tz> {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(
        &raw,
        TIMEZONE_ENV_VAR
      )
  {
    return Some(tz);
  }

  cfg.get("timezone").and_then(|raw| {
    parse_timezone(&raw, "timezone")
  })
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

#[must_use]
pub fn today_in(
  timezone: Option<Tz>
) -> NaiveDate {
  match timezone {
    | Some(tz) => {
      Utc::now()
        .with_timezone(&tz)
        .date_naive()
    }
    | None => Local::now().date_naive()
  }
}

/// `today`, `tomorrow`, `yesterday`
/// or `YYYY-MM-DD`.
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  match token
    .to_ascii_lowercase()
    .as_str()
  {
    | "today" => Ok(today),
    | "tomorrow" => add_days(today, 1),
    | "yesterday" => {
      add_days(today, -1)
    }
    | _ => {
      NaiveDate::parse_from_str(
        token, "%Y-%m-%d"
      )
      .with_context(|| {
        format!(
          "invalid date '{token}'; \
           expected YYYY-MM-DD"
        )
      })
    }
  }
}

/// `YYYY-MM`, a month name in the
/// current year, or any date accepted
/// by [`parse_date_expr`].
pub fn parse_month_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<MonthCursor> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  if let Some(month) =
    parse_month_name(&lower)
  {
    return MonthCursor::new(
      month - 1,
      today.year()
    );
  }

  if let Some((year, month)) =
    token.split_once('-')
    && !month.contains('-')
  {
    let year: i32 =
      year.parse().with_context(|| {
        format!(
          "invalid year in '{token}'"
        )
      })?;
    let month: u32 =
      month.parse().with_context(|| {
        format!(
          "invalid month in '{token}'"
        )
      })?;
    if !(1..=12).contains(&month) {
      return Err(anyhow!(
        "month out of range (1-12): \
         {month}"
      ));
    }
    return MonthCursor::new(
      month - 1,
      year
    );
  }

  parse_date_expr(token, today)
    .map(MonthCursor::containing)
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(
      2026, 2, 17
    )
    .expect("valid date")
  }

  #[test]
  fn parses_relative_dates() {
    assert_eq!(
      parse_date_expr("today", today())
        .expect("today"),
      today()
    );
    assert_eq!(
      parse_date_expr(
        "Tomorrow",
        today()
      )
      .expect("tomorrow")
      .to_string(),
      "2026-02-18"
    );
    assert_eq!(
      parse_date_expr(
        "yesterday",
        today()
      )
      .expect("yesterday")
      .to_string(),
      "2026-02-16"
    );
  }

  #[test]
  fn parses_iso_dates_and_rejects_junk()
  {
    assert_eq!(
      parse_date_expr(
        "2024-06-15",
        today()
      )
      .expect("iso")
      .to_string(),
      "2024-06-15"
    );
    assert!(
      parse_date_expr(
        "2024-02-30",
        today()
      )
      .is_err()
    );
    assert!(
      parse_date_expr("soon", today())
        .is_err()
    );
  }

  #[test]
  fn parses_month_expressions() {
    assert_eq!(
      parse_month_expr(
        "2024-06",
        today()
      )
      .expect("year-month"),
      MonthCursor {
        month0: 5,
        year:   2024
      }
    );
    assert_eq!(
      parse_month_expr("march", today())
        .expect("month name"),
      MonthCursor {
        month0: 2,
        year:   2026
      }
    );
    assert_eq!(
      parse_month_expr(
        "2025-12-31",
        today()
      )
      .expect("full date"),
      MonthCursor {
        month0: 11,
        year:   2025
      }
    );
    assert!(
      parse_month_expr(
        "2024-13",
        today()
      )
      .is_err()
    );
  }
}
