use anyhow::{
  anyhow,
  bail
};
use regex::Regex;

/// Minute values offered by the add form.
pub const MINUTE_STEPS: [u32; 4] =
  [0, 15, 30, 45];

/// Formats a 24-hour clock value as
/// "h:mm AM/PM".
///
/// Hour 0 and 12 render as "12"; the
/// suffix is AM iff `hour < 12`.
pub fn format_clock(
  hour: u32,
  minute: u32
) -> anyhow::Result<String> {
  if hour > 23 {
    bail!(
      "hour out of range (0-23): \
       {hour}"
    );
  }
  if !MINUTE_STEPS.contains(&minute) {
    bail!(
      "minute must be one of 0, 15, \
       30, 45: {minute}"
    );
  }

  Ok(format!(
    "{}:{minute:02} {}",
    twelve_hour(hour),
    meridiem(hour)
  ))
}

fn twelve_hour(hour: u32) -> u32 {
  match hour % 12 {
    | 0 => 12,
    | h => h
  }
}

fn meridiem(hour: u32) -> &'static str {
  if hour < 12 { "AM" } else { "PM" }
}

/// `(value, label)` pairs for the hour
/// picker, e.g. `(13, "1:00 PM")`.
pub fn hour_options() -> Vec<(u32, String)>
{
  (0_u32..24_u32)
    .map(|hour| {
      (
        hour,
        format!(
          "{}:00 {}",
          twelve_hour(hour),
          meridiem(hour)
        )
      )
    })
    .collect()
}

pub fn minute_options()
-> Vec<(u32, String)> {
  MINUTE_STEPS
    .iter()
    .map(|minute| {
      (*minute, format!("{minute:02}"))
    })
    .collect()
}

/// Accepts `H:MM` (24-hour) or
/// `H:MM am|pm`, and a bare hour `H`.
/// Minutes must land on a quarter hour.
pub fn parse_clock_time(
  token: &str
) -> anyhow::Result<(u32, u32)> {
  let trimmed = token.trim();
  if !trimmed.is_empty()
    && trimmed
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let hour: u32 =
      trimmed.parse().map_err(|_| {
        anyhow!("invalid hour: {token}")
      })?;
    format_clock(hour, 0)?;
    return Ok((hour, 0));
  }

  let clock_re = Regex::new(
    r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$",
  )?;
  let captures = clock_re
    .captures(trimmed)
    .ok_or_else(|| {
      anyhow!(
        "invalid clock time: {token}"
      )
    })?;

  let raw_hour = captures["hour"]
    .parse::<u32>()
    .map_err(|_| {
      anyhow!("invalid hour: {token}")
    })?;
  let minute = captures["minute"]
    .parse::<u32>()
    .map_err(|_| {
      anyhow!("invalid minute: {token}")
    })?;

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    if raw_hour == 0 || raw_hour > 12 {
      bail!(
        "12-hour clock expects 1-12: \
         {token}"
      );
    }
    let pm = ampm_match
      .as_str()
      .eq_ignore_ascii_case("pm");
    match (raw_hour, pm) {
      | (12, false) => 0,
      | (12, true) => 12,
      | (h, false) => h,
      | (h, true) => h + 12
    }
  } else {
    raw_hour
  };

  format_clock(hour, minute)?;
  Ok((hour, minute))
}
