use std::io::{BufRead, Write};

use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::datetime::{parse_date_expr, parse_month_expr};
use crate::event::EventColor;
use crate::grid::MonthCursor;
use crate::render::Renderer;
use crate::timefmt::parse_clock_time;
use crate::view::{CalendarView, Dialog};

pub fn known_command_names() -> Vec<&'static str> {
    vec!["month", "day", "add", "session", "help", "version"]
}

fn session_command_names() -> Vec<&'static str> {
    vec![
        "next", "prev", "today", "month", "open", "add", "title", "date", "start", "end",
        "color", "submit", "cancel", "width", "show", "help", "quit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(view, renderer, inv, input, out))]
pub fn dispatch<R: BufRead, W: Write>(
    view: &mut CalendarView,
    renderer: &Renderer,
    inv: Invocation,
    input: R,
    mut out: W,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "month" => cmd_month(view, renderer, &inv.command_args, &mut out),
        "day" => cmd_day(view, renderer, &inv.command_args, &mut out),
        "add" => cmd_add(view, renderer, &inv.command_args, &mut out),
        "session" => cmd_session(view, renderer, input, &mut out),
        "help" => cmd_help(&mut out),
        "version" => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(view, renderer, args, out))]
fn cmd_month<W: Write>(
    view: &mut CalendarView,
    renderer: &Renderer,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command month");
    if let Some(expr) = args.first() {
        let cursor = parse_month_expr(expr, view.today())?;
        view.show_month(cursor)?;
    }
    renderer.print_month(out, view)
}

#[instrument(skip(view, renderer, args, out))]
fn cmd_day<W: Write>(
    view: &mut CalendarView,
    renderer: &Renderer,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command day");
    let expr = args.first().map(String::as_str).unwrap_or("today");
    let date = parse_date_expr(expr, view.today())?;
    view.show_month(MonthCursor::containing(date))?;
    let detail = view.open_day(date)?;
    renderer.print_day_detail(out, &detail)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct AddArgs {
    title_words: Vec<String>,
    date: Option<String>,
    start: Option<String>,
    end: Option<String>,
    color: Option<String>,
}

fn parse_add_args(args: &[String]) -> AddArgs {
    let mut parsed = AddArgs::default();
    for arg in args {
        if let Some(value) = arg.strip_prefix("date:") {
            parsed.date = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("start:") {
            parsed.start = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("end:") {
            parsed.end = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("color:") {
            parsed.color = Some(value.to_string());
        } else {
            parsed.title_words.push(arg.clone());
        }
    }
    parsed
}

#[instrument(skip(view, renderer, args, out))]
fn cmd_add<W: Write>(
    view: &mut CalendarView,
    renderer: &Renderer,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command add");
    let parsed = parse_add_args(args);

    view.open_add_form();
    let filled = fill_draft(view, &parsed);
    if let Err(err) = filled {
        view.dismiss();
        return Err(err);
    }

    let Some(event) = view.submit(Utc::now())? else {
        view.dismiss();
        bail!("add requires a non-empty title");
    };

    renderer.print_event_created(&mut *out, &event)?;
    writeln!(out)?;
    view.show_month(MonthCursor::containing(event.date))?;
    renderer.print_month(out, view)
}

fn fill_draft(view: &mut CalendarView, parsed: &AddArgs) -> anyhow::Result<()> {
    view.set_title(&parsed.title_words.join(" "))?;
    if let Some(raw) = &parsed.date {
        let date = parse_date_expr(raw, view.today())?;
        view.set_draft_date(date)?;
    }
    if let Some(raw) = &parsed.start {
        let (hour, minute) = parse_clock_time(raw).context("invalid start")?;
        view.set_start(hour, minute)?;
    }
    if let Some(raw) = &parsed.end {
        let (hour, minute) = parse_clock_time(raw).context("invalid end")?;
        view.set_end(hour, minute)?;
    }
    if let Some(raw) = &parsed.color {
        view.set_color(raw.parse::<EventColor>()?)?;
    }
    Ok(())
}

/// Line-oriented loop driving the view: one user action per line.
#[instrument(skip(view, renderer, input, out))]
fn cmd_session<R: BufRead, W: Write>(
    view: &mut CalendarView,
    renderer: &Renderer,
    input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command session");
    render_current(view, renderer, out)?;

    for line in input.lines() {
        let line = line.context("failed reading session input")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (head, rest) = trimmed
            .split_once(char::is_whitespace)
            .map(|(h, r)| (h, r.trim()))
            .unwrap_or((trimmed, ""));
        let known = session_command_names();
        let Some(action) = expand_command_abbrev(head, &known) else {
            writeln!(out, "error: unknown or ambiguous command: {head} (try 'help')")?;
            continue;
        };

        if action == "quit" {
            debug!("session ended by user");
            break;
        }

        match apply_session_action(view, action, rest) {
            Ok(SessionOutcome::Render) => render_current(view, renderer, out)?,
            Ok(SessionOutcome::Help) => cmd_help(out)?,
            Ok(SessionOutcome::Message(message)) => {
                writeln!(out, "{message}")?;
                render_current(view, renderer, out)?;
            }
            Err(err) => {
                warn!(action, error = %err, "session action failed");
                writeln!(out, "error: {err:#}")?;
            }
        }
    }

    Ok(())
}

enum SessionOutcome {
    Render,
    Help,
    Message(String),
}

fn apply_session_action(
    view: &mut CalendarView,
    action: &str,
    rest: &str,
) -> anyhow::Result<SessionOutcome> {
    match action {
        "next" => view.next_month()?,
        "prev" => view.prev_month()?,
        "today" => view.go_to_today()?,
        "month" => {
            let cursor = parse_month_expr(require(rest, "month")?, view.today())?;
            view.show_month(cursor)?;
        }
        "open" => {
            let date = resolve_day(view, require(rest, "open")?)?;
            view.open_day(date)?;
        }
        "add" => view.open_add_form(),
        "title" => view.set_title(rest)?,
        "date" => {
            let date = parse_date_expr(require(rest, "date")?, view.today())?;
            view.set_draft_date(date)?;
        }
        "start" => {
            let (hour, minute) = parse_hour_minute(require(rest, "start")?)?;
            view.set_start(hour, minute)?;
        }
        "end" => {
            let (hour, minute) = parse_hour_minute(require(rest, "end")?)?;
            view.set_end(hour, minute)?;
        }
        "color" => view.set_color(require(rest, "color")?.parse::<EventColor>()?)?,
        "submit" => {
            return Ok(match view.submit(Utc::now())? {
                Some(event) => SessionOutcome::Message(format!(
                    "Created event {} on {}: {}",
                    event.id, event.date, event.title
                )),
                None => SessionOutcome::Message(
                    "Add Event is disabled until a title is entered".to_string(),
                ),
            });
        }
        "cancel" => view.dismiss(),
        "width" => {
            let width: u32 = require(rest, "width")?
                .parse()
                .with_context(|| format!("invalid width: {rest}"))?;
            view.set_viewport_width(width);
        }
        "show" => {}
        "help" => return Ok(SessionOutcome::Help),
        other => bail!("unsupported session command: {other}"),
    }
    Ok(SessionOutcome::Render)
}

fn require<'a>(rest: &'a str, action: &str) -> anyhow::Result<&'a str> {
    if rest.is_empty() {
        bail!("{action} requires an argument");
    }
    Ok(rest)
}

/// A bare day number refers to the displayed month.
fn resolve_day(view: &CalendarView, raw: &str) -> anyhow::Result<NaiveDate> {
    if let Ok(day) = raw.parse::<u32>() {
        let cursor = view.cursor();
        return NaiveDate::from_ymd_opt(cursor.year, cursor.month0 + 1, day)
            .ok_or_else(|| anyhow!("{} has no day {day}", cursor.label()));
    }
    parse_date_expr(raw, view.today())
}

/// `H M` as two numbers, or a single clock token such as `2:30pm`.
fn parse_hour_minute(raw: &str) -> anyhow::Result<(u32, u32)> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    match parts.as_slice() {
        [hour, minute] => {
            let hour = hour.parse().with_context(|| format!("invalid hour: {hour}"))?;
            let minute = minute.parse().with_context(|| format!("invalid minute: {minute}"))?;
            Ok((hour, minute))
        }
        _ => parse_clock_time(raw),
    }
}

fn render_current<W: Write>(
    view: &CalendarView,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    match view.dialog() {
        Dialog::Closed => renderer.print_month(&mut *out, view)?,
        Dialog::DayDetailOpen(_) => {
            if let Some(detail) = view.day_detail() {
                renderer.print_day_detail(&mut *out, &detail)?;
            }
        }
        Dialog::AddFormOpen => renderer.print_add_form(&mut *out, view.draft())?,
    }
    writeln!(out)?;
    Ok(())
}

fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "\
almanac [options] <command> [args]

commands:
  month [YYYY-MM|name|date]   show a month grid
  day [date]                  show every event on a date
  add <title...> [date:D] [start:H:MM] [end:H:MM] [color:C]
  session                     interactive mode, one action per line
  help | version

session actions:
  next | prev | today | month <expr>
  open <date|day-of-month>    open the day dialog
  add                         open the add event form
  title <text> | date <date> | start <H> <M> | end <H> <M> | color <name>
  submit | cancel | width <n> | show | quit

dates: YYYY-MM-DD, today, tomorrow, yesterday
colors: {}",
        EventColor::ALL.map(EventColor::as_key).join(", ")
    )?;
    Ok(())
}
