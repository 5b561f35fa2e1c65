use std::io::{self, IsTerminal, Write};

use chrono::Datelike;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::display::{self, DayDetail, EMPTY_DAY_MESSAGE};
use crate::event::{Event, EventColor};
use crate::grid::{self, Day};
use crate::timefmt::{format_clock, hour_options, minute_options};
use crate::view::{CalendarView, EventDraft};

const WIDE_CELL_WIDTH: usize = 20;
const NARROW_CELL_WIDTH: usize = 10;

const TODAY_CODE: &str = "38;5;208";
const MUTED_CODE: &str = "90";
const BOLD_CODE: &str = "1";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    /// Renderer that never emits escape codes.
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, view), fields(month = view.cursor().month0, year = view.cursor().year))]
    pub fn print_month<W: Write>(&self, mut out: W, view: &CalendarView) -> anyhow::Result<()> {
        let narrow = view.viewport().is_narrow();
        let cell_width = if narrow { NARROW_CELL_WIDTH } else { WIDE_CELL_WIDTH };
        let limit = view.cell_limit();
        let today_column = display::weekday_column(view.today().weekday());

        writeln!(out, "{}", self.paint(&view.cursor().label(), BOLD_CODE))?;
        writeln!(out)?;

        let headers: Vec<String> = display::weekday_labels(narrow)
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                if idx == today_column {
                    self.paint(label, TODAY_CODE)
                } else {
                    self.paint(label, MUTED_CODE)
                }
            })
            .collect();
        write_row(&mut out, &headers, cell_width)?;
        writeln!(out, "{}", "-".repeat((cell_width + 1) * grid::DAYS_PER_WEEK))?;

        for week in grid::weeks(view.grid()) {
            let cells: Vec<Vec<String>> = week
                .iter()
                .map(|day| self.cell_lines(day, limit, cell_width))
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(0);
            for line in 0..height {
                let row: Vec<String> = cells
                    .iter()
                    .map(|cell| cell.get(line).cloned().unwrap_or_default())
                    .collect();
                write_row(&mut out, &row, cell_width)?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    fn cell_lines(&self, day: &Day, limit: usize, width: usize) -> Vec<String> {
        let number = format!("{:02}", day.date);
        let number = if day.is_current_day {
            self.paint(&number, TODAY_CODE)
        } else if day.is_current_month {
            number
        } else {
            self.paint(&number, MUTED_CODE)
        };

        let mut lines = vec![number];
        let summary = display::summarize_cell(day, limit);
        for event in summary.shown {
            lines.push(self.bullet_line(event, width));
            lines.push(self.paint(
                &truncate_to_width(&format!("  {}", event.time_label()), width),
                MUTED_CODE,
            ));
        }
        if let Some(more) = summary.more_label() {
            lines.push(self.paint(&truncate_to_width(&format!("  {more}"), width), TODAY_CODE));
        }
        lines
    }

    fn bullet_line(&self, event: &Event, width: usize) -> String {
        let title = truncate_to_width(&event.title, width.saturating_sub(2));
        format!("{} {title}", self.bullet(event.color))
    }

    fn bullet(&self, color: EventColor) -> String {
        self.paint("\u{2022}", color.ansi_code())
    }

    #[tracing::instrument(skip(self, out, detail))]
    pub fn print_day_detail<W: Write>(&self, mut out: W, detail: &DayDetail) -> anyhow::Result<()> {
        let title = if detail.is_today {
            self.paint(&detail.title, TODAY_CODE)
        } else {
            self.paint(&detail.title, BOLD_CODE)
        };
        writeln!(out, "{title}")?;
        writeln!(out)?;

        if detail.is_empty() {
            writeln!(out, "  {}", self.paint(EMPTY_DAY_MESSAGE, MUTED_CODE))?;
            return Ok(());
        }

        for entry in &detail.entries {
            writeln!(out, "{} {}", self.bullet(entry.color), entry.title)?;
            writeln!(out, "  {}", self.paint(&entry.time, MUTED_CODE))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, draft))]
    pub fn print_add_form<W: Write>(&self, mut out: W, draft: &EventDraft) -> anyhow::Result<()> {
        let start = format_clock(draft.start_hour, draft.start_minute)?;
        let end = format_clock(draft.end_hour, draft.end_minute)?;
        let title = if draft.title.is_empty() {
            self.paint("Enter event title", MUTED_CODE)
        } else {
            draft.title.clone()
        };

        writeln!(out, "{}", self.paint("Add New Event", BOLD_CODE))?;
        writeln!(out, "  title  {title}")?;
        writeln!(out, "  date   {}", draft.date.format("%B %-d, %Y"))?;
        writeln!(out, "  start  {start}")?;
        writeln!(out, "  end    {end}")?;
        writeln!(out, "  color  {} {}", self.bullet(draft.color), draft.color.label())?;
        writeln!(out, "  {}", self.paint(&picker_hint(), MUTED_CODE))?;
        if draft.can_submit() {
            writeln!(out, "  [Add Event]")?;
        } else {
            writeln!(out, "  {}", self.paint("[Add Event] (title required)", MUTED_CODE))?;
        }
        Ok(())
    }

    pub fn print_event_created<W: Write>(&self, mut out: W, event: &Event) -> anyhow::Result<()> {
        writeln!(
            out,
            "Created event {} on {}: {} {}",
            event.id,
            event.date,
            self.bullet(event.color),
            event.title
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// One-line summary of the hour and minute pickers.
fn picker_hint() -> String {
    let hours = hour_options();
    let first = hours.first().map(|(_, label)| label.as_str()).unwrap_or_default();
    let last = hours.last().map(|(_, label)| label.as_str()).unwrap_or_default();
    let minutes: Vec<String> = minute_options().into_iter().map(|(_, label)| label).collect();
    format!("hours {first} .. {last}, minutes {}", minutes.join("/"))
}

fn write_row<W: Write>(writer: &mut W, cells: &[String], width: usize) -> anyhow::Result<()> {
    let mut line = String::new();
    for cell in cells {
        let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
        let padding = width.saturating_sub(visible_width);
        line.push_str(cell);
        line.push_str(&" ".repeat(padding));
        line.push(' ');
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

/// Cuts `text` to at most `width` columns, marking the cut with "~".
fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('~');
    out
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
