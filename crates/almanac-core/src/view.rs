use anyhow::{anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::display::{CellLimits, DayDetail, Viewport};
use crate::event::{Event, EventColor};
use crate::grid::{self, Day, MonthCursor};
use crate::store::{EventStore, NewEvent};
use crate::timefmt::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    Closed,
    DayDetailOpen(NaiveDate),
    AddFormOpen,
}

/// Unsaved add-form fields. Discarded on cancel, reset after submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub date: NaiveDate,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    pub color: EventColor,
}

impl EventDraft {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            date: today,
            start_hour: 9,
            start_minute: 0,
            end_hour: 10,
            end_minute: 0,
            color: EventColor::Blue,
        }
    }

    /// Mirrors the disabled state of the submit button.
    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn to_new_event(&self) -> NewEvent {
        NewEvent {
            title: self.title.clone(),
            date: self.date,
            start_hour: self.start_hour,
            start_minute: self.start_minute,
            end_hour: self.end_hour,
            end_minute: self.end_minute,
            color: self.color,
        }
    }
}

/// The whole page: displayed month, its grid, the open dialog and the
/// add-form draft. Every mutating method regenerates the grid itself.
#[derive(Debug, Clone)]
pub struct CalendarView {
    store: EventStore,
    cursor: MonthCursor,
    today: NaiveDate,
    viewport: Viewport,
    limits: CellLimits,
    grid: Vec<Day>,
    dialog: Dialog,
    draft: EventDraft,
}

impl CalendarView {
    #[tracing::instrument(skip(store, viewport, limits), fields(events = store.len()))]
    pub fn new(
        store: EventStore,
        today: NaiveDate,
        viewport: Viewport,
        limits: CellLimits,
    ) -> anyhow::Result<Self> {
        let cursor = MonthCursor::containing(today);
        let grid = grid::generate(cursor, &store, today)?;
        Ok(Self {
            store,
            cursor,
            today,
            viewport,
            limits,
            grid,
            dialog: Dialog::Closed,
            draft: EventDraft::new(today),
        })
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn grid(&self) -> &[Day] {
        &self.grid
    }

    pub fn dialog(&self) -> Dialog {
        self.dialog
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cell_limit(&self) -> usize {
        self.limits.for_viewport(&self.viewport)
    }

    #[tracing::instrument(skip(self), fields(month = self.cursor.month0, year = self.cursor.year))]
    pub fn regenerate(&mut self) -> anyhow::Result<()> {
        self.grid = grid::generate(self.cursor, &self.store, self.today)?;
        Ok(())
    }

    /// Switches the displayed month. On error the view is left as it was.
    pub fn show_month(&mut self, cursor: MonthCursor) -> anyhow::Result<()> {
        debug!(month = cursor.month0, year = cursor.year, "switching month");
        let grid = grid::generate(cursor, &self.store, self.today)?;
        self.cursor = cursor;
        self.grid = grid;
        Ok(())
    }

    pub fn next_month(&mut self) -> anyhow::Result<()> {
        self.show_month(self.cursor.next())
    }

    pub fn prev_month(&mut self) -> anyhow::Result<()> {
        self.show_month(self.cursor.prev())
    }

    pub fn go_to_today(&mut self) -> anyhow::Result<()> {
        self.show_month(MonthCursor::containing(self.today))
    }

    /// Moves "today". The highlight only changes through this call.
    pub fn set_today(&mut self, today: NaiveDate) -> anyhow::Result<()> {
        let grid = grid::generate(self.cursor, &self.store, today)?;
        self.today = today;
        self.grid = grid;
        Ok(())
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        debug!(width, narrow = width < self.viewport.breakpoint, "viewport resized");
        self.viewport.width = width;
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&Day> {
        self.grid.iter().find(|day| day.full_date == date)
    }

    /// Opens the detail dialog for a date visible in the current grid.
    pub fn open_day(&mut self, date: NaiveDate) -> anyhow::Result<DayDetail> {
        let detail = self
            .cell(date)
            .map(DayDetail::from_day)
            .ok_or_else(|| anyhow!("{date} is not in the displayed grid ({})", self.cursor.label()))?;
        self.leave_dialog();
        self.dialog = Dialog::DayDetailOpen(date);
        Ok(detail)
    }

    pub fn open_day_at(&mut self, index: usize) -> anyhow::Result<DayDetail> {
        let date = self
            .grid
            .get(index)
            .map(|day| day.full_date)
            .ok_or_else(|| anyhow!("no cell at index {index} (grid has {})", self.grid.len()))?;
        self.open_day(date)
    }

    pub fn day_detail(&self) -> Option<DayDetail> {
        match self.dialog {
            Dialog::DayDetailOpen(date) => self.cell(date).map(DayDetail::from_day),
            _ => None,
        }
    }

    pub fn open_add_form(&mut self) {
        self.dialog = Dialog::AddFormOpen;
    }

    /// Cancel or outside click. An open add form loses its draft.
    pub fn dismiss(&mut self) {
        self.leave_dialog();
        self.dialog = Dialog::Closed;
    }

    fn leave_dialog(&mut self) {
        if self.dialog == Dialog::AddFormOpen {
            self.draft = EventDraft::new(self.today);
        }
    }

    fn draft_mut(&mut self) -> anyhow::Result<&mut EventDraft> {
        if self.dialog != Dialog::AddFormOpen {
            bail!("the add event form is not open");
        }
        Ok(&mut self.draft)
    }

    pub fn set_title(&mut self, title: &str) -> anyhow::Result<()> {
        self.draft_mut()?.title = title.to_string();
        Ok(())
    }

    pub fn set_draft_date(&mut self, date: NaiveDate) -> anyhow::Result<()> {
        self.draft_mut()?.date = date;
        Ok(())
    }

    pub fn set_start(&mut self, hour: u32, minute: u32) -> anyhow::Result<()> {
        format_clock(hour, minute)?;
        let draft = self.draft_mut()?;
        draft.start_hour = hour;
        draft.start_minute = minute;
        Ok(())
    }

    pub fn set_end(&mut self, hour: u32, minute: u32) -> anyhow::Result<()> {
        format_clock(hour, minute)?;
        let draft = self.draft_mut()?;
        draft.end_hour = hour;
        draft.end_minute = minute;
        Ok(())
    }

    pub fn set_color(&mut self, color: EventColor) -> anyhow::Result<()> {
        self.draft_mut()?.color = color;
        Ok(())
    }

    /// Commits the draft. Returns `Ok(None)` and keeps the form open when
    /// the submit action is disabled.
    #[tracing::instrument(skip(self, now))]
    pub fn submit(&mut self, now: DateTime<Utc>) -> anyhow::Result<Option<Event>> {
        if self.dialog != Dialog::AddFormOpen {
            bail!("the add event form is not open");
        }
        if !self.draft.can_submit() {
            debug!("submit disabled: empty title");
            return Ok(None);
        }

        let event = self.store.add_event(self.draft.to_new_event(), now)?;
        self.draft = EventDraft::new(self.today);
        self.dialog = Dialog::Closed;
        self.regenerate()?;

        info!(id = %event.id, date = %event.date, "committed new event");
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).single().expect("valid now")
    }

    fn view() -> CalendarView {
        CalendarView::new(
            EventStore::new(),
            date(2024, 6, 10),
            Viewport::default(),
            CellLimits::default(),
        )
        .expect("view")
    }

    #[test]
    fn starts_closed_on_todays_month() {
        let v = view();
        assert_eq!(v.dialog(), Dialog::Closed);
        assert_eq!(v.cursor(), MonthCursor { month0: 5, year: 2024 });
        assert_eq!(v.grid().iter().filter(|d| d.is_current_day).count(), 1);
        assert_eq!(v.draft(), &EventDraft::new(date(2024, 6, 10)));
    }

    #[test]
    fn navigation_regenerates_grid() {
        let mut v = view();
        v.next_month().expect("next");
        assert_eq!(v.cursor(), MonthCursor { month0: 6, year: 2024 });
        assert!(v.grid().iter().all(|d| !d.is_current_day));
        v.prev_month().expect("prev");
        v.prev_month().expect("prev");
        assert_eq!(v.cursor().month0, 4);
        v.go_to_today().expect("today");
        assert_eq!(v.cursor(), MonthCursor::containing(date(2024, 6, 10)));
    }

    #[test]
    fn submit_with_empty_title_is_a_noop() {
        let mut v = view();
        v.open_add_form();
        assert_eq!(v.submit(now()).expect("submit"), None);
        assert_eq!(v.dialog(), Dialog::AddFormOpen);
        assert!(v.store().is_empty());
    }

    #[test]
    fn submit_commits_and_shows_event_in_its_cell() {
        let mut v = view();
        v.open_add_form();
        v.set_title("Planning").expect("title");
        v.set_draft_date(date(2024, 6, 20)).expect("date");
        v.set_start(13, 30).expect("start");
        v.set_end(15, 0).expect("end");
        v.set_color(EventColor::Orange).expect("color");

        let event = v.submit(now()).expect("submit").expect("event created");
        assert_eq!(event.start_time, "1:30 PM");
        assert_eq!(v.dialog(), Dialog::Closed);
        assert_eq!(v.store().len(), 1);
        assert_eq!(v.draft().title, "");
        assert_eq!(v.draft().color, EventColor::Blue);

        let cell = v.cell(date(2024, 6, 20)).expect("cell");
        assert_eq!(cell.events.len(), 1);
        assert_eq!(cell.events[0].title, "Planning");
    }

    #[test]
    fn cancel_discards_draft() {
        let mut v = view();
        v.open_add_form();
        v.set_title("Half typed").expect("title");
        v.dismiss();
        assert_eq!(v.dialog(), Dialog::Closed);
        assert_eq!(v.draft().title, "");
        assert!(v.set_title("closed").is_err());
    }

    #[test]
    fn opening_a_day_abandons_the_add_form() {
        let mut v = view();
        v.open_add_form();
        v.set_title("half typed").expect("title");
        v.set_color(EventColor::Red).expect("color");
        v.open_day(date(2024, 6, 10)).expect("open day");
        assert_eq!(v.dialog(), Dialog::DayDetailOpen(date(2024, 6, 10)));

        v.dismiss();
        v.open_add_form();
        assert_eq!(v.draft(), &EventDraft::new(date(2024, 6, 10)));
    }

    #[test]
    fn failed_month_switch_keeps_previous_month() {
        let mut v = view();
        let before_cursor = v.cursor();
        let before_first = v.grid()[0].full_date;

        assert!(v.show_month(MonthCursor::containing(NaiveDate::MAX)).is_err());
        assert_eq!(v.cursor(), before_cursor);
        assert_eq!(v.grid()[0].full_date, before_first);
        assert_eq!(v.grid()[0].full_date, date(2024, 5, 26));
    }

    #[test]
    fn invalid_times_do_not_touch_the_draft() {
        let mut v = view();
        v.open_add_form();
        assert!(v.set_start(25, 0).is_err());
        assert!(v.set_end(10, 5).is_err());
        assert_eq!(v.draft().start_hour, 9);
        assert_eq!(v.draft().end_minute, 0);
    }

    #[test]
    fn day_detail_lists_every_event() {
        let mut v = view();
        for n in 0..5 {
            v.open_add_form();
            v.set_title(&format!("event {n}")).expect("title");
            v.submit(now()).expect("submit");
        }

        let cell = v.cell(date(2024, 6, 10)).expect("cell");
        assert_eq!(cell.events.len(), 5);

        let detail = v.open_day(date(2024, 6, 10)).expect("open");
        assert_eq!(detail.entries.len(), 5);
        assert_eq!(detail.title, "Today - Jun 10, 2024");
        assert_eq!(v.dialog(), Dialog::DayDetailOpen(date(2024, 6, 10)));
        assert_eq!(v.day_detail(), Some(detail));

        v.dismiss();
        assert_eq!(v.day_detail(), None);
    }

    #[test]
    fn open_day_outside_grid_fails() {
        let mut v = view();
        assert!(v.open_day(date(2024, 9, 1)).is_err());
        assert!(v.open_day_at(99).is_err());
        assert_eq!(v.dialog(), Dialog::Closed);
    }

    #[test]
    fn viewport_controls_cell_limit() {
        let mut v = view();
        assert_eq!(v.cell_limit(), 2);
        v.set_viewport_width(400);
        assert_eq!(v.cell_limit(), 1);
    }

    #[test]
    fn highlight_moves_only_through_set_today() {
        let mut v = view();
        v.set_today(date(2024, 6, 11)).expect("set today");
        let flagged: Vec<_> = v.grid().iter().filter(|d| d.is_current_day).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].full_date, date(2024, 6, 11));
    }
}
