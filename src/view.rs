use crate::clock::Clock;
use crate::dates::{
    day_index, format_day_label, format_duration, format_time, is_future_date_at, is_today_at,
    parse_time, week_days, week_key, week_start,
};
use crate::errors::TrackerError;
use crate::models::{
    BlockSnapshot, ClockState, DaySnapshot, FormSnapshot, TimeBlock, TimeBlockInput, WeekData,
    WeekSnapshot,
};
use crate::storage::TimeRepository;
use crate::store::KeyValueStore;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub const WEEKLY_TARGET_MINUTES: i64 = 40 * 60;
const DEFAULT_START_TIME: &str = "09:00";
const DEFAULT_END_TIME: &str = "17:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Closed,
    Adding { day: u8, default_start: String },
    Editing { day: u8, block: TimeBlock },
}

/// State behind the week page. Each change publishes a new [`WeekSnapshot`]
/// to subscribers.
pub struct WeekView<S> {
    repo: TimeRepository<S>,
    clock: Arc<dyn Clock>,
    current_week: NaiveDate,
    week: WeekData,
    selected_day: Option<u8>,
    form: FormState,
    show_weekends: bool,
    clock_state: ClockState,
    updates: watch::Sender<WeekSnapshot>,
}

impl<S: KeyValueStore> WeekView<S> {
    pub async fn new(repo: TimeRepository<S>, clock: Arc<dyn Clock>) -> Self {
        let current_week = week_start(clock.today());
        let week = repo.load_week(current_week).await;
        let clock_state = repo.load_clock_state().await;
        let view = Self {
            repo,
            clock,
            current_week,
            week,
            selected_day: None,
            form: FormState::Closed,
            show_weekends: true,
            clock_state,
            updates: watch::Sender::new(empty_snapshot()),
        };
        view.publish();
        view
    }

    pub fn subscribe(&self) -> watch::Receiver<WeekSnapshot> {
        self.updates.subscribe()
    }

    pub fn current_week(&self) -> NaiveDate {
        self.current_week
    }

    pub fn week(&self) -> &WeekData {
        &self.week
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn selected_day(&self) -> Option<u8> {
        self.selected_day
    }

    pub fn clock_state(&self) -> &ClockState {
        &self.clock_state
    }

    pub async fn previous_week(&mut self) {
        self.set_week(self.current_week - Duration::weeks(1)).await;
    }

    pub async fn next_week(&mut self) {
        self.set_week(self.current_week + Duration::weeks(1)).await;
    }

    pub async fn go_to_today(&mut self) {
        self.set_week(self.clock.today()).await;
    }

    /// Switches to the week containing `date` and reloads it from storage.
    /// Any open form is closed.
    pub async fn set_week(&mut self, date: NaiveDate) {
        self.current_week = week_start(date);
        self.form = FormState::Closed;
        self.selected_day = None;
        self.reload().await;
    }

    pub async fn reload(&mut self) {
        self.week = self.repo.load_week(self.current_week).await;
        self.clock_state = self.repo.load_clock_state().await;
        self.publish();
    }

    pub fn toggle_weekends(&mut self, show: bool) {
        self.show_weekends = show;
        self.publish();
    }

    pub fn day_total(&self, day: u8) -> i64 {
        self.week.day_total(day)
    }

    pub fn displayed_days(&self) -> std::ops::Range<u8> {
        if self.show_weekends { 0..7 } else { 0..5 }
    }

    pub fn week_total(&self) -> i64 {
        self.displayed_days().map(|day| self.day_total(day)).sum()
    }

    pub fn remaining_minutes(&self) -> i64 {
        (WEEKLY_TARGET_MINUTES - self.week_total()).max(0)
    }

    /// Latest end time recorded on `day`, used to prefill the add form.
    pub fn last_end_time(&self, day: u8) -> String {
        self.week
            .day(day)
            .iter()
            .filter_map(|block| block.end_time.as_deref())
            .filter_map(|end| parse_time(end).ok())
            .max()
            .map(format_time)
            .unwrap_or_else(|| DEFAULT_START_TIME.to_string())
    }

    pub fn open_add(&mut self, day: u8) -> Result<(), TrackerError> {
        let date = self.date_of(day)?;
        if is_future_date_at(date, self.clock.today()) {
            return Err(TrackerError::FutureDay);
        }
        self.selected_day = Some(day);
        self.form = FormState::Adding {
            day,
            default_start: self.last_end_time(day),
        };
        self.publish();
        Ok(())
    }

    pub fn open_edit(&mut self, day: u8, id: &str) -> Result<(), TrackerError> {
        self.date_of(day)?;
        let block = self
            .week
            .find(day, id)
            .cloned()
            .ok_or_else(|| TrackerError::BlockNotFound(id.to_string()))?;
        if block.is_active {
            return Err(TrackerError::BlockActive(id.to_string()));
        }
        self.selected_day = Some(day);
        self.form = FormState::Editing { day, block };
        self.publish();
        Ok(())
    }

    /// Applies the open form. Invalid input leaves the form open.
    pub async fn submit_form(&mut self, input: &TimeBlockInput) -> Result<(), TrackerError> {
        let draft = input.validate()?;
        self.week = match &self.form {
            FormState::Closed => return Err(TrackerError::FormClosed),
            FormState::Adding { day, .. } => {
                self.repo.add_block(self.current_week, *day, draft).await?
            }
            FormState::Editing { day, block } => {
                self.repo
                    .update_block(self.current_week, *day, &block.id, draft)
                    .await?
            }
        };
        self.close_form();
        Ok(())
    }

    pub fn cancel_form(&mut self) {
        self.close_form();
    }

    pub async fn remove_block(&mut self, day: u8, id: &str) -> Result<(), TrackerError> {
        self.week = self.repo.remove_block(self.current_week, day, id).await?;
        self.clock_state = self.repo.load_clock_state().await;
        self.publish();
        Ok(())
    }

    /// Opens an active block on today's column at the current time.
    pub async fn clock_in(&mut self) -> Result<(), TrackerError> {
        let now = self.clock.now();
        let today = now.date();
        let today_week = week_start(today);
        let (week, state) = self
            .repo
            .clock_in(today_week, day_index(today), &format_time(now.time()))
            .await?;
        if today_week == self.current_week {
            self.week = week;
        }
        self.clock_state = state;
        self.publish();
        Ok(())
    }

    /// Closes the active block at the current time.
    pub async fn clock_out(&mut self) -> Result<(), TrackerError> {
        let stored = self.repo.load_clock_state().await;
        let (true, Some(block_id)) = (stored.is_clocked_in, stored.active_block_id.clone()) else {
            self.clock_state = stored;
            self.publish();
            return Err(TrackerError::NotClockedIn);
        };

        let now = self.clock.now();
        let opened_on = stored.date.unwrap_or_else(|| now.date());
        let block_week = week_start(opened_on);
        if opened_on != now.date() {
            info!(%opened_on, "closing a session opened on an earlier day");
        }
        let (week, state) = self
            .repo
            .clock_out(
                block_week,
                day_index(opened_on),
                &block_id,
                &format_time(now.time()),
            )
            .await?;
        if block_week == self.current_week {
            self.week = week;
        }
        self.clock_state = state;
        self.publish();
        Ok(())
    }

    pub fn snapshot(&self) -> WeekSnapshot {
        let today = self.clock.today();
        let dates = week_days(self.current_week);
        let days = self
            .displayed_days()
            .map(|day| {
                let date = dates[usize::from(day)];
                let is_today = is_today_at(date, today);
                let is_future = is_future_date_at(date, today);
                let total = self.day_total(day);
                DaySnapshot {
                    index: day,
                    date,
                    label: format_day_label(date),
                    is_today,
                    is_future,
                    can_add: !is_future,
                    show_clock: is_today,
                    blocks: self.week.day(day).iter().map(block_snapshot).collect(),
                    total_minutes: total,
                    total_label: format_duration(total),
                }
            })
            .collect::<Vec<_>>();

        let last_shown = if self.show_weekends { 6 } else { 4 };
        let week_total = self.week_total();
        let remaining = self.remaining_minutes();

        WeekSnapshot {
            week_key: week_key(self.current_week),
            range_label: format!(
                "{} - {}",
                format_day_label(dates[0]),
                format_day_label(dates[last_shown])
            ),
            show_weekends: self.show_weekends,
            days,
            week_total_minutes: week_total,
            week_total_label: format_duration(week_total),
            remaining_minutes: remaining,
            remaining_label: format_duration(remaining),
            clock: self.clock_state.clone(),
            form: self.form_snapshot(),
        }
    }

    fn form_snapshot(&self) -> FormSnapshot {
        match &self.form {
            FormState::Closed => FormSnapshot::Closed,
            FormState::Adding { day, default_start } => FormSnapshot::Adding {
                day: *day,
                start_time: default_start.clone(),
                end_time: DEFAULT_END_TIME.to_string(),
            },
            FormState::Editing { day, block } => FormSnapshot::Editing {
                day: *day,
                block_id: block.id.clone(),
                start_time: block.start_time.clone(),
                end_time: block
                    .end_time
                    .clone()
                    .unwrap_or_else(|| DEFAULT_END_TIME.to_string()),
                description: block.description.clone(),
            },
        }
    }

    fn date_of(&self, day: u8) -> Result<NaiveDate, TrackerError> {
        week_days(self.current_week)
            .get(usize::from(day))
            .copied()
            .ok_or(TrackerError::InvalidDayIndex(day))
    }

    fn close_form(&mut self) {
        self.form = FormState::Closed;
        self.selected_day = None;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

fn block_snapshot(block: &TimeBlock) -> BlockSnapshot {
    let minutes = block.completed_minutes();
    BlockSnapshot {
        block: block.clone(),
        duration_minutes: minutes,
        duration_label: minutes.map(format_duration),
    }
}

fn empty_snapshot() -> WeekSnapshot {
    WeekSnapshot {
        week_key: String::new(),
        range_label: String::new(),
        show_weekends: true,
        days: Vec::new(),
        week_total_minutes: 0,
        week_total_label: format_duration(0),
        remaining_minutes: WEEKLY_TARGET_MINUTES,
        remaining_label: format_duration(WEEKLY_TARGET_MINUTES),
        clock: ClockState::default(),
        form: FormSnapshot::Closed,
    }
}
