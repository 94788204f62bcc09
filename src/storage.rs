use crate::dates::{format_time, parse_time, week_key};
use crate::errors::{StorageError, TrackerError};
use crate::models::{
    ACTIVE_SESSION_DESCRIPTION, AllData, ClockState, DEFAULT_DESCRIPTION, TimeBlock, TimeBlockDraft,
    WeekData,
};
use crate::store::KeyValueStore;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

pub const TIME_DATA_KEY: &str = "epoch_time_data";
pub const CLOCK_STATE_KEY: &str = "epoch_clock_state";

/// Typed access to week data and the clock record over a key-value store.
///
/// Every mutation reads the full map, changes one week, and writes the full
/// map back. Write failures are logged and the updated in-memory value is
/// still returned.
pub struct TimeRepository<S> {
    store: S,
}

impl<S: KeyValueStore> TimeRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn load_all(&self) -> AllData {
        self.load_or_default(TIME_DATA_KEY).await
    }

    pub async fn save_all(&self, data: &AllData) {
        self.persist(TIME_DATA_KEY, data).await;
    }

    pub async fn load_week(&self, week_start: NaiveDate) -> WeekData {
        self.load_all()
            .await
            .remove(&week_key(week_start))
            .unwrap_or_default()
    }

    pub async fn save_week(&self, week_start: NaiveDate, week: &WeekData) {
        let mut all = self.load_all().await;
        all.insert(week_key(week_start), week.clone());
        self.save_all(&all).await;
    }

    pub async fn add_block(
        &self,
        week_start: NaiveDate,
        day: u8,
        draft: TimeBlockDraft,
    ) -> Result<WeekData, TrackerError> {
        let (week, _) = self.insert_block(week_start, day, draft).await?;
        Ok(week)
    }

    pub async fn remove_block(
        &self,
        week_start: NaiveDate,
        day: u8,
        id: &str,
    ) -> Result<WeekData, TrackerError> {
        check_day(day)?;
        let mut week = self.load_week(week_start).await;
        let Some(blocks) = week.days.get_mut(&day) else {
            return Ok(week);
        };
        let before = blocks.len();
        blocks.retain(|block| block.id != id);
        if blocks.len() == before {
            return Ok(week);
        }
        self.save_week(week_start, &week).await;

        let clock = self.load_clock_state().await;
        if clock.active_block_id.as_deref() == Some(id) {
            info!(block_id = id, "active block removed, clocking out");
            self.save_clock_state(&ClockState::default()).await;
        }
        Ok(week)
    }

    pub async fn update_block(
        &self,
        week_start: NaiveDate,
        day: u8,
        id: &str,
        draft: TimeBlockDraft,
    ) -> Result<WeekData, TrackerError> {
        check_day(day)?;
        let mut week = self.load_week(week_start).await;
        let Some(block) = week
            .days
            .get_mut(&day)
            .and_then(|blocks| blocks.iter_mut().find(|block| block.id == id))
        else {
            return Ok(week);
        };
        *block = TimeBlock::from_draft(id.to_string(), draft);
        week.sort_day(day);
        self.save_week(week_start, &week).await;
        Ok(week)
    }

    pub async fn load_clock_state(&self) -> ClockState {
        self.load_or_default(CLOCK_STATE_KEY).await
    }

    pub async fn save_clock_state(&self, state: &ClockState) {
        self.persist(CLOCK_STATE_KEY, state).await;
    }

    /// Opens an active block starting at `start_time`. Only one block may
    /// be open at a time.
    pub async fn clock_in(
        &self,
        week_start: NaiveDate,
        day: u8,
        start_time: &str,
    ) -> Result<(WeekData, ClockState), TrackerError> {
        if self.load_clock_state().await.is_clocked_in {
            return Err(TrackerError::AlreadyClockedIn);
        }
        let start = format_time(parse_time(start_time)?);
        let (week, id) = self
            .insert_block(week_start, day, TimeBlockDraft::active(start.clone()))
            .await?;

        let date = week_start + chrono::Duration::days(i64::from(day));
        let state = ClockState::clocked_in(id, start, date);
        self.save_clock_state(&state).await;
        info!(date = %date, start = ?state.start_time, "clocked in");
        Ok((week, state))
    }

    pub async fn clock_out(
        &self,
        week_start: NaiveDate,
        day: u8,
        block_id: &str,
        end_time: &str,
    ) -> Result<(WeekData, ClockState), TrackerError> {
        check_day(day)?;
        let stored = self.load_clock_state().await;
        if !stored.is_clocked_in {
            return Err(TrackerError::NotClockedIn);
        }
        if stored.active_block_id.as_deref() != Some(block_id) {
            return Err(TrackerError::BlockNotFound(block_id.to_string()));
        }
        let end = format_time(parse_time(end_time)?);

        let mut week = self.load_week(week_start).await;
        let blocks = week.day_mut(day);
        let present = blocks
            .iter()
            .any(|block| block.id == block_id && block.is_active);
        let mut closed = 0;
        // Without the recorded block, every open block on that day is an orphan.
        for block in blocks
            .iter_mut()
            .filter(|block| block.is_active && (!present || block.id == block_id))
        {
            close_block(block, &end);
            closed += 1;
        }
        if !present {
            warn!(block_id, day, closed, "active block missing, closing open blocks on that day");
        }
        if closed > 0 {
            week.sort_day(day);
            self.save_week(week_start, &week).await;
            info!(block_id, end = %end, "clocked out");
        }

        let state = ClockState::default();
        self.save_clock_state(&state).await;
        Ok((week, state))
    }

    async fn insert_block(
        &self,
        week_start: NaiveDate,
        day: u8,
        draft: TimeBlockDraft,
    ) -> Result<(WeekData, String), TrackerError> {
        check_day(day)?;
        let mut week = self.load_week(week_start).await;
        let id = generate_id();
        week.day_mut(day).push(TimeBlock::from_draft(id.clone(), draft));
        week.sort_day(day);
        self.save_week(week_start, &week).await;
        Ok((week, id))
    }

    async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                error!(key, "failed to read stored data: {err}");
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                error!(key, "failed to parse stored data: {err}");
                T::default()
            }
        }
    }

    async fn persist<T: serde::Serialize>(&self, key: &str, value: &T) {
        let result = match serde_json::to_string(value) {
            Ok(payload) => self.store.set(key, payload).await,
            Err(err) => Err(StorageError::from(err)),
        };
        if let Err(err) = result {
            error!(key, "failed to save data: {err}");
        }
    }
}

fn close_block(block: &mut TimeBlock, end: &str) {
    block.end_time = Some(end.to_string());
    block.is_active = false;
    if block.description == ACTIVE_SESSION_DESCRIPTION {
        block.description = DEFAULT_DESCRIPTION.to_string();
    }
}

fn check_day(day: u8) -> Result<(), TrackerError> {
    if day > 6 {
        return Err(TrackerError::InvalidDayIndex(day));
    }
    Ok(())
}

/// Time-ordered unique id: millisecond timestamp followed by random bits.
fn generate_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}
