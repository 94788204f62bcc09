use crate::dates::{format_time, parse_time};
use crate::errors::TrackerError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_DESCRIPTION: &str = "Work";
pub const ACTIVE_SESSION_DESCRIPTION: &str = "Active Session";

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: String,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
}

impl TimeBlock {
    pub fn from_draft(id: String, draft: TimeBlockDraft) -> Self {
        Self {
            id,
            start_time: draft.start_time,
            end_time: draft.end_time,
            description: draft.description,
            is_active: draft.is_active,
        }
    }

    /// Minutes covered by a completed block. Open blocks and blocks whose
    /// end precedes their start count as `None`.
    pub fn completed_minutes(&self) -> Option<i64> {
        let end = self.end_time.as_deref()?;
        crate::dates::duration(&self.start_time, end).ok()
    }
}

/// Every field of a time block except its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBlockDraft {
    pub start_time: String,
    pub end_time: Option<String>,
    pub description: String,
    pub is_active: bool,
}

impl TimeBlockDraft {
    pub fn active(start_time: String) -> Self {
        Self {
            start_time,
            end_time: None,
            description: ACTIVE_SESSION_DESCRIPTION.to_string(),
            is_active: true,
        }
    }
}

/// Raw add/edit form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockInput {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub description: String,
}

impl TimeBlockInput {
    pub fn validate(&self) -> Result<TimeBlockDraft, TrackerError> {
        if self.start_time.trim().is_empty() || self.end_time.trim().is_empty() {
            return Err(TrackerError::MissingTime);
        }

        let start = parse_time(&self.start_time)?;
        let end = parse_time(&self.end_time)?;
        if start >= end {
            return Err(TrackerError::InvalidInterval);
        }

        let description = match self.description.trim() {
            "" => default_description(),
            trimmed => trimmed.to_string(),
        };

        Ok(TimeBlockDraft {
            start_time: format_time(start),
            end_time: Some(format_time(end)),
            description,
            is_active: false,
        })
    }
}

/// Day index (0 = Monday) to that day's blocks, sorted by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekData {
    pub days: BTreeMap<u8, Vec<TimeBlock>>,
}

impl WeekData {
    pub fn day(&self, day: u8) -> &[TimeBlock] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn day_mut(&mut self, day: u8) -> &mut Vec<TimeBlock> {
        self.days.entry(day).or_default()
    }

    pub fn find(&self, day: u8, id: &str) -> Option<&TimeBlock> {
        self.day(day).iter().find(|block| block.id == id)
    }

    pub fn sort_day(&mut self, day: u8) {
        if let Some(blocks) = self.days.get_mut(&day) {
            blocks.sort_by_key(|block| parse_time(&block.start_time).ok());
        }
    }

    /// Sum of completed block minutes for one day.
    pub fn day_total(&self, day: u8) -> i64 {
        self.day(day)
            .iter()
            .filter_map(TimeBlock::completed_minutes)
            .sum()
    }
}

/// Week key (ISO date of the Monday) to that week's data.
pub type AllData = BTreeMap<String, WeekData>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    pub is_clocked_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Calendar day the open block was recorded on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ClockState {
    pub fn clocked_in(block_id: String, start_time: String, date: NaiveDate) -> Self {
        Self {
            is_clocked_in: true,
            active_block_id: Some(block_id),
            start_time: Some(start_time),
            date: Some(date),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekendsRequest {
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSnapshot {
    #[serde(flatten)]
    pub block: TimeBlock,
    pub duration_minutes: Option<i64>,
    pub duration_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub index: u8,
    pub date: NaiveDate,
    pub label: String,
    pub is_today: bool,
    pub is_future: bool,
    pub can_add: bool,
    pub show_clock: bool,
    pub blocks: Vec<BlockSnapshot>,
    pub total_minutes: i64,
    pub total_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FormSnapshot {
    Closed,
    #[serde(rename_all = "camelCase")]
    Adding {
        day: u8,
        start_time: String,
        end_time: String,
    },
    #[serde(rename_all = "camelCase")]
    Editing {
        day: u8,
        block_id: String,
        start_time: String,
        end_time: String,
        description: String,
    },
}

/// Everything the page needs to draw the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSnapshot {
    pub week_key: String,
    pub range_label: String,
    pub show_weekends: bool,
    pub days: Vec<DaySnapshot>,
    pub week_total_minutes: i64,
    pub week_total_label: String,
    pub remaining_minutes: i64,
    pub remaining_label: String,
    pub clock: ClockState,
    pub form: FormSnapshot,
}
