use crate::errors::TrackerError;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};

const TIME_FORMAT: &str = "%H:%M";

/// Monday of the week containing `date`. Sunday belongs to the week that
/// started the Monday before it.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Storage key of the week containing `date`.
pub fn week_key(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}

pub fn week_days(week_start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|offset| week_start + Duration::days(offset as i64))
}

/// Monday-first index of `date` within its week.
pub fn day_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

pub fn parse_time(value: &str) -> Result<NaiveTime, TrackerError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| TrackerError::InvalidTime(value.to_string()))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Whole minutes from `start` to `end` on the same day.
pub fn duration(start: &str, end: &str) -> Result<i64, TrackerError> {
    let start = parse_time(start)?;
    let end = parse_time(end)?;
    if end < start {
        return Err(TrackerError::InvalidInterval);
    }
    Ok((end - start).num_minutes())
}

pub fn format_duration(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Short column label, e.g. "Mon, Oct 12".
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

pub fn is_today(date: NaiveDate) -> bool {
    is_today_at(date, Local::now().date_naive())
}

pub fn is_today_at(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

pub fn is_future_date(date: NaiveDate) -> bool {
    is_future_date_at(date, Local::now().date_naive())
}

pub fn is_future_date_at(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

pub fn current_time_of_day() -> String {
    format_time(Local::now().time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_returns_monday_and_is_idempotent() {
        let mut day = date(2026, 9, 28);
        for _ in 0..21 {
            let start = week_start(day);
            assert_eq!(start.weekday(), Weekday::Mon);
            assert_eq!(week_start(start), start);
            assert!(start <= day && day - start < Duration::days(7));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn sunday_belongs_to_previous_monday() {
        // 2026-10-18 is a Sunday.
        assert_eq!(week_start(date(2026, 10, 18)), date(2026, 10, 12));
        assert_eq!(week_start(date(2026, 10, 19)), date(2026, 10, 19));
        assert_eq!(week_key(date(2026, 10, 14)), "2026-10-12");
    }

    #[test]
    fn week_days_are_seven_consecutive_dates_from_monday() {
        let days = week_days(week_start(date(2026, 12, 31)));
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[6].weekday(), Weekday::Sun);
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
        assert_eq!(days[0], date(2026, 12, 28));
        assert_eq!(days[6], date(2027, 1, 3));
    }

    #[test]
    fn duration_counts_whole_minutes() {
        assert_eq!(duration("09:00", "17:00"), Ok(480));
        assert_eq!(duration("09:15", "09:15"), Ok(0));
        assert_eq!(duration("23:10", "23:59"), Ok(49));
    }

    #[test]
    fn duration_rejects_end_before_start() {
        assert_eq!(duration("17:00", "09:00"), Err(TrackerError::InvalidInterval));
        assert!(matches!(
            duration("nine", "17:00"),
            Err(TrackerError::InvalidTime(_))
        ));
    }

    #[test]
    fn format_duration_renders_hours_and_minutes() {
        assert_eq!(format_duration(480), "8h 0m");
        assert_eq!(format_duration(90), "1h 30m");
        assert_eq!(format_duration(0), "0h 0m");
    }

    #[test]
    fn today_and_future_compare_calendar_days() {
        let today = date(2026, 10, 14);
        assert!(is_today_at(today, today));
        assert!(!is_today_at(date(2026, 10, 13), today));
        assert!(is_future_date_at(date(2026, 10, 15), today));
        assert!(!is_future_date_at(today, today));

        let now = Local::now().date_naive();
        assert!(is_today(now));
        assert!(!is_future_date(now));
        assert!(is_future_date(now + Duration::days(1)));
    }

    #[test]
    fn labels_and_times_are_zero_padded() {
        assert_eq!(format_day_label(date(2026, 10, 5)), "Mon, Oct 5");
        assert_eq!(format_time(NaiveTime::from_hms_opt(7, 3, 59).unwrap()), "07:03");
        assert_eq!(current_time_of_day().len(), 5);
        assert_eq!(day_index(date(2026, 10, 18)), 6);
    }
}
