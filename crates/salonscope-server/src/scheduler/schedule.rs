//! Normalises user-supplied monitoring schedules to 6-field cron.
//!
//! Accepted forms:
//! - `HH:MM daily` (e.g. the default `09:00 daily`), run once a day at that
//!   UTC time;
//! - 5-field cron (`0 9 * * *`), run at second zero;
//! - 6-field cron with a leading seconds field.
//!
//! Field values are validated when the job is built, not here.

use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_SCHEDULE: &str = "09:00 daily";

static DAILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(\d{1,2}):(\d{2})\s+daily$").expect("valid daily schedule regex")
});

/// Returns the 6-field cron expression for `schedule`, or a reason it was
/// rejected.
pub fn normalize(schedule: &str) -> Result<String, String> {
    let schedule = schedule.trim();
    if schedule.is_empty() {
        return Err("schedule is empty".to_string());
    }

    if let Some(caps) = DAILY.captures(schedule) {
        let hour: u32 = caps[1].parse().map_err(|_| "invalid hour".to_string())?;
        let minute: u32 = caps[2].parse().map_err(|_| "invalid minute".to_string())?;
        if hour > 23 || minute > 59 {
            return Err(format!("{hour:02}:{minute:02} is not a time of day"));
        }
        return Ok(format!("0 {minute} {hour} * * *"));
    }

    let fields: Vec<&str> = schedule.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 => Ok(fields.join(" ")),
        n => Err(format!("expected 5 or 6 cron fields, got {n}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alias_is_nine_am_daily() {
        assert_eq!(normalize(DEFAULT_SCHEDULE).as_deref(), Ok("0 0 9 * * *"));
    }

    #[test]
    fn daily_alias_accepts_any_time_of_day() {
        assert_eq!(normalize("7:30 daily").as_deref(), Ok("0 30 7 * * *"));
        assert_eq!(normalize("23:59 DAILY").as_deref(), Ok("0 59 23 * * *"));
        assert!(normalize("24:00 daily").is_err());
        assert!(normalize("09:60 daily").is_err());
    }

    #[test]
    fn five_field_cron_gains_seconds() {
        assert_eq!(normalize("0 9 * * *").as_deref(), Ok("0 0 9 * * *"));
        assert_eq!(
            normalize("  */15  *  * * MON-FRI ").as_deref(),
            Ok("0 */15 * * * MON-FRI")
        );
    }

    #[test]
    fn six_field_cron_passes_through() {
        assert_eq!(normalize("30 0 9 * * *").as_deref(), Ok("30 0 9 * * *"));
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("every morning").is_err());
        assert!(normalize("* * * *").is_err());
    }
}
