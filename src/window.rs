//! Do-not-disturb handling.
//!
//! Alerts received outside of the configured hour range are accepted but never
//! played. The range is expressed in whole hours of the local day and both ends
//! are inclusive: with `start_hr = 9` and `end_hr = 22`, a request at `22:00:00`
//! still plays while one at `22:00:01` does not.

use chrono::{NaiveDateTime, NaiveTime};
use log::debug;
use thiserror::Error;

/// Start hour used when the configuration does not provide one.
pub const DEFAULT_START_HR: u32 = 8;
/// End hour used when the configuration does not provide one.
pub const DEFAULT_END_HR: u32 = 23;

/// Invalid hour bound in the configuration.
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    /// Hour outside of `0..=23`.
    #[error("{name} must be between 0 and 23, got {value}")]
    InvalidHour { name: &'static str, value: u32 },
}

/// Hour range during which alerts are allowed to play.
///
/// No timezone conversion is done: `now` passed to [`TimeWindow::allows`] is
/// expected to be in the same local time the hours were written for.
///
/// When `start_hr == end_hr` the window is a single instant. This is accepted
/// as is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Creates a window from its two hour bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidHour`] when an hour is not a valid hour of the day.
    pub fn new(start_hr: u32, end_hr: u32) -> Result<Self, WindowError> {
        Ok(TimeWindow {
            start: hour("start_hr", start_hr)?,
            end: hour("end_hr", end_hr)?,
        })
    }

    /// Whether an alert received at `now` may play.
    pub fn allows(&self, now: NaiveDateTime) -> bool {
        let start = now.date().and_time(self.start);
        let end = now.date().and_time(self.end);

        let allowed = start <= now && now <= end;
        if !allowed {
            debug!("do not disturb is in effect at {}", now);
        }
        allowed
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn hour(name: &'static str, value: u32) -> Result<NaiveTime, WindowError> {
    NaiveTime::from_hms_opt(value, 0, 0).ok_or(WindowError::InvalidHour { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 9, 26)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_allows_inside_window() {
        let window = TimeWindow::new(9, 22).unwrap();
        assert!(window.allows(at(16, 44)));
    }

    #[test]
    fn test_rejects_before_start() {
        let window = TimeWindow::new(9, 22).unwrap();
        assert!(!window.allows(at(8, 44)));
    }

    #[test]
    fn test_rejects_after_end() {
        let window = TimeWindow::new(9, 22).unwrap();
        assert!(!window.allows(at(22, 5)));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let window = TimeWindow::new(9, 22).unwrap();
        assert!(window.allows(at(9, 0)));
        assert!(window.allows(at(22, 0)));
    }

    #[test]
    fn test_same_start_and_end_is_a_single_instant() {
        let window = TimeWindow::new(10, 10).unwrap();
        assert!(window.allows(at(10, 0)));
        assert!(!window.allows(at(10, 1)));
    }

    #[test]
    fn test_invalid_hour() {
        assert_eq!(
            TimeWindow::new(8, 24),
            Err(WindowError::InvalidHour {
                name: "end_hr",
                value: 24
            })
        );
    }

    #[test]
    fn test_display() {
        let window = TimeWindow::new(DEFAULT_START_HR, DEFAULT_END_HR).unwrap();
        assert_eq!(window.to_string(), "[08:00, 23:00]");
    }
}
