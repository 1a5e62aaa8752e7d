use chrono::NaiveDate;
use gtfs_tables::{Calendar, CalendarDate};
use std::fmt;

use crate::error::FeedError;

/// Validity period of a whole feed, both ends included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
}

impl FeedWindow {
    /// Spans every date found in `calendar.txt` (start and end dates) and `calendar_dates.txt`.
    ///
    /// Dates that could not be parsed are ignored. A feed without a single usable date has no
    /// window and cannot be turned into a daily rate.
    pub fn estimate(calendar: &[Calendar], exceptions: &[CalendarDate]) -> Result<Self, FeedError> {
        let dates = calendar
            .iter()
            .flat_map(|c| [c.start_date, c.end_date])
            .chain(exceptions.iter().map(|e| e.date))
            .flatten();

        let (start, end) = dates
            .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
            .ok_or(FeedError::NoCalendarDates)?;

        Ok(FeedWindow {
            start,
            end,
            days: (end - start).num_days() + 1,
        })
    }
}

impl fmt::Display for FeedWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} to {} ({} days)", self.start, self.end, self.days)
    }
}
