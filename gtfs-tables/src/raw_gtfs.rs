use crate::objects::*;
use crate::Error;
use crate::GtfsReader;
use log::debug;
use std::path::{Path, PathBuf};

/// Data structure that map the GTFS csv with little intelligence
///
/// Mandatory tables are read eagerly: a missing or malformed mandatory file fails the whole read.
/// Optional tables are `None` when the file is absent.
#[derive(Debug)]
pub struct RawGtfs {
    /// Directory the tables were read from. It can be a subdirectory of the requested path
    pub root: PathBuf,
    /// Time needed to read and parse the tables in milliseconds
    pub read_duration: i64,
    /// All Calendar, None if the file was absent as it is not mandatory
    pub calendar: Option<Vec<Calendar>>,
    /// All Calendar dates, None if the file was absent as it is not mandatory
    pub calendar_dates: Option<Vec<CalendarDate>>,
    /// All Stops
    pub stops: Vec<Stop>,
    /// All Trips
    pub trips: Vec<RawTrip>,
    /// All StopTimes
    pub stop_times: Vec<RawStopTime>,
}

impl RawGtfs {
    /// Logs some basic statistics about the feed (numbers of elements for each object)
    pub fn log_stats(&self) {
        debug!("GTFS data read from {}:", self.root.display());
        debug!("  Read in {} ms", self.read_duration);
        debug!("  Stops: {}", self.stops.len());
        debug!("  Trips: {}", self.trips.len());
        debug!("  Stop times: {}", self.stop_times.len());
        debug!("  Calendar: {}", optional_file_summary(&self.calendar));
        debug!(
            "  Calendar dates: {}",
            optional_file_summary(&self.calendar_dates)
        );
    }

    /// Reads the raw GTFS from a local directory
    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        GtfsReader::default().read_from_path(path)
    }

    /// All calendar rows, empty if `calendar.txt` was absent
    pub fn calendar_rules(&self) -> &[Calendar] {
        self.calendar.as_deref().unwrap_or_default()
    }

    /// All calendar_dates rows, empty if `calendar_dates.txt` was absent
    pub fn calendar_exceptions(&self) -> &[CalendarDate] {
        self.calendar_dates.as_deref().unwrap_or_default()
    }
}

fn optional_file_summary<T>(objs: &Option<Vec<T>>) -> String {
    match objs {
        Some(vec) => format!("{} objects", vec.len()),
        None => "File not present".to_string(),
    }
}
