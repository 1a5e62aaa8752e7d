use crate::serde_helpers::*;
use chrono::NaiveDate;
use serde::Deserialize;

use std::fmt;

/// A calender describes on which days the vehicle runs. See <https://gtfs.org/reference/static/#calendartxt>
#[derive(Debug, Deserialize, Clone)]
pub struct Calendar {
    /// Unique technical identifier (not for the traveller) of this calendar
    #[serde(rename = "service_id")]
    pub id: String,
    /// Does the service run on mondays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub monday: bool,
    /// Does the service run on tuesdays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub tuesday: bool,
    /// Does the service run on wednesdays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub wednesday: bool,
    /// Does the service run on thursdays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub thursday: bool,
    /// Does the service run on fridays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub friday: bool,
    /// Does the service run on saturdays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub saturday: bool,
    /// Does the service run on sundays
    #[serde(deserialize_with = "deserialize_bool", default)]
    pub sunday: bool,
    /// Start service day for the service interval, `None` if it could not be parsed
    #[serde(deserialize_with = "deserialize_option_date", default)]
    pub start_date: Option<NaiveDate>,
    /// End service day for the service interval. This service day is included in the interval
    #[serde(deserialize_with = "deserialize_option_date", default)]
    pub end_date: Option<NaiveDate>,
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => write!(f, "{} from {} to {}", self.id, start, end),
            _ => write!(f, "{}", self.id),
        }
    }
}

impl Calendar {
    /// Weekday flags, from Monday to Sunday
    pub fn weekdays(&self) -> [bool; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
    }
}

/// Whether a [CalendarDate] adds or removes a day of service. See <https://gtfs.org/reference/static/#calendar_datestxt> `exception_type`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Exception {
    /// There will be a service on that day
    Added,
    /// There won’t be a service on that day
    Removed,
}

/// `1` adds the day. Any other value, including the `2` of the GTFS reference, removes it.
impl<'de> Deserialize<'de> for Exception {
    fn deserialize<D>(deserializer: D) -> Result<Exception, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match strip_fraction(&s) {
            "1" => Exception::Added,
            _ => Exception::Removed,
        })
    }
}

/// Defines a specific date that can be added or removed from a [Calendar]. See <https://gtfs.org/reference/static/#calendar_datestxt>
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarDate {
    /// Identifier of the service that is modified at this date
    pub service_id: String,
    /// Date where the service will be added or deleted, `None` if it could not be parsed
    #[serde(deserialize_with = "deserialize_option_date", default)]
    pub date: Option<NaiveDate>,
    /// Is the service added or deleted
    pub exception_type: Exception,
}

/// A physical stop, station or area. See <https://gtfs.org/reference/static/#stopstxt>
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Stop {
    /// Unique technical identifier (not for the traveller) of the stop
    #[serde(rename = "stop_id")]
    pub id: String,
    ///Name of the location. Use a name that people will understand in the local and tourist vernacular
    #[serde(rename = "stop_name", default)]
    pub name: String,
    /// Longitude of the stop
    #[serde(deserialize_with = "de_with_optional_float")]
    #[serde(rename = "stop_lon", default)]
    pub longitude: Option<f64>,
    /// Latitude of the stop
    #[serde(deserialize_with = "de_with_optional_float")]
    #[serde(rename = "stop_lat", default)]
    pub latitude: Option<f64>,
}

impl Stop {
    /// Longitude and latitude of the stop, if both are known
    pub fn lng_lat(&self) -> Option<(f64, f64)> {
        self.longitude.zip(self.latitude)
    }
}

/// A Trip is a vehicle that follows a sequence of [RawStopTime] on certain days. See <https://gtfs.org/reference/static/#tripstxt>
#[derive(Debug, Deserialize, Clone)]
pub struct RawTrip {
    /// Unique technical identifier (not for the traveller) of the Trip
    #[serde(rename = "trip_id")]
    pub id: String,
    /// References the [Calendar] on which this trip runs
    pub service_id: String,
}

/// A [RawStopTime] is one scheduled visit of a trip at a stop. See <https://gtfs.org/reference/static/#stop_timestxt>
///
/// Arrival and departure times are not read: only the visit itself is counted.
#[derive(Debug, Deserialize, Clone)]
pub struct RawStopTime {
    /// [RawTrip] to which this stop time belongs to
    pub trip_id: String,
    /// Identifier of the [Stop] where the vehicle stops
    pub stop_id: String,
}
