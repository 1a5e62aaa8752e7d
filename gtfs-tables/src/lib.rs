/*! Reads the handful of [GTFS](https://gtfs.org/) schedule tables needed to count stop events.

A feed is a directory of CSV files. Only the following are read:

* `stops.txt`, `trips.txt` and `stop_times.txt`, which are mandatory,
* `calendar.txt` and `calendar_dates.txt`, which are optional (a feed may define its
  services with either of them, or both).

To get started, see [RawGtfs].

## Design decisions

### Tolerant dates

Published feeds are often round-tripped through spreadsheet tools, so a date such as
`20240101` may come back as `20240101.0`. The fractional suffix is dropped before parsing.
A date that still cannot be parsed is read as `None` instead of failing the whole file.

### Raw rows only

Objects are kept as close as possible to their CSV representation. References between
tables (a trip to its service, a stop time to its trip) are not verified here: a dangling
reference is a data-quality issue the caller decides how to weigh.
*/
#![warn(missing_docs)]

#[macro_use]
extern crate derivative;

pub mod error;
mod gtfs_reader;
pub(crate) mod objects;
mod raw_gtfs;
mod serde_helpers;


pub use error::Error;
pub use gtfs_reader::GtfsReader;
pub use objects::*;
pub use raw_gtfs::RawGtfs;
pub use serde_helpers::parse_date;
