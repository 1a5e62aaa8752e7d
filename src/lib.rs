//! Transit service density per census area.
//!
//! Each GTFS feed is reduced to an average number of daily departures per stop, stops are
//! placed in their nearest census area and the per-area sums of all feeds are written back
//! onto the census geometry as GeoJSON.

pub mod area_density;
pub mod areas;
pub mod calendar;
pub mod combine;
pub mod configuration;
pub mod error;
pub mod feed_window;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod spatial;
pub mod stop_events;

pub use configuration::{Configuration, FeedConfig};
pub use error::{AreaError, FeedError};
pub use pipeline::{run, RunSummary};
