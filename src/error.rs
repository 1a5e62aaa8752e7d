use thiserror::Error;

/// Reasons a single feed is skipped. None of them stops the other feeds.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("could not read the feed tables")]
    Load(#[from] gtfs_tables::Error),
    #[error("no valid date information found in calendar.txt or calendar_dates.txt")]
    NoCalendarDates,
    #[error("invalid feed duration of {0} days")]
    InvalidWindow(i64),
}

/// Problems with the census area input. Any of them aborts the whole run.
#[derive(Error, Debug)]
pub enum AreaError {
    #[error("could not read area file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse area file as GeoJSON")]
    GeoJson(#[from] geojson::Error),
    #[error("area file must be a FeatureCollection")]
    NotAFeatureCollection,
    #[error("feature #{index} has no '{property}' property")]
    MissingId { index: usize, property: String },
    #[error("area {area_id} is not a polygon or multipolygon")]
    UnsupportedGeometry { area_id: String },
    #[error("area file contains no areas")]
    Empty,
    #[error("could not project area {area_id}")]
    Projection {
        area_id: String,
        #[source]
        source: proj::ProjError,
    },
}
