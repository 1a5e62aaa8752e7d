use gtfs_tables::{RawStopTime, RawTrip};
use log::debug;
use rustc_hash::FxHashMap;

use crate::calendar::ServiceDays;
use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq)]
pub struct StopDensity {
    pub stop_id: String,
    /// Sum of the active days of every trip visiting the stop, once per visit
    pub total_events: u64,
    /// Visits per day over the feed window
    pub avg_daily_freq: f64,
}

/// Number of scheduled visits per stop over the whole feed
#[derive(Default, Debug)]
pub struct StopEvents {
    pub events: FxHashMap<String, u64>,
    /// Trips referencing a service without calendar data. They weigh nothing.
    pub unresolved_trips: usize,
    /// Stop times referencing an unknown trip. They weigh nothing.
    pub unknown_trip_visits: usize,
}

impl StopEvents {
    pub fn count(
        trips: &[RawTrip],
        stop_times: &[RawStopTime],
        service_days: &ServiceDays,
    ) -> Self {
        let mut result = StopEvents::default();

        let mut trip_days: FxHashMap<&str, u32> = FxHashMap::default();
        for trip in trips {
            let days = match service_days.get(&trip.service_id) {
                Some(days) => *days,
                None => {
                    result.unresolved_trips += 1;
                    0
                }
            };
            trip_days.insert(trip.id.as_str(), days);
        }

        for st in stop_times {
            let days = match trip_days.get(st.trip_id.as_str()) {
                Some(days) => *days,
                None => {
                    result.unknown_trip_visits += 1;
                    0
                }
            };
            *result.events.entry(st.stop_id.clone()).or_default() += u64::from(days);
        }

        if result.unresolved_trips > 0 {
            debug!(
                "{} trips reference a service without calendar data",
                result.unresolved_trips
            );
        }
        if result.unknown_trip_visits > 0 {
            debug!(
                "{} stop times reference an unknown trip",
                result.unknown_trip_visits
            );
        }
        result
    }

    /// Turns event counts into daily frequencies, keeping only stops that are served.
    ///
    /// Sorted by `stop_id`.
    pub fn into_densities(self, window_days: i64) -> Result<Vec<StopDensity>, FeedError> {
        if window_days <= 0 {
            return Err(FeedError::InvalidWindow(window_days));
        }

        let mut densities: Vec<StopDensity> = self
            .events
            .into_iter()
            .map(|(stop_id, total_events)| StopDensity {
                stop_id,
                total_events,
                avg_daily_freq: total_events as f64 / window_days as f64,
            })
            .filter(|s| s.avg_daily_freq > 0.0)
            .collect();
        densities.sort_by(|a, b| a.stop_id.cmp(&b.stop_id));
        Ok(densities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: &str, service_id: &str) -> RawTrip {
        RawTrip {
            id: id.to_string(),
            service_id: service_id.to_string(),
        }
    }

    fn visit(trip_id: &str, stop_id: &str) -> RawStopTime {
        RawStopTime {
            trip_id: trip_id.to_string(),
            stop_id: stop_id.to_string(),
        }
    }

    fn days(pairs: &[(&str, u32)]) -> ServiceDays {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn two_trips_over_ten_days() {
        let events = StopEvents::count(
            &[trip("t1", "a"), trip("t2", "b")],
            &[visit("t1", "s"), visit("t2", "s")],
            &days(&[("a", 4), ("b", 6)]),
        );
        let densities = events.into_densities(10).unwrap();
        assert_eq!(1, densities.len());
        assert_eq!(10, densities[0].total_events);
        assert_eq!(1.0, densities[0].avg_daily_freq);
    }

    #[test]
    fn loop_route_counts_every_visit() {
        let events = StopEvents::count(
            &[trip("t1", "a")],
            &[visit("t1", "s"), visit("t1", "x"), visit("t1", "s")],
            &days(&[("a", 5)]),
        );
        assert_eq!(Some(&10), events.events.get("s"));
        assert_eq!(Some(&5), events.events.get("x"));
    }

    #[test]
    fn unresolved_references_weigh_nothing() {
        let events = StopEvents::count(
            &[trip("t1", "a"), trip("t2", "no_calendar")],
            &[
                visit("t1", "s1"),
                visit("t2", "s1"),
                visit("t2", "s2"),
                visit("ghost", "s3"),
            ],
            &days(&[("a", 3)]),
        );
        assert_eq!(1, events.unresolved_trips);
        assert_eq!(1, events.unknown_trip_visits);

        let densities = events.into_densities(3).unwrap();
        let ids: Vec<&str> = densities.iter().map(|d| d.stop_id.as_str()).collect();
        assert_eq!(vec!["s1"], ids);
        assert_eq!(1.0, densities[0].avg_daily_freq);
    }

    #[test]
    fn sorted_by_stop_id() {
        let events = StopEvents::count(
            &[trip("t1", "a")],
            &[visit("t1", "c"), visit("t1", "a"), visit("t1", "b")],
            &days(&[("a", 1)]),
        );
        let densities = events.into_densities(1).unwrap();
        let ids: Vec<&str> = densities.iter().map(|d| d.stop_id.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], ids);
    }

    #[test]
    fn no_service_gives_no_stops() {
        let events = StopEvents::count(
            &[trip("t1", "a")],
            &[visit("t1", "s")],
            &days(&[("a", 0)]),
        );
        assert!(events.into_densities(7).unwrap().is_empty());
    }

    #[test]
    fn invalid_window() {
        let events = StopEvents::default();
        assert!(matches!(
            events.into_densities(0),
            Err(FeedError::InvalidWindow(0))
        ));
    }
}
