use anyhow::Context;
use gtfs_tables::RawGtfs;
use log::{info, warn};
use rayon::prelude::*;
use std::fmt;

use crate::area_density::{self, AreaDensity};
use crate::areas::AreaSet;
use crate::calendar::Calendar;
use crate::combine::{combine, CombinedAreaDensity};
use crate::configuration::{Configuration, FeedConfig};
use crate::error::FeedError;
use crate::feed_window::FeedWindow;
use crate::output;
use crate::spatial::{self, AreaIndex};
use crate::stop_events::StopEvents;

/// Result of one feed that went through the whole pipeline
#[derive(Debug)]
pub struct FeedDensity {
    pub window: FeedWindow,
    /// Stops with a positive average daily frequency
    pub active_stops: usize,
    /// Active stops that could not be placed on the map
    pub unplaced_stops: usize,
    pub areas: Vec<AreaDensity>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    Processed {
        window: FeedWindow,
        active_stops: usize,
        unplaced_stops: usize,
        matched_areas: usize,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedReport {
    pub name: String,
    pub outcome: FeedOutcome,
}

impl fmt::Display for FeedReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.outcome {
            FeedOutcome::Processed {
                window,
                active_stops,
                unplaced_stops,
                matched_areas,
            } => {
                write!(
                    f,
                    "[{}] ✓ {} active stops in {} areas, valid {}",
                    self.name, active_stops, matched_areas, window
                )?;
                if *unplaced_stops > 0 {
                    write!(f, ", {} stops without position", unplaced_stops)?;
                }
                Ok(())
            }
            FeedOutcome::Skipped { reason } => write!(f, "[{}] ✗ skipped: {}", self.name, reason),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub feeds: Vec<FeedReport>,
    pub areas: Vec<CombinedAreaDensity>,
    pub max_density: f64,
    pub mean_density: f64,
    pub areas_with_service: usize,
}

impl RunSummary {
    fn new(feeds: Vec<FeedReport>, areas: Vec<CombinedAreaDensity>) -> Self {
        let max_density = areas
            .iter()
            .map(|a| a.transit_density)
            .fold(0.0, f64::max);
        let mean_density = if areas.is_empty() {
            0.0
        } else {
            areas.iter().map(|a| a.transit_density).sum::<f64>() / areas.len() as f64
        };
        let areas_with_service = areas.iter().filter(|a| a.transit_density > 0.0).count();
        RunSummary {
            feeds,
            areas,
            max_density,
            mean_density,
            areas_with_service,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.feeds
            .iter()
            .filter(|f| matches!(f.outcome, FeedOutcome::Processed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.feeds.len() - self.succeeded()
    }
}

/// Runs the schedule tables of one feed through window estimation, calendar resolution,
/// stop event counting, spatial assignment and per-area aggregation.
pub fn process_tables(gtfs: &RawGtfs, index: &AreaIndex) -> Result<FeedDensity, FeedError> {
    let window = FeedWindow::estimate(gtfs.calendar_rules(), gtfs.calendar_exceptions())?;
    info!("  Validity: {}", window);

    let service_days =
        Calendar::parse(gtfs.calendar_rules(), gtfs.calendar_exceptions()).active_days();

    let densities = StopEvents::count(&gtfs.trips, &gtfs.stop_times, &service_days)
        .into_densities(window.days)?;
    info!("  {} active stops found", densities.len());

    let assignments = spatial::assign_stops(&densities, &gtfs.stops, index);
    let areas = area_density::aggregate(&assignments.assigned);
    info!("  Matched {} areas", areas.len());

    Ok(FeedDensity {
        window,
        active_stops: densities.len(),
        unplaced_stops: assignments.unplaced,
        areas,
    })
}

pub fn process_feed(feed: &FeedConfig, index: &AreaIndex) -> Result<FeedDensity, FeedError> {
    info!("[{}] Processing {}", feed.name, feed.dir.display());
    let gtfs = RawGtfs::from_path(&feed.dir)?;
    process_tables(&gtfs, index)
}

/// Processes every feed, sequentially or one worker per feed, and combines the successful ones.
///
/// A failing feed is reported and left out; the other feeds are not affected.
pub fn compute(
    config: &Configuration,
    areas: &AreaSet,
    index: &AreaIndex,
) -> (Vec<CombinedAreaDensity>, Vec<FeedReport>) {
    let process = |feed: &FeedConfig| (feed.name.clone(), process_feed(feed, index));
    let results: Vec<(String, Result<FeedDensity, FeedError>)> = if config.parallel {
        config.feeds.par_iter().map(process).collect()
    } else {
        config.feeds.iter().map(process).collect()
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut tables = Vec::new();
    for (name, result) in results {
        let outcome = match result {
            Ok(feed) => {
                let outcome = FeedOutcome::Processed {
                    window: feed.window,
                    active_stops: feed.active_stops,
                    unplaced_stops: feed.unplaced_stops,
                    matched_areas: feed.areas.len(),
                };
                tables.push(feed.areas);
                outcome
            }
            Err(e) => FeedOutcome::Skipped {
                reason: format!("{:#}", anyhow::Error::from(e)),
            },
        };
        reports.push(FeedReport { name, outcome });
    }

    info!("Aggregating {} feeds", tables.len());
    (combine(areas.ids(), &tables), reports)
}

pub fn run(config: &Configuration) -> anyhow::Result<RunSummary> {
    let areas = AreaSet::load(&config.areas_path, &config.area_id_property)
        .context("could not load census areas")?;
    let index = AreaIndex::new(areas.projected()?);

    let (combined, reports) = compute(config, &areas, &index);

    info!("Saving to {}", config.output_path.display());
    output::write_geojson(&config.output_path, &areas, &combined)?;

    let summary = RunSummary::new(reports, combined);
    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    info!("Feeds:");
    for report in &summary.feeds {
        match report.outcome {
            FeedOutcome::Processed { .. } => info!("  {}", report),
            FeedOutcome::Skipped { .. } => warn!("  {}", report),
        }
    }
    info!(
        "  {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    info!("Final Summary:");
    info!("  Max Density: {:.2}", summary.max_density);
    info!("  Mean Density: {:.2}", summary.mean_density);
    info!("  Areas with Service: {}", summary.areas_with_service);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(path: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(path)
    }

    fn config(output_path: PathBuf, feeds: &[(&str, &str)], parallel: bool) -> Configuration {
        Configuration {
            areas_path: fixture("areas.geojson"),
            area_id_property: "BGRI2021".to_string(),
            output_path,
            parallel,
            feeds: feeds
                .iter()
                .map(|(name, dir)| FeedConfig {
                    name: name.to_string(),
                    dir: fixture(dir),
                })
                .collect(),
        }
    }

    fn density_of<'a>(summary: &'a RunSummary, area_id: &str) -> &'a CombinedAreaDensity {
        summary
            .areas
            .iter()
            .find(|a| a.area_id == area_id)
            .unwrap()
    }

    #[test]
    fn single_feed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("out.geojson"), &[("tram", "tram")], false);
        let summary = run(&config).unwrap();

        assert_eq!(3, summary.areas.len());
        assert_eq!(1, summary.succeeded());
        // 14 days window; "baixa" has 10 weekday visits from one trip and 10 from another,
        // "graca" is reached once per weekday
        let baixa = density_of(&summary, "1001");
        assert_eq!(2, baixa.stop_count);
        assert!((baixa.transit_density - 20.0 / 14.0).abs() < 1e-9);
        let graca = density_of(&summary, "1002");
        assert_eq!(1, graca.stop_count);
        assert!((graca.transit_density - 10.0 / 14.0).abs() < 1e-9);
        let belem = density_of(&summary, "1003");
        assert_eq!(0, belem.stop_count);
        assert_eq!(0.0, belem.transit_density);
        assert_eq!(2, summary.areas_with_service);
        // "ghost" is served but has no coordinates
        assert!(matches!(
            summary.feeds[0].outcome,
            FeedOutcome::Processed {
                active_stops: 4,
                unplaced_stops: 1,
                matched_areas: 2,
                ..
            }
        ));
        assert!(summary.feeds[0]
            .to_string()
            .ends_with(", 1 stops without position"));

        let written = std::fs::read_to_string(dir.path().join("out.geojson")).unwrap();
        let geojson: geojson::GeoJson = written.parse().unwrap();
        let geojson::GeoJson::FeatureCollection(collection) = geojson else {
            panic!("output is not a FeatureCollection");
        };
        assert_eq!(3, collection.features.len());
        assert_eq!(
            Some(&serde_json::json!(2)),
            collection.features[0].property("stop_count")
        );
        assert_eq!(
            Some(&serde_json::json!("Baixa")),
            collection.features[0].property("name")
        );
    }

    #[test]
    fn failing_feed_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            dir.path().join("out.geojson"),
            &[("tram", "tram"), ("undated", "undated"), ("absent", "absent")],
            false,
        );
        let summary = run(&config).unwrap();
        assert_eq!(1, summary.succeeded());
        assert_eq!(2, summary.failed());
        assert!(matches!(
            summary.feeds[1].outcome,
            FeedOutcome::Skipped { ref reason } if reason.contains("no valid date")
        ));
        assert_eq!(2, density_of(&summary, "1001").stop_count);
    }

    #[test]
    fn no_successful_feed_still_writes_every_area() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("out.geojson"), &[("undated", "undated")], false);
        let summary = run(&config).unwrap();
        assert_eq!(0, summary.succeeded());
        assert_eq!(3, summary.areas.len());
        assert!(summary.areas.iter().all(|a| a.stop_count == 0));
        assert!(dir.path().join("out.geojson").exists());
    }

    #[test]
    fn same_feed_twice_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let once = run(&config(
            dir.path().join("once.geojson"),
            &[("tram", "tram")],
            false,
        ))
        .unwrap();
        let twice = run(&config(
            dir.path().join("twice.geojson"),
            &[("tram", "tram"), ("tram again", "tram")],
            true,
        ))
        .unwrap();
        for (one, two) in once.areas.iter().zip(&twice.areas) {
            assert_eq!(one.area_id, two.area_id);
            assert_eq!(one.stop_count * 2, two.stop_count);
            assert!((one.transit_density * 2.0 - two.transit_density).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_areas_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path().join("out.geojson"), &[("tram", "tram")], false);
        config.areas_path = fixture("nowhere.geojson");
        assert!(run(&config).is_err());
        assert!(!dir.path().join("out.geojson").exists());
    }
}
