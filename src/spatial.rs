use geo::{BoundingRect, Contains};
use geo_types::{MultiPolygon, Point};
use gtfs_tables::Stop;
use log::warn;
use proj::ProjError;
use rstar::primitives::{GeomWithData, Line, Rectangle};
use rstar::RTree;
use rustc_hash::FxHashMap;

use crate::projection::project_lng_lat;
use crate::stop_events::StopDensity;

/// Planar census areas, indexed for nearest-area queries.
///
/// Each area is stored twice in R-trees: its bounding box, to find the polygons a point
/// lies in, and every segment of its rings, to find the closest boundary of the polygons
/// it does not lie in.
pub struct AreaIndex {
    ids: Vec<String>,
    polygons: Vec<MultiPolygon<f64>>,
    envelopes: RTree<GeomWithData<Rectangle<[f64; 2]>, usize>>,
    edges: RTree<GeomWithData<Line<[f64; 2]>, usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestArea {
    pub area: usize,
    /// Planar distance, 0 when the point is inside or on the area
    pub distance: f64,
}

impl AreaIndex {
    pub fn new(areas: Vec<(String, MultiPolygon<f64>)>) -> Self {
        let mut envelopes = Vec::new();
        let mut edges = Vec::new();

        for (index, (_, polygon)) in areas.iter().enumerate() {
            if let Some(rect) = polygon.bounding_rect() {
                let min = rect.min();
                let max = rect.max();
                envelopes.push(GeomWithData::new(
                    Rectangle::from_corners([min.x, min.y], [max.x, max.y]),
                    index,
                ));
            }
            for part in polygon {
                for ring in std::iter::once(part.exterior()).chain(part.interiors()) {
                    for line in ring.lines() {
                        edges.push(GeomWithData::new(
                            Line::new([line.start.x, line.start.y], [line.end.x, line.end.y]),
                            index,
                        ));
                    }
                }
            }
        }

        let (ids, polygons) = areas.into_iter().unzip();
        AreaIndex {
            ids,
            polygons,
            envelopes: RTree::bulk_load(envelopes),
            edges: RTree::bulk_load(edges),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn area_id(&self, area: usize) -> &str {
        &self.ids[area]
    }

    /// Area closest to `point`, `None` only when the index is empty.
    ///
    /// Equidistant areas are resolved in favour of the lowest area id.
    pub fn nearest(&self, point: [f64; 2]) -> Option<NearestArea> {
        let mut best: Option<(f64, usize)> = None;

        let query = Point::new(point[0], point[1]);
        for envelope in self.envelopes.locate_all_at_point(&point) {
            if self.polygons[envelope.data].contains(&query) {
                best = self.better(best, 0.0, envelope.data);
            }
        }

        // Edges come ordered by distance: stop once they are farther than the best match
        for (edge, distance_2) in self.edges.nearest_neighbor_iter_with_distance_2(&point) {
            if matches!(best, Some((best_2, _)) if distance_2 > best_2) {
                break;
            }
            best = self.better(best, distance_2, edge.data);
        }

        best.map(|(distance_2, area)| NearestArea {
            area,
            distance: distance_2.sqrt(),
        })
    }

    fn better(
        &self,
        best: Option<(f64, usize)>,
        distance_2: f64,
        area: usize,
    ) -> Option<(f64, usize)> {
        match best {
            Some((best_2, best_area))
                if best_2 < distance_2
                    || (best_2 == distance_2 && self.ids[best_area] <= self.ids[area]) =>
            {
                best
            }
            _ => Some((distance_2, area)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopAssignment {
    pub stop_id: String,
    pub area_id: String,
    pub distance: f64,
    pub avg_daily_freq: f64,
}

#[derive(Debug, Default)]
pub struct Assignments {
    pub assigned: Vec<StopAssignment>,
    /// Served stops that could not be placed: unknown in stops.txt, without coordinates or
    /// failing to project
    pub unplaced: usize,
}

pub fn assign_stops(densities: &[StopDensity], stops: &[Stop], index: &AreaIndex) -> Assignments {
    assign_stops_with(densities, stops, index, project_lng_lat)
}

/// Assigns every served stop to its nearest area, projecting stop positions with `project`
pub fn assign_stops_with<F>(
    densities: &[StopDensity],
    stops: &[Stop],
    index: &AreaIndex,
    project: F,
) -> Assignments
where
    F: Fn(f64, f64) -> Result<[f64; 2], ProjError>,
{
    let stops_by_id: FxHashMap<&str, &Stop> = stops.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut result = Assignments::default();
    for density in densities {
        let Some((lng, lat)) = stops_by_id
            .get(density.stop_id.as_str())
            .and_then(|stop| stop.lng_lat())
        else {
            result.unplaced += 1;
            continue;
        };

        let point = match project(lng, lat) {
            Ok(point) => point,
            Err(e) => {
                warn!("Could not project stop {} ({lng}, {lat}): {e}", density.stop_id);
                result.unplaced += 1;
                continue;
            }
        };

        let Some(nearest) = index.nearest(point) else {
            result.unplaced += 1;
            continue;
        };

        result.assigned.push(StopAssignment {
            stop_id: density.stop_id.clone(),
            area_id: index.area_id(nearest.area).to_string(),
            distance: nearest.distance,
            avg_daily_freq: density.avg_daily_freq,
        });
    }

    if result.unplaced > 0 {
        warn!(
            "{} served stops could not be placed and were left out",
            result.unplaced
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, LineString, Polygon};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]])
    }

    fn index() -> AreaIndex {
        AreaIndex::new(vec![
            ("b".to_string(), square(0.0, 0.0, 10.0)),
            ("a".to_string(), square(20.0, 0.0, 10.0)),
            ("c".to_string(), square(10.0, 20.0, 10.0)),
        ])
    }

    #[test]
    fn inside_polygon() {
        let index = index();
        let nearest = index.nearest([5.0, 5.0]).unwrap();
        assert_eq!("b", index.area_id(nearest.area));
        assert_eq!(0.0, nearest.distance);
    }

    #[test]
    fn outside_every_polygon() {
        let index = index();
        let nearest = index.nearest([12.0, 5.0]).unwrap();
        assert_eq!("b", index.area_id(nearest.area));
        assert!((nearest.distance - 2.0).abs() < 1e-9);

        let nearest = index.nearest([15.0, 40.0]).unwrap();
        assert_eq!("c", index.area_id(nearest.area));
        assert!((nearest.distance - 10.0).abs() < 1e-9);
    }

    #[test]
    fn equidistant_areas_pick_lowest_id() {
        let index = index();
        // halfway between "b" (x <= 10) and "a" (x >= 20)
        let nearest = index.nearest([15.0, 5.0]).unwrap();
        assert_eq!("a", index.area_id(nearest.area));
        assert!((nearest.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn shared_boundary_picks_lowest_id() {
        let index = AreaIndex::new(vec![
            ("z".to_string(), square(0.0, 0.0, 10.0)),
            ("y".to_string(), square(10.0, 0.0, 10.0)),
        ]);
        let nearest = index.nearest([10.0, 5.0]).unwrap();
        assert_eq!("y", index.area_id(nearest.area));
        assert_eq!(0.0, nearest.distance);
    }

    #[test]
    fn inside_a_hole() {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (0.0, 30.0),
            (0.0, 0.0),
        ]);
        let hole = LineString::from(vec![
            (10.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (10.0, 20.0),
            (10.0, 10.0),
        ]);
        let ring = MultiPolygon::new(vec![Polygon::new(exterior, vec![hole])]);
        let index = AreaIndex::new(vec![
            ("ring".to_string(), ring),
            ("core".to_string(), square(14.0, 14.0, 2.0)),
        ]);

        let nearest = index.nearest([11.0, 15.0]).unwrap();
        assert_eq!("ring", index.area_id(nearest.area));
        assert!((nearest.distance - 1.0).abs() < 1e-9);

        let nearest = index.nearest([15.0, 15.0]).unwrap();
        assert_eq!("core", index.area_id(nearest.area));
    }

    #[test]
    fn empty_index() {
        let index = AreaIndex::new(vec![]);
        assert!(index.is_empty());
        assert_eq!(None, index.nearest([0.0, 0.0]));
    }

    fn stop(id: &str, lng: Option<f64>, lat: Option<f64>) -> Stop {
        Stop {
            id: id.to_string(),
            name: id.to_string(),
            longitude: lng,
            latitude: lat,
        }
    }

    fn density(stop_id: &str, avg_daily_freq: f64) -> StopDensity {
        StopDensity {
            stop_id: stop_id.to_string(),
            total_events: 1,
            avg_daily_freq,
        }
    }

    #[test]
    fn every_placed_stop_is_assigned() {
        let index = index();
        let stops = vec![
            stop("s1", Some(5.0), Some(5.0)),
            stop("s2", Some(100.0), Some(-50.0)),
            stop("s3", None, None),
        ];
        let densities = vec![
            density("s1", 2.0),
            density("s2", 0.5),
            density("s3", 1.0),
            density("missing", 1.0),
        ];
        let result = assign_stops_with(&densities, &stops, &index, |x, y| Ok([x, y]));
        assert_eq!(2, result.unplaced);
        assert_eq!(2, result.assigned.len());
        assert_eq!("b", result.assigned[0].area_id);
        assert_eq!("a", result.assigned[1].area_id);
        assert_eq!(0.5, result.assigned[1].avg_daily_freq);
        assert!(result.assigned[1].distance > 0.0);
    }

    #[test]
    fn projection_failure_skips_only_that_stop() {
        let index = index();
        let stops = vec![
            stop("s1", Some(5.0), Some(5.0)),
            stop("far", Some(500.0), Some(5.0)),
            stop("s2", Some(25.0), Some(5.0)),
        ];
        let densities = vec![density("far", 3.0), density("s1", 1.0), density("s2", 2.0)];
        let result = assign_stops_with(&densities, &stops, &index, |x, y| {
            if x > 180.0 {
                Err(ProjError::Projection("longitude out of range".to_string()))
            } else {
                Ok([x, y])
            }
        });
        assert_eq!(1, result.unplaced);
        let areas: Vec<&str> = result.assigned.iter().map(|a| a.area_id.as_str()).collect();
        assert_eq!(vec!["b", "a"], areas);
    }
}
