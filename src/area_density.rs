use rustc_hash::FxHashMap;

use crate::spatial::StopAssignment;

/// Service of one feed in one area
#[derive(Debug, Clone, PartialEq)]
pub struct AreaDensity {
    pub area_id: String,
    /// Sum of the average daily frequencies of the stops assigned to the area
    pub transit_density: f64,
    pub stop_count: u64,
}

/// Groups stop assignments by area. Sorted by `area_id`.
pub fn aggregate(assignments: &[StopAssignment]) -> Vec<AreaDensity> {
    let mut by_area: FxHashMap<&str, AreaDensity> = FxHashMap::default();
    for assignment in assignments {
        let entry = by_area
            .entry(assignment.area_id.as_str())
            .or_insert_with(|| AreaDensity {
                area_id: assignment.area_id.clone(),
                transit_density: 0.0,
                stop_count: 0,
            });
        entry.transit_density += assignment.avg_daily_freq;
        entry.stop_count += 1;
    }

    let mut result: Vec<AreaDensity> = by_area.into_values().collect();
    result.sort_by(|a, b| a.area_id.cmp(&b.area_id));
    result
}
