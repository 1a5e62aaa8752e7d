use rustc_hash::FxHashMap;

use crate::area_density::AreaDensity;

/// Service of all feeds together in one area
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedAreaDensity {
    pub area_id: String,
    pub transit_density: f64,
    pub stop_count: u64,
}

/// Sums the per-feed tables and lays the result over every known area.
///
/// The output has one row per id in `area_ids`, in the same order. Areas no feed reached
/// get zeros. Feeds are not deduplicated: the same feed given twice counts twice.
pub fn combine<'a, I>(area_ids: I, feeds: &[Vec<AreaDensity>]) -> Vec<CombinedAreaDensity>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut totals: FxHashMap<&str, (f64, u64)> = FxHashMap::default();
    for area in feeds.iter().flatten() {
        let total = totals.entry(area.area_id.as_str()).or_default();
        total.0 += area.transit_density;
        total.1 += area.stop_count;
    }

    area_ids
        .into_iter()
        .map(|area_id| {
            let (transit_density, stop_count) = totals.get(area_id).copied().unwrap_or_default();
            CombinedAreaDensity {
                area_id: area_id.to_string(),
                transit_density,
                stop_count,
            }
        })
        .collect()
}
