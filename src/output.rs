use anyhow::Context;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::areas::AreaSet;
use crate::combine::CombinedAreaDensity;

/// Every census area with its original geometry and properties, plus `transit_density`
/// and `stop_count`.
///
/// `densities` must be in the same order as `areas`, which is what [crate::combine::combine]
/// returns when given [AreaSet::ids].
pub fn to_feature_collection(
    areas: &AreaSet,
    densities: &[CombinedAreaDensity],
) -> FeatureCollection {
    let features = areas
        .areas
        .iter()
        .zip(densities)
        .map(|(area, density)| {
            debug_assert_eq!(area.id, density.area_id);
            let mut properties = area.properties.clone().unwrap_or_else(JsonObject::new);
            properties.insert(
                "transit_density".to_string(),
                JsonValue::from(density.transit_density),
            );
            properties.insert("stop_count".to_string(), JsonValue::from(density.stop_count));
            Feature {
                bbox: None,
                geometry: Some(area.geometry.clone()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson(
    path: &Path,
    areas: &AreaSet,
    densities: &[CombinedAreaDensity],
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("could not create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &to_feature_collection(areas, densities))?;
    writer.flush()?;
    Ok(())
}
