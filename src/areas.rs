use geo::MapCoords;
use geo_types::{Coord, MultiPolygon};
use geojson::{GeoJson, JsonObject, JsonValue};
use log::info;
use std::path::Path;

use crate::error::AreaError;
use crate::projection::project_lng_lat;

/// A census area as read from the input file
#[derive(Debug, Clone)]
pub struct Area {
    pub id: String,
    /// Original geometry, written back untouched
    pub geometry: geojson::Geometry,
    pub properties: Option<JsonObject>,
    /// Same shape in longitude/latitude
    pub polygon: MultiPolygon<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct AreaSet {
    pub areas: Vec<Area>,
}

impl AreaSet {
    pub fn load(path: &Path, id_property: &str) -> Result<Self, AreaError> {
        info!("Loading areas from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| AreaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let result = Self::from_geojson_str(&text, id_property)?;
        info!("{} areas loaded", result.areas.len());
        Ok(result)
    }

    pub fn from_geojson_str(text: &str, id_property: &str) -> Result<Self, AreaError> {
        let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
            return Err(AreaError::NotAFeatureCollection);
        };

        let mut areas = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let id = feature
                .property(id_property)
                .and_then(id_to_string)
                .ok_or_else(|| AreaError::MissingId {
                    index,
                    property: id_property.to_string(),
                })?;

            let Some(geometry) = feature.geometry else {
                return Err(AreaError::UnsupportedGeometry { area_id: id });
            };
            let Some(polygon) = to_multi_polygon(&geometry) else {
                return Err(AreaError::UnsupportedGeometry { area_id: id });
            };

            areas.push(Area {
                id,
                geometry,
                properties: feature.properties,
                polygon,
            });
        }

        if areas.is_empty() {
            return Err(AreaError::Empty);
        }
        Ok(AreaSet { areas })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|a| a.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Every area in planar coordinates, see [crate::projection]
    pub fn projected(&self) -> Result<Vec<(String, MultiPolygon<f64>)>, AreaError> {
        self.areas
            .iter()
            .map(|area| {
                area.polygon
                    .try_map_coords(|c: Coord<f64>| {
                        project_lng_lat(c.x, c.y).map(|[x, y]| Coord { x, y })
                    })
                    .map(|projected| (area.id.clone(), projected))
                    .map_err(|source| AreaError::Projection {
                        area_id: area.id.clone(),
                        source,
                    })
            })
            .collect()
    }
}

// Numeric identifiers are kept in their textual form, as the output keys on strings
fn id_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_multi_polygon(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    match geo_types::Geometry::<f64>::try_from(geometry.clone()).ok()? {
        geo_types::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        geo_types::Geometry::MultiPolygon(mp) => Some(mp),
        _ => None,
    }
}
