use proj::{Proj, ProjError};

/// PT-TM06 / ETRS89 (EPSG:3763), in metres. Distances and areas stay accurate over mainland Portugal.
pub const PROJSTRING: &str = "+proj=tmerc +lat_0=39.6682583333333 +lon_0=-8.13310833333333 +k=1 +x_0=0 +y_0=0 +ellps=GRS80 +units=m +no_defs";

thread_local! {
    static PROJ: Proj = Proj::new(PROJSTRING).expect("PROJSTRING is a valid proj definition");
}

pub fn project_lng_lat(lng: f64, lat: f64) -> Result<[f64; 2], ProjError> {
    let coord = PROJ.with(|p| p.project((lng.to_radians(), lat.to_radians()), false))?;
    Ok([coord.0, coord.1])
}
