use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One GTFS feed, already extracted to a directory
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedConfig {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    /// GeoJSON FeatureCollection of census areas, in WGS84
    pub areas_path: PathBuf,
    /// Feature property holding the area identifier
    #[serde(default = "default_area_id_property")]
    pub area_id_property: String,
    pub output_path: PathBuf,
    /// Process feeds concurrently, one worker per feed
    #[serde(default)]
    pub parallel: bool,
    pub feeds: Vec<FeedConfig>,
}

fn default_area_id_property() -> String {
    "BGRI2021".to_string()
}

impl Configuration {
    /// Reads a JSON configuration. Relative paths are taken from the directory of the file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read configuration {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        Ok(match path.parent() {
            Some(base) => config.relative_to(base),
            None => config,
        })
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        self.areas_path = base.join(&self.areas_path);
        self.output_path = base.join(&self.output_path);
        for feed in &mut self.feeds {
            feed.dir = base.join(&feed.dir);
        }
        self
    }
}
