use log::info;
use serde::Deserialize;

use crate::{Error, RawGtfs};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Allows to parameterize how the parsing library behaves
///
/// ```no_run
///let gtfs = gtfs_tables::GtfsReader::default()
///    .trim_fields(false)
///    .read_from_path("fixtures/basic")?;
///assert_eq!(2, gtfs.trips.len());
/// # Ok::<(), gtfs_tables::Error>(())
///```
#[derive(Derivative)]
#[derivative(Default)]
pub struct GtfsReader {
    /// Trim the whitespace around every field (default: true)
    ///
    /// Switching it off is faster on large, clean feeds
    #[derivative(Default(value = "true"))]
    pub trim_fields: bool,
}

impl GtfsReader {
    /// Should the fields be trimmed (default: true)
    pub fn trim_fields(mut self, trim_fields: bool) -> Self {
        self.trim_fields = trim_fields;
        self
    }

    /// Reads the tables from a local directory
    ///
    /// Some archives wrap the feed in a folder. When `stops.txt` is not at the top of `path`,
    /// the first subdirectory that has one is used instead.
    pub fn read_from_path<P>(&self, path: P) -> Result<RawGtfs, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }
        let root = find_feed_root(path)?;
        if root != path {
            info!("Found GTFS root in subdirectory {}", root.display());
        }

        let started = Instant::now();
        let gtfs = RawGtfs {
            stops: self.read_table(&root, "stops.txt")?,
            trips: self.read_table(&root, "trips.txt")?,
            stop_times: self.read_table(&root, "stop_times.txt")?,
            calendar: self.read_optional_table(&root, "calendar.txt")?,
            calendar_dates: self.read_optional_table(&root, "calendar_dates.txt")?,
            read_duration: started.elapsed().as_millis() as i64,
            root,
        };
        gtfs.log_stats();
        Ok(gtfs)
    }

    fn read_table<O>(&self, root: &Path, file_name: &str) -> Result<Vec<O>, Error>
    where
        for<'de> O: Deserialize<'de>,
    {
        self.read_optional_table(root, file_name)?
            .ok_or_else(|| Error::MissingFile(file_name.to_string()))
    }

    fn read_optional_table<O>(&self, root: &Path, file_name: &str) -> Result<Option<Vec<O>>, Error>
    where
        for<'de> O: Deserialize<'de>,
    {
        let path = root.join(file_name);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|source| Error::Io {
            file_name: file_name.to_string(),
            source,
        })?;
        self.parse_rows(BufReader::new(file), file_name).map(Some)
    }

    fn parse_rows<R, O>(&self, mut input: R, file_name: &str) -> Result<Vec<O>, Error>
    where
        R: BufRead,
        for<'de> O: Deserialize<'de>,
    {
        skip_bom(&mut input).map_err(|source| Error::Io {
            file_name: file_name.to_string(),
            source,
        })?;

        let csv_error = |source: csv::Error| Error::Csv {
            file_name: file_name.to_string(),
            line: source.position().map(|p| p.line()),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(if self.trim_fields {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .from_reader(input);
        let headers = reader.headers().map_err(csv_error)?.clone();

        // One record buffer reused for every row
        let mut record = csv::StringRecord::new();
        let mut rows = Vec::new();
        while reader.read_record(&mut record).map_err(csv_error)? {
            rows.push(record.deserialize(Some(&headers)).map_err(|source| Error::Csv {
                file_name: file_name.to_string(),
                line: record.position().map(|p| p.line()),
                source,
            })?);
        }
        Ok(rows)
    }
}

fn skip_bom<R: BufRead>(input: &mut R) -> std::io::Result<()> {
    if input.fill_buf()?.starts_with(UTF8_BOM) {
        input.consume(UTF8_BOM.len());
    }
    Ok(())
}

fn find_feed_root(path: &Path) -> Result<PathBuf, Error> {
    if path.join("stops.txt").is_file() {
        return Ok(path.to_path_buf());
    }
    let entries = std::fs::read_dir(path).map_err(|source| Error::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;
    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(|d| d.ok().map(|d| d.path()))
        .filter(|d| d.is_dir())
        .collect();
    // read_dir order is platform dependent
    subdirs.sort();
    Ok(subdirs
        .into_iter()
        .find(|d| d.join("stops.txt").is_file())
        .unwrap_or_else(|| path.to_path_buf()))
}
