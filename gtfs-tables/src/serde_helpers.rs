use chrono::NaiveDate;
use serde::de::{self, Deserialize, Deserializer};

/// Drops a trailing fractional part, `"20240101.0"` becomes `"20240101"`
pub(crate) fn strip_fraction(s: &str) -> &str {
    let s = s.trim();
    match s.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
        _ => s,
    }
}

/// Parses a `YYYYMMDD` date, tolerating a trailing fractional suffix.
///
/// Returns `None` when the value is not a valid date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = strip_fraction(s);
    if s.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

pub fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<&str>::deserialize(deserializer)?;
    Ok(s.and_then(parse_date))
}

pub fn de_with_optional_float<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(de).and_then(|s| {
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some).map_err(de::Error::custom)
        }
    })
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    Ok(strip_fraction(s) == "1")
}
