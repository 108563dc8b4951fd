//! Serde adapters for the backend's loosely-typed collision columns.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accepts a coordinate either as a JSON number or a numeric string.
pub fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate '{text}'"))),
    }
}

pub mod calendar_date {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%m/%d/%Y %I:%M:%S %p"];

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();

        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|dt| dt.date())
            })
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
    }
}

pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NumberOrString;

    const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H%M"];

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    /// Also accepts the `HHMM` integer form some exports use (`830` is 08:30).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = match NumberOrString::deserialize(deserializer)? {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            NumberOrString::Number(value) if value >= 0.0 => format!("{:04}", value as u32),
            NumberOrString::Number(value) => {
                return Err(serde::de::Error::custom(format!("invalid time {value}")));
            }
            NumberOrString::Text(text) => text,
        };
        let raw = raw.trim();

        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{raw}'")))
    }
}
