//! Speed colour bands for sensor circles.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Colour band for a sensor circle on the speed maps, keyed by km/h.
///
/// Lower bounds are exclusive: exactly 90 km/h is [`SpeedBand::Fast`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeedBand {
    /// 30 km/h and below.
    Standstill,
    /// Above 30 km/h.
    Crawling,
    /// Above 40 km/h.
    Congested,
    /// Above 50 km/h.
    Slow,
    /// Above 60 km/h.
    Moderate,
    /// Above 70 km/h.
    Steady,
    /// Above 80 km/h.
    Fast,
    /// Above 90 km/h.
    FreeFlow,
}

impl SpeedBand {
    /// Band for a speed in km/h.
    #[must_use]
    pub fn for_speed(speed: f64) -> Self {
        if speed > 90.0 {
            Self::FreeFlow
        } else if speed > 80.0 {
            Self::Fast
        } else if speed > 70.0 {
            Self::Steady
        } else if speed > 60.0 {
            Self::Moderate
        } else if speed > 50.0 {
            Self::Slow
        } else if speed > 40.0 {
            Self::Congested
        } else if speed > 30.0 {
            Self::Crawling
        } else {
            Self::Standstill
        }
    }

    /// Fill and stroke colour as a CSS hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::FreeFlow => "#0000FF",
            Self::Fast => "#00BFFF",
            Self::Steady => "#00FF00",
            Self::Moderate => "#ADFF2F",
            Self::Slow => "#FFFF00",
            Self::Congested => "#FFA500",
            Self::Crawling => "#FF4500",
            Self::Standstill => "#FF0000",
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn band_boundaries_are_exclusive() {
        assert_eq!(SpeedBand::for_speed(90.0), SpeedBand::Fast);
        assert_eq!(SpeedBand::for_speed(90.1), SpeedBand::FreeFlow);
        assert_eq!(SpeedBand::for_speed(30.0), SpeedBand::Standstill);
        assert_eq!(SpeedBand::for_speed(31.0), SpeedBand::Crawling);
    }

    #[test]
    fn nan_falls_into_lowest_band() {
        assert_eq!(SpeedBand::for_speed(f64::NAN), SpeedBand::Standstill);
    }

    #[test]
    fn bands_are_ordered_by_speed() {
        let bands: Vec<SpeedBand> = SpeedBand::iter().collect();
        let mut sorted = bands.clone();
        sorted.sort();
        assert_eq!(bands, sorted);
        assert_eq!(bands.len(), 8);
    }

    #[test]
    fn parses_band_name() {
        assert_eq!(
            "FREE_FLOW".parse::<SpeedBand>().unwrap(),
            SpeedBand::FreeFlow
        );
        assert_eq!(SpeedBand::Crawling.to_string(), "CRAWLING");
    }
}
