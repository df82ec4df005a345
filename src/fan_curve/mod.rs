pub mod speed_table;

use std::{fmt, str::FromStr};

use crate::errors::ConfigError;

// Temperature domain covered by a compiled curve, in °C
pub const MIN_TEMP: u8 = 0;
pub const MAX_TEMP: u8 = 150;

pub const MAX_FAN_SPEED: u8 = 100;

// A single control point of the fan curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint {
    pub temp: u8,
    pub speed: u8,
}

/// Fan curve control points, sorted by strictly increasing temperature.
///
/// An empty curve is valid and means the fans are never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Build a curve from `(temperature, speed)` pairs.
    ///
    /// The pairs are checked against the supported temperature domain and
    /// speed range, and must already be sorted. They are never reordered.
    pub fn new(points: &[(u8, u8)]) -> Result<Self, ConfigError> {
        let mut curve = Self {
            points: Vec::with_capacity(points.len()),
        };

        for (index, &(temp, speed)) in points.iter().enumerate() {
            if temp > MAX_TEMP {
                return Err(ConfigError::TemperatureOutOfRange {
                    index,
                    temp,
                    max: MAX_TEMP,
                });
            }

            if speed > MAX_FAN_SPEED {
                return Err(ConfigError::SpeedOutOfRange {
                    index,
                    speed,
                    max: MAX_FAN_SPEED,
                });
            }

            if let Some(prev) = curve.points.last() {
                if prev.temp >= temp {
                    return Err(ConfigError::NotIncreasing {
                        index,
                        prev: prev.temp,
                        next: temp,
                    });
                }
            }

            curve.points.push(CurvePoint { temp, speed });
        }

        Ok(curve)
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// Parse a curve from a list of "temperature:speed" pairs
// separated by commas, e.g. "35:40,40:50,80:100"
impl FromStr for Curve {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Ok(Self::default());
        }

        let mut pairs = Vec::new();

        for (index, pair) in s.split(',').enumerate() {
            let Some((temp, speed)) = pair.split_once(':') else {
                return Err(ConfigError::NotAPair {
                    index,
                    pair: pair.to_string(),
                });
            };

            let temp = temp
                .trim()
                .parse::<u8>()
                .map_err(|source| ConfigError::Temperature { index, source })?;
            let speed = speed
                .trim()
                .parse::<u8>()
                .map_err(|source| ConfigError::Speed { index, source })?;

            pairs.push((temp, speed));
        }

        Self::new(&pairs)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", p.temp, p.speed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_curve() {
        let curve: Curve = "35:40,40:50,50:60,60:90,80:100".parse().unwrap();

        assert_eq!(curve.points().len(), 5);
        assert_eq!(curve.points()[0], CurvePoint { temp: 35, speed: 40 });
        assert_eq!(curve.points()[4], CurvePoint { temp: 80, speed: 100 });
        assert_eq!(curve.to_string(), "35:40,40:50,50:60,60:90,80:100");
    }

    #[test]
    fn parse_empty_string_gives_empty_curve() {
        let curve: Curve = "  ".parse().unwrap();
        assert!(curve.is_empty());
    }

    #[test]
    fn parse_tolerates_spaces_around_values() {
        let curve: Curve = "30 : 20, 60:70".parse().unwrap();
        assert_eq!(curve.points()[1], CurvePoint { temp: 60, speed: 70 });
    }

    #[test]
    fn parse_rejects_missing_colon() {
        let err = "35:40,4050".parse::<Curve>().unwrap_err();
        assert!(matches!(err, ConfigError::NotAPair { index: 1, .. }));
    }

    #[test]
    fn parse_rejects_bad_numbers() {
        let err = "abc:40".parse::<Curve>().unwrap_err();
        assert!(matches!(err, ConfigError::Temperature { index: 0, .. }));

        let err = "35:40,40:-5".parse::<Curve>().unwrap_err();
        assert!(matches!(err, ConfigError::Speed { index: 1, .. }));

        // Does not fit in the controller integer width
        let err = "300:40".parse::<Curve>().unwrap_err();
        assert!(matches!(err, ConfigError::Temperature { index: 0, .. }));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = Curve::new(&[(151, 40)]).unwrap_err();
        assert!(matches!(err, ConfigError::TemperatureOutOfRange { temp: 151, .. }));

        let err = Curve::new(&[(40, 101)]).unwrap_err();
        assert!(matches!(err, ConfigError::SpeedOutOfRange { speed: 101, .. }));
    }

    #[test]
    fn rejects_unsorted_or_duplicate_temperatures() {
        let err = Curve::new(&[(50, 40), (40, 60)]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotIncreasing { index: 1, prev: 50, next: 40 }
        ));

        let err = "40:40,40:60".parse::<Curve>().unwrap_err();
        assert!(matches!(err, ConfigError::NotIncreasing { .. }));
    }
}
