use std::{fs::File, io::BufReader, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::{arg_parser::ArgsOptions, errors::ConfigError, fan_curve::Curve};

pub const DEFAULT_SPEEDS: &str = "35:40,40:50,50:60,60:90,80:100";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_POLLING_DURATION: &str = "5s";

// Optional JSON configuration file, every key can be omitted
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub speeds: Option<String>,
    pub device_index: Option<u32>,
    pub dry_run: Option<bool>,
    pub log_level: Option<String>,
    pub polling_duration: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved controller configuration.
///
/// Command line options win over the configuration file,
/// which wins over the built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub curve: Curve,
    pub device_index: u32,
    pub dry_run: bool,
    pub log_level: LevelFilter,
    pub polling_interval: Duration,
}

impl ControllerConfig {
    pub fn load(args: &ArgsOptions) -> Result<Self, ConfigError> {
        let file = match &args.config_file_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        Self::resolve(args, file)
    }

    pub fn resolve(args: &ArgsOptions, file: ConfigFile) -> Result<Self, ConfigError> {
        let speeds = args
            .speeds
            .as_deref()
            .or(file.speeds.as_deref())
            .unwrap_or(DEFAULT_SPEEDS);
        let log_level = args
            .log_level
            .as_deref()
            .or(file.log_level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL);
        let polling_duration = args
            .polling_duration
            .as_deref()
            .or(file.polling_duration.as_deref())
            .unwrap_or(DEFAULT_POLLING_DURATION);

        Ok(Self {
            curve: speeds.parse()?,
            device_index: args.device_index.or(file.device_index).unwrap_or(0),
            dry_run: args.dry_run || file.dry_run.unwrap_or(false),
            log_level: LevelFilter::from_str(log_level.trim())
                .map_err(|_| ConfigError::LogLevel(log_level.to_string()))?,
            polling_interval: parse_duration(polling_duration)?,
        })
    }
}

/// Parse a duration such as "500ms", "5s", "1m30s" or "1.5h".
///
/// Supported units are ns, us (or µs), ms, s, m and h.
/// A zero duration is rejected since it can't be used as a polling interval.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let err = || ConfigError::Duration(s.to_string());

    let mut rest = s.trim();
    if rest.is_empty() {
        return Err(err());
    }

    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let is_number = |c: char| c.is_ascii_digit() || c == '.';

        let value_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        let (value, tail) = rest.split_at(value_len);

        let unit_len = tail.find(is_number).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let unit_nanos: u64 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return Err(err()),
        };

        let nanos = match value.parse::<u64>() {
            Ok(value) => value.checked_mul(unit_nanos).ok_or_else(err)?,
            Err(_) => {
                let value = value.parse::<f64>().map_err(|_| err())?;
                (value * unit_nanos as f64) as u64
            }
        };

        total = total
            .checked_add(Duration::from_nanos(nanos))
            .ok_or_else(err)?;
        rest = tail;
    }

    if total.is_zero() {
        return Err(err());
    }

    Ok(total)
}
