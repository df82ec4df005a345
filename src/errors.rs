use std::{num::ParseIntError, path::PathBuf};

use thiserror::Error;

// Errors raised while building the controller configuration.
// None of these touch the hardware.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fan speed pair at index {index} is not a pair: \"{pair}\"")]
    NotAPair { index: usize, pair: String },
    #[error("unable to parse temperature at pair {index}")]
    Temperature {
        index: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("unable to parse fan speed at pair {index}")]
    Speed {
        index: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("temperature {temp}°C at pair {index} is above the maximum of {max}°C")]
    TemperatureOutOfRange { index: usize, temp: u8, max: u8 },
    #[error("fan speed {speed}% at pair {index} is above {max}%")]
    SpeedOutOfRange { index: usize, speed: u8, max: u8 },
    #[error(
        "temperatures must be strictly increasing, {prev}°C is followed by {next}°C at pair {index}"
    )]
    NotIncreasing { index: usize, prev: u8, next: u8 },
    #[error("invalid polling duration \"{0}\"")]
    Duration(String),
    #[error("invalid log level \"{0}\"")]
    LogLevel(String),
    #[error("unable to read config file \"{}\"", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config file \"{}\"", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Errors ending a control session
#[derive(Debug, Error)]
pub enum FanControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unable to initialize the GPU device")]
    HardwareInit(#[source] anyhow::Error),
    #[error("unable to get the number of fans of \"{device}\"")]
    FanCount {
        device: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("device \"{device}\" has no fans")]
    NoFans { device: String },
    #[error("unable to get the temperature of \"{device}\"")]
    SensorRead {
        device: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("unable to set fan {fan} of \"{device}\" to {speed}%")]
    ActuatorWrite {
        device: String,
        fan: u32,
        speed: u8,
        #[source]
        source: anyhow::Error,
    },
    #[error("unable to restore the default fan policy on {failed} fan(s) of \"{device}\"")]
    Restoration { device: String, failed: usize },
    #[error("fan control task did not finish")]
    Task(#[from] tokio::task::JoinError),
}
