pub mod arg_parser;
pub mod config;
pub mod errors;
pub mod fan_control;
pub mod fan_curve;
pub mod gpu_device;
pub mod logger;
pub mod session;
