pub mod gpu_info;
pub mod nvidia_device;

use anyhow::Result;

use crate::gpu_device::gpu_info::DeviceInfo;

/// Sensor and fan access used by the control loop.
///
/// Implementations are called from the fan control task and from the
/// shutdown path, never at the same time.
pub trait FanDevice: Send + Sync {
    // Human readable name used in logs and errors
    fn name(&self) -> String;

    // Current GPU temperature in °C
    fn temperature(&self) -> Result<u32>;

    // Number of independently addressable fans
    fn fan_count(&self) -> Result<u32>;

    // Set the speed of a single fan, in percent
    fn set_fan_speed(&self, fan_idx: u32, speed: u8) -> Result<()>;

    // Give the control of a single fan back to the device
    fn set_default_fan_policy(&self, fan_idx: u32) -> Result<()>;

    // Static and live information about the device, for reporting only
    fn info(&self) -> Result<DeviceInfo>;
}
