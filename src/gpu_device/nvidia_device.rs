use std::sync::Arc;

use anyhow::{Context, Result};
use nvml_wrapper::{
    Device, Nvml,
    enum_wrappers::device::{TemperatureSensor, TemperatureThreshold},
    enums::device::FanControlPolicy,
};
use tracing::{debug, info};

use crate::gpu_device::{
    FanDevice,
    gpu_info::{DeviceInfo, FanInfo, FanPolicy},
};

// Store a NVML GPU device and the original NVML context
#[derive(Debug, Clone)]
pub struct NvidiaDevice {
    // NVML is thread-safe so the context can be shared
    // with the fan control task without a Mutex
    nvml: Arc<Nvml>,

    // Store the GPU unique identifier
    uuid: String,
    name: String,
}

impl NvidiaDevice {
    // Find the GPU at the given index
    pub fn open(nvml: &Arc<Nvml>, index: u32) -> Result<Self> {
        let count = nvml
            .device_count()
            .with_context(|| "Failed to retrieve the number of GPUs")?;

        info!("Found {count} Nvidia device(s), selected device index: {index}");

        let device = nvml
            .device_by_index(index)
            .with_context(|| format!("Failed to retrieve GPU at index {index}"))?;

        let uuid = device
            .uuid()
            .with_context(|| format!("Failed to retrieve UUID of GPU {index}"))?;
        let name = device.name().unwrap_or_else(|_| uuid.clone());

        debug!("Using Nvidia device: \"{}\"", uuid);

        Ok(Self {
            nvml: nvml.clone(),
            uuid,
            name,
        })
    }

    // Return a device handle.
    // This function can fail and return an error
    fn get(&self) -> Result<Device<'_>> {
        let uuid = self.uuid.as_str();

        self.nvml
            .device_by_uuid(uuid)
            .with_context(|| format!("Failed to retrieve GPU device \"{}\"", uuid))
    }
}

impl FanDevice for NvidiaDevice {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn temperature(&self) -> Result<u32> {
        let device = self.get()?;

        device
            .temperature(TemperatureSensor::Gpu)
            .with_context(|| "Failed to retrieve GPU temperature")
    }

    fn fan_count(&self) -> Result<u32> {
        let device = self.get()?;

        device
            .num_fans()
            .with_context(|| "Failed to retrieve the number of fans")
    }

    fn set_fan_speed(&self, fan_idx: u32, speed: u8) -> Result<()> {
        let mut device = self.get()?;

        device
            .set_fan_speed(fan_idx, u32::from(speed))
            .with_context(|| format!("Failed to set fan speed for fan: {fan_idx}"))
    }

    fn set_default_fan_policy(&self, fan_idx: u32) -> Result<()> {
        let mut device = self.get()?;

        device
            .set_fan_control_policy(fan_idx, FanControlPolicy::TemperatureContinousSw)
            .with_context(|| {
                format!("Failed to set fan control policy for fan: {fan_idx}")
            })
    }

    fn info(&self) -> Result<DeviceInfo> {
        let device = self.get()?;

        let fan_count = device.num_fans()?;
        let mut fans = Vec::with_capacity(fan_count as usize);

        for i in 0..fan_count {
            let policy = match device.fan_control_policy(i)? {
                FanControlPolicy::TemperatureContinousSw => FanPolicy::Auto,
                FanControlPolicy::Manual => FanPolicy::Manual,
            };

            fans.push(FanInfo {
                speed: device.fan_speed(i)?,
                policy,
            });
        }

        Ok(DeviceInfo {
            uuid: device.uuid()?,
            name: device.name()?,
            temp: device.temperature(TemperatureSensor::Gpu)?,
            slowdown_temp: device
                .temperature_threshold(TemperatureThreshold::Slowdown)
                .ok(),
            fans,
        })
    }
}
