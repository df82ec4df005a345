#![allow(dead_code)]

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use anyhow::{Result, bail};
use gpu_fan_curve::gpu_device::{
    FanDevice,
    gpu_info::{DeviceInfo, FanInfo, FanPolicy},
};

// Calls changing the state of the fake device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    SetSpeed { fan: u32, speed: u8 },
    SetDefaultPolicy { fan: u32 },
}

// In-memory device recording every fan call
pub struct FakeDevice {
    fans: u32,
    temperature: AtomicU32,
    reads: AtomicU32,

    fail_reads: AtomicBool,
    fail_write_on_fan: Option<u32>,
    fail_restore_on_fan: Option<u32>,

    calls: Mutex<Vec<Call>>,
}

impl FakeDevice {
    pub fn new(fans: u32, temperature: u32) -> Self {
        Self {
            fans,
            temperature: AtomicU32::new(temperature),
            reads: AtomicU32::new(0),
            fail_reads: AtomicBool::new(false),
            fail_write_on_fan: None,
            fail_restore_on_fan: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_write(mut self, fan: u32) -> Self {
        self.fail_write_on_fan = Some(fan);
        self
    }

    pub fn failing_restore(mut self, fan: u32) -> Self {
        self.fail_restore_on_fan = Some(fan);
        self
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn set_temperature(&self, temp: u32) {
        self.temperature.store(temp, Ordering::SeqCst);
    }

    // Number of successful temperature reads
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn speed_writes(&self) -> Vec<(u32, u8)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetSpeed { fan, speed } => Some((fan, speed)),
                _ => None,
            })
            .collect()
    }

    pub fn restores(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetDefaultPolicy { fan } => Some(fan),
                _ => None,
            })
            .collect()
    }
}

impl FanDevice for FakeDevice {
    fn name(&self) -> String {
        "fake GPU".to_string()
    }

    fn temperature(&self) -> Result<u32> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("sensor unavailable");
        }

        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.temperature.load(Ordering::SeqCst))
    }

    fn fan_count(&self) -> Result<u32> {
        Ok(self.fans)
    }

    fn set_fan_speed(&self, fan: u32, speed: u8) -> Result<()> {
        if self.fail_write_on_fan == Some(fan) {
            bail!("fan {fan} is stuck");
        }

        self.calls.lock().unwrap().push(Call::SetSpeed { fan, speed });
        Ok(())
    }

    fn set_default_fan_policy(&self, fan: u32) -> Result<()> {
        // Attempts are recorded even when they fail
        self.calls.lock().unwrap().push(Call::SetDefaultPolicy { fan });

        if self.fail_restore_on_fan == Some(fan) {
            bail!("fan {fan} refused the default policy");
        }

        Ok(())
    }

    fn info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            uuid: "GPU-00000000-0000-0000-0000-000000000000".to_string(),
            name: self.name(),
            temp: self.temperature.load(Ordering::SeqCst),
            slowdown_temp: Some(90),
            fans: (0..self.fans)
                .map(|_| FanInfo {
                    speed: 30,
                    policy: FanPolicy::Auto,
                })
                .collect(),
        })
    }
}
