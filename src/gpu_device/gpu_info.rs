use tracing::{info, warn};

// Control policy of a single fan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanPolicy {
    // Temperature based control done by the driver
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanInfo {
    pub speed: u32,
    pub policy: FanPolicy,
}

// Information about a GPU logged at start-up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub uuid: String,
    pub name: String,

    pub temp: u32,
    // Temperature at which the GPU starts throttling
    pub slowdown_temp: Option<u32>,

    pub fans: Vec<FanInfo>,
}

impl DeviceInfo {
    pub fn log(&self) {
        info!("Device UUID: {}", self.uuid);
        info!("Device name: {}", self.name);
        info!("Number of fans: {}", self.fans.len());
        info!("Current temperature: {}°C", self.temp);

        match self.slowdown_temp {
            Some(temp) => info!("Slowdown temperature: {temp}°C"),
            None => warn!("Slowdown temperature not available"),
        }

        for (i, fan) in self.fans.iter().enumerate() {
            let policy = match fan.policy {
                FanPolicy::Auto => "temperature based automatic",
                FanPolicy::Manual => "manual",
            };

            info!("Fan {i}: speed {}% - policy {policy}", fan.speed);
        }
    }
}
