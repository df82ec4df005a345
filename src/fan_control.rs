use std::{sync::Arc, time::Duration};

use tokio::{
    select,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace_span, warn};

use crate::{
    errors::FanControlError, fan_curve::speed_table::SpeedTable, gpu_device::FanDevice,
};

// What a single update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    // The speed was written to every fan
    Applied(u8),
    // The speed would have been written to every fan
    DryRun(u8),
    // The temperature has no entry in the speed table, nothing was done
    NoMapping(u32),
}

/// Periodically apply a compiled fan curve to every fan of a device.
pub struct FanController<D: FanDevice> {
    device: Arc<D>,
    device_name: String,
    fan_count: u32,

    table: SpeedTable,

    update_interval: Duration,
    dry_run: bool,
}

impl<D: FanDevice> FanController<D> {
    // Query the device fans, a device without fans can't be controlled
    pub fn new(
        device: Arc<D>,
        table: SpeedTable,
        update_interval: Duration,
        dry_run: bool,
    ) -> Result<Self, FanControlError> {
        let device_name = device.name();

        let fan_count = device
            .fan_count()
            .map_err(|source| FanControlError::FanCount {
                device: device_name.clone(),
                source,
            })?;

        if fan_count == 0 {
            return Err(FanControlError::NoFans {
                device: device_name,
            });
        }

        Ok(Self {
            device,
            device_name,
            fan_count,
            table,
            update_interval,
            dry_run,
        })
    }

    // Run until the token is cancelled or an update fails
    pub async fn run(&self, run_token: CancellationToken) -> Result<(), FanControlError> {
        info!(
            "Fan control: Running on \"{}\" every {:?}",
            self.device_name, self.update_interval
        );

        // The first update happens one interval after start
        let mut ticker = interval_at(
            Instant::now() + self.update_interval,
            self.update_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                biased;

                _ = run_token.cancelled() => {
                    info!("Fan control: Quitting");

                    return Ok(());
                },
                _ = ticker.tick() => {
                    trace_span!("updating").in_scope(|| self.tick())?;
                }
            }
        }
    }

    // Read the temperature once and set the fan speed accordingly
    pub fn tick(&self) -> Result<TickOutcome, FanControlError> {
        let temp = self
            .device
            .temperature()
            .map_err(|source| FanControlError::SensorRead {
                device: self.device_name.clone(),
                source,
            })?;

        debug!("Current temperature: {temp}°C");

        let Some(speed) = self.table.get(temp) else {
            warn!(
                "No fan speed for {temp}°C on \"{}\", skipping this update",
                self.device_name
            );

            return Ok(TickOutcome::NoMapping(temp));
        };

        for fan in 0..self.fan_count {
            if self.dry_run {
                info!(
                    "(Dry run) Set fan speed on \"{}\" - fan: {fan} - speed: {speed}%",
                    self.device_name
                );
                continue;
            }

            debug!(
                "Set fan speed on \"{}\" - fan: {fan} - speed: {speed}%",
                self.device_name
            );

            self.device.set_fan_speed(fan, speed).map_err(|source| {
                FanControlError::ActuatorWrite {
                    device: self.device_name.clone(),
                    fan,
                    speed,
                    source,
                }
            })?;
        }

        if self.dry_run {
            Ok(TickOutcome::DryRun(speed))
        } else {
            Ok(TickOutcome::Applied(speed))
        }
    }

    pub fn fan_count(&self) -> u32 {
        self.fan_count
    }
}
