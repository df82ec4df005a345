use std::{future::Future, sync::Arc, time::Duration};

use tokio::select;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use crate::{
    errors::FanControlError,
    fan_control::FanController,
    fan_curve::{Curve, speed_table::SpeedTable},
    gpu_device::FanDevice,
    logger,
};

// Everything a control session needs besides the device
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub curve: Curve,
    pub polling_interval: Duration,
    pub dry_run: bool,
}

/// Give every fan of a device back to its default policy exactly once.
///
/// The restoration happens either through [`RestoreGuard::restore`] or,
/// if that was never reached, when the guard is dropped.
pub struct RestoreGuard<D: FanDevice> {
    device: Arc<D>,
    dry_run: bool,
    restored: bool,
}

impl<D: FanDevice> RestoreGuard<D> {
    pub fn new(device: Arc<D>, dry_run: bool) -> Self {
        Self {
            device,
            dry_run,
            restored: false,
        }
    }

    pub fn restore(mut self) -> Result<(), FanControlError> {
        self.restored = true;

        restore_default_policy(self.device.as_ref(), self.dry_run)
    }
}

impl<D: FanDevice> Drop for RestoreGuard<D> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        if let Err(err) = restore_default_policy(self.device.as_ref(), self.dry_run) {
            logger::log_error_chain(&anyhow::Error::from(err));
        }
    }
}

// Every fan is attempted even if some of them fail
fn restore_default_policy<D: FanDevice + ?Sized>(
    device: &D,
    dry_run: bool,
) -> Result<(), FanControlError> {
    let name = device.name();

    if dry_run {
        info!("(Dry run) Set fan control policy to default on \"{name}\"");
        return Ok(());
    }

    let fan_count = device
        .fan_count()
        .map_err(|source| FanControlError::FanCount {
            device: name.clone(),
            source,
        })?;

    info!("Setting fan control policy to default on \"{name}\"");

    let mut failed = 0;
    for fan in 0..fan_count {
        if let Err(err) = device.set_default_fan_policy(fan) {
            error!("Unable to restore default fan policy for fan {fan}: {err:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(FanControlError::Restoration {
            device: name,
            failed,
        });
    }

    Ok(())
}

/// Run one control session on `device` until `shutdown` completes
/// or the control loop fails, then restore the default fan policy.
///
/// A loop error takes precedence over a restoration error in the
/// returned result, the restoration error is then only logged.
pub async fn run_session<D, S>(
    device: Arc<D>,
    options: SessionOptions,
    shutdown: S,
) -> Result<(), FanControlError>
where
    D: FanDevice + 'static,
    S: Future<Output = ()>,
{
    // Register the restoration before doing anything else with the device
    let guard = RestoreGuard::new(device.clone(), options.dry_run);

    match device.info() {
        Ok(info) => info.log(),
        Err(err) => warn!("Unable to query device information: {err:#}"),
    }

    if options.curve.is_empty() {
        warn!("Empty fan curve, fan speed will not be changed");
    }

    let table = SpeedTable::compile(&options.curve);
    debug!("Fan speed at different temperatures: {table}");

    // This token and tracker are used to stop and join the loop
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    let mut handle = {
        let token = token.clone();
        let device = device.clone();

        tracker.spawn(async move {
            let controller = FanController::new(
                device,
                table,
                options.polling_interval,
                options.dry_run,
            )?;

            controller.run(token).await
        })
    };
    tracker.close();

    let joined = select! {
        _ = shutdown => {
            info!("Shutdown requested");

            // Cancel the token to stop the loop and wait for it
            token.cancel();
            tracker.wait().await;

            (&mut handle).await
        },
        res = &mut handle => {
            token.cancel();
            tracker.wait().await;

            res
        }
    };

    // The loop only returns Ok(()) once cancelled
    let outcome = joined.map_err(FanControlError::from).and_then(|res| res);

    let restored = guard.restore();

    match (outcome, restored) {
        (Err(err), Err(restore_err)) => {
            logger::log_error_chain(&anyhow::Error::from(restore_err));
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), restored) => restored,
    }
}
