use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use gpu_fan_curve::{
    arg_parser::ArgsOptions,
    config::ControllerConfig,
    errors::FanControlError,
    gpu_device::nvidia_device::NvidiaDevice,
    logger,
    session::{SessionOptions, run_session},
};
use nvml_wrapper::Nvml;
use tokio::{
    select,
    signal::{
        ctrl_c,
        unix::{SignalKind, signal},
    },
};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse the command line arguments
    let args_options = ArgsOptions::parse();

    // Nothing touches the GPU before the configuration is valid
    let config = ControllerConfig::load(&args_options)
        .with_context(|| "Failed to load the configuration")?;

    logger::init_logging(config.log_level);
    debug!("Configuration: {:?}", config);

    let device = match open_device(config.device_index) {
        Ok(device) => device,
        Err(err) => {
            logger::log_error_chain(&anyhow::Error::from(err));
            return Ok(ExitCode::FAILURE);
        }
    };

    let options = SessionOptions {
        curve: config.curve,
        polling_interval: config.polling_interval,
        dry_run: config.dry_run,
    };

    if let Err(err) = run_session(device, options, shutdown_signal()).await {
        logger::log_error_chain(&anyhow::Error::from(err));
        return Ok(ExitCode::FAILURE);
    }

    info!("Bye");

    Ok(ExitCode::SUCCESS)
}

// NVML is thread-safe so it is safe to make
// simultaneous NVML calls from multiple threads.
// We can therefore simply wrap it in a Arc with no Mutex.
// NVML is shut down once the last reference is dropped
fn open_device(index: u32) -> Result<Arc<NvidiaDevice>, FanControlError> {
    info!("Initialize NVML");

    let nvml = Nvml::init()
        .with_context(|| "Failed to load NVML library")
        .map_err(FanControlError::HardwareInit)?;
    let nvml = Arc::new(nvml);

    info!("NVML initialized");

    let device = NvidiaDevice::open(&nvml, index).map_err(FanControlError::HardwareInit)?;

    Ok(Arc::new(device))
}

// Complete on SIGINT or SIGTERM
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => Some(sigterm),
        Err(err) => {
            error!("Failed to register SIGTERM handler: {err}");
            None
        }
    };

    let terminate = async {
        match sigterm.as_mut() {
            Some(sigterm) => {
                sigterm.recv().await;
            }
            None => std::future::pending().await,
        }
    };

    select! {
        res = ctrl_c() => {
            if let Err(err) = res {
                error!("Failed to listen for SIGINT: {err}");
            }
        },
        _ = terminate => {},
    }
}
