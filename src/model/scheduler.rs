use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{Result, bail};
use log::{debug, error, info, warn};

use crate::{
    datasource::device::GpuDevice,
    model::{controller_config::ControllerConfig, device_controller::DeviceController},
    utils::shutdown::ShutdownToken,
};

/// Probes every enumerated device and keeps the supported ones.
///
/// `candidates` yields the enumeration index with the result of opening the
/// device handle. Devices that fail to open or probe are skipped.
pub fn probe_devices<D, I>(candidates: I, config: &ControllerConfig) -> Vec<DeviceController<D>>
where
    D: GpuDevice,
    I: IntoIterator<Item = (u32, Result<D>)>,
{
    let mut controllers = Vec::new();
    for (index, candidate) in candidates {
        match candidate.and_then(|device| DeviceController::acquire(device, *config)) {
            Ok(controller) => controllers.push(controller),
            Err(e) => {
                error!("GPU{}: {:#}", index, e);
                warn!("GPU{}: Not supported", index);
            }
        }
    }
    controllers
}

/// Drives every controller at a fixed cadence until the token is cancelled.
pub struct Scheduler<D: GpuDevice> {
    controllers: Vec<DeviceController<D>>,
    interval: Duration,
    shutdown: ShutdownToken,
}

impl<D: GpuDevice> Scheduler<D> {
    pub fn new(
        controllers: Vec<DeviceController<D>>,
        config: &ControllerConfig,
        shutdown: ShutdownToken,
    ) -> Result<Self> {
        if controllers.is_empty() {
            bail!("No supported GPU found");
        }

        let interval = config.poll_interval();
        debug!("Loop interval: {} ms", interval.as_millis());

        Ok(Self {
            controllers,
            interval,
            shutdown,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks every controller once. Failures stay with their device.
    pub fn run_cycle(&mut self) {
        for controller in &mut self.controllers {
            if let Err(e) = controller.tick(Instant::now()) {
                error!("GPU{}: {:#}", controller.index(), e);
            }
        }
    }

    /// Main loop. The token is checked only at the top of each cycle, so a
    /// cancellation lets the running cycle and its sleep finish. Every device
    /// is released before returning.
    pub fn run(mut self) {
        info!(
            "Powermizer started with {} GPU(s), polling every {} ms",
            self.controllers.len(),
            self.interval().as_millis()
        );

        while !self.shutdown.is_cancelled() {
            self.run_cycle();
            thread::sleep(self.interval);
        }

        info!("Exiting");
        self.release_all();
    }

    fn release_all(&mut self) {
        for controller in self.controllers.drain(..) {
            let index = controller.index();
            let (level, clock) = (controller.level(), controller.current_clock());
            match controller.release() {
                Ok(()) => debug!("GPU{}: Released from level {} ({} MHz)", index, level, clock),
                Err(e) => error!("GPU{}: {:#}", index, e),
            }
        }
    }
}
