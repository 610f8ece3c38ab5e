use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};

use crate::{
    datasource::device::GpuDevice,
    model::{
        clock_table::ClockLevelTable,
        controller_config::ControllerConfig,
        hysteresis::{Decision, HysteresisState},
        utilization::sample_utilization,
    },
    utils::constants::probe::MAX_CLOCK_LEVELS,
};

/// Memory clock governor of one device.
///
/// Created by [`DeviceController::acquire`], which pins the device to its
/// highest clock. [`DeviceController::release`] hands the clock back to the
/// driver. A controller dropped without `release` resets the device as well.
pub struct DeviceController<D: GpuDevice> {
    device: D,
    clocks: ClockLevelTable,
    config: ControllerConfig,
    state: HysteresisState,
    locked: bool,
}

impl<D: GpuDevice> DeviceController<D> {
    /// Capability probe: reads the clock table and locks the highest level.
    /// An error means the device is not supported and should be skipped.
    pub fn acquire(mut device: D, config: ControllerConfig) -> Result<Self> {
        let index = device.index();

        let identity = device.identity()?;
        info!("GPU{}: {} ({}) initializing", index, identity.name, identity.bus_id);

        let reported = device.supported_memory_clocks()?;
        debug!("GPU{}: Supported memory clocks: {:?} MHz", index, reported);
        if reported.len() > MAX_CLOCK_LEVELS {
            warn!(
                "GPU{}: {} memory clocks reported, only the first {} are used",
                index,
                reported.len(),
                MAX_CLOCK_LEVELS
            );
        }

        let clocks = ClockLevelTable::from_reported(reported)?;
        debug!(
            "GPU{}: Registered power states: {} {:?}",
            index,
            clocks.len(),
            clocks.levels()
        );

        device
            .lock_memory_clock(clocks.highest())
            .with_context(|| "Failed to manipulate clocks")?;

        debug!("GPU{}: Boost utilization: {}%", index, config.boost_threshold);
        debug!("GPU{}: Low power utilization: {}%", index, config.low_power_threshold);
        debug!("GPU{}: Boost time: {} ms", index, config.boost_dwell.as_millis());
        debug!("GPU{}: Low power time: {} ms", index, config.low_power_dwell.as_millis());
        debug!(
            "GPU{}: Encoder and decoder utilization: {}",
            index,
            if config.track_codec { "enabled" } else { "disabled" }
        );

        info!("GPU{}: {} ({}) initialized", index, identity.name, identity.bus_id);

        let state = HysteresisState::new(clocks.max_index(), Instant::now());
        Ok(Self {
            device,
            clocks,
            config,
            state,
            locked: true,
        })
    }

    /// One evaluation tick.
    ///
    /// On error nothing is committed: level and excursion timer stay as they
    /// were and the next tick retries.
    pub fn tick(&mut self, now: Instant) -> Result<Decision> {
        let index = self.device.index();

        let sample = sample_utilization(&self.device, self.config.track_codec)?;
        let utilization = sample.max();

        let decision = self.state.evaluate(&self.config, utilization, now);
        trace!(
            "GPU{}: util {}% (gpu {}%, enc {}%, dec {}%), level {}/{}, {:?}",
            index,
            utilization,
            sample.gpu,
            sample.encoder,
            sample.decoder,
            self.state.level(),
            self.state.max_level(),
            decision
        );

        if decision.is_transition() {
            let target = self.state.target_level(decision);
            let clock = self
                .clocks
                .clock(target)
                .with_context(|| format!("Level {} out of range", target))?;

            match decision {
                Decision::StepUp => debug!("GPU{}: Boosting clock to {}", index, clock),
                _ => debug!("GPU{}: Lowering clock to {}", index, clock),
            }
            self.device.lock_memory_clock(clock)?;
        }

        self.state.commit(decision, now);
        Ok(decision)
    }

    /// Returns the device to its default clock behaviour.
    pub fn release(mut self) -> Result<()> {
        self.unlock()
    }

    fn unlock(&mut self) -> Result<()> {
        if !self.locked {
            return Ok(());
        }
        self.locked = false;

        debug!("GPU{}: Resetting memory clocks", self.device.index());
        self.device.reset_memory_clock()
    }

    pub fn index(&self) -> u32 {
        self.device.index()
    }

    pub fn level(&self) -> usize {
        self.state.level()
    }

    pub fn current_clock(&self) -> u32 {
        self.clocks.clock(self.state.level()).unwrap_or(self.clocks.highest())
    }
}

impl<D: GpuDevice> Drop for DeviceController<D> {
    fn drop(&mut self) {
        if let Err(e) = self.unlock() {
            error!("GPU{}: {:#}", self.device.index(), e);
        }
    }
}
