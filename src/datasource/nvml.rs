use anyhow::{Context, Result};
use log::{debug, info};
use nvml_wrapper::{Device, Nvml};

use crate::datasource::device::{DeviceIdentity, GpuDevice};

/// Loads NVML and reports the library and driver versions.
pub fn nvml_init() -> Result<Nvml> {
    debug!("Initializing NVML");
    let nvml = Nvml::init().with_context(|| "Failed to initialize NVML")?;

    let nvml_version = nvml
        .sys_nvml_version()
        .with_context(|| "Failed to get NVML version")?;
    info!("NVML version: {}", nvml_version);

    let driver_version = nvml
        .sys_driver_version()
        .with_context(|| "Failed to get driver version")?;
    info!("Driver version: {}", driver_version);

    Ok(nvml)
}

pub fn device_count(nvml: &Nvml) -> Result<u32> {
    nvml.device_count()
        .with_context(|| "Failed to get device count")
}

pub fn nvml_shutdown(nvml: Nvml) -> Result<()> {
    debug!("Shutting down NVML");
    nvml.shutdown().with_context(|| "Failed to shutdown NVML")
}

/// An NVML device handle tagged with its enumeration index.
pub struct NvmlGpu<'nvml> {
    index: u32,
    device: Device<'nvml>,
}

impl<'nvml> NvmlGpu<'nvml> {
    pub fn open(nvml: &'nvml Nvml, index: u32) -> Result<Self> {
        let device = nvml
            .device_by_index(index)
            .with_context(|| "Failed to get device handle")?;
        Ok(Self { index, device })
    }
}

impl GpuDevice for NvmlGpu<'_> {
    fn index(&self) -> u32 {
        self.index
    }

    fn identity(&self) -> Result<DeviceIdentity> {
        let name = self
            .device
            .name()
            .with_context(|| "Failed to get device name")?;
        let pci_info = self
            .device
            .pci_info()
            .with_context(|| "Failed to get PCI info")?;
        Ok(DeviceIdentity {
            name,
            bus_id: pci_info.bus_id,
        })
    }

    fn supported_memory_clocks(&self) -> Result<Vec<u32>> {
        self.device
            .supported_memory_clocks()
            .with_context(|| "Failed to get supported memory clocks")
    }

    fn gpu_utilization(&self) -> Result<u32> {
        let rates = self
            .device
            .utilization_rates()
            .with_context(|| "Failed to get utilization")?;
        Ok(rates.gpu)
    }

    fn encoder_utilization(&self) -> Result<u32> {
        let info = self
            .device
            .encoder_utilization()
            .with_context(|| "Failed to get encoder utilization")?;
        Ok(info.utilization)
    }

    fn decoder_utilization(&self) -> Result<u32> {
        let info = self
            .device
            .decoder_utilization()
            .with_context(|| "Failed to get decoder utilization")?;
        Ok(info.utilization)
    }

    fn lock_memory_clock(&mut self, mhz: u32) -> Result<()> {
        self.device
            .set_mem_locked_clocks(mhz, mhz)
            .with_context(|| format!("Failed to lock memory clocks to {} MHz", mhz))
    }

    fn reset_memory_clock(&mut self) -> Result<()> {
        self.device
            .reset_mem_locked_clocks()
            .with_context(|| "Failed to reset memory clocks")
    }
}
