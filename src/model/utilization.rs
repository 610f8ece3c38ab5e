use anyhow::Result;
use log::error;

use crate::datasource::device::GpuDevice;

/// Utilization read for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtilizationSample {
    pub gpu: u32,
    pub encoder: u32,
    pub decoder: u32,
}

impl UtilizationSample {
    /// Highest utilization of all engines, the value the controller acts on.
    pub fn max(&self) -> u32 {
        self.gpu.max(self.encoder).max(self.decoder)
    }
}

/// Reads one sample from the device.
///
/// A failed core query fails the sample. With `track_codec`, encoder and
/// decoder are read too; a failure there is logged and counts as 0.
pub fn sample_utilization<D: GpuDevice>(device: &D, track_codec: bool) -> Result<UtilizationSample> {
    let gpu = device.gpu_utilization()?;

    if !track_codec {
        return Ok(UtilizationSample {
            gpu,
            encoder: 0,
            decoder: 0,
        });
    }

    let encoder = device.encoder_utilization().unwrap_or_else(|e| {
        error!("GPU{}: {:#}", device.index(), e);
        0
    });
    let decoder = device.decoder_utilization().unwrap_or_else(|e| {
        error!("GPU{}: {:#}", device.index(), e);
        0
    });

    Ok(UtilizationSample {
        gpu,
        encoder,
        decoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::device::mock::MockGpu;

    #[test]
    fn codec_ignored_unless_tracked() {
        let gpu = MockGpu::new(0, &[5001, 405]);
        gpu.push_utilization(&[Some(20)]);
        gpu.state.borrow_mut().encoder = Some(90);

        let sample = sample_utilization(&gpu, false).unwrap();
        assert_eq!(sample.max(), 20);
    }

    #[test]
    fn codec_raises_sample_when_tracked() {
        let gpu = MockGpu::new(0, &[5001, 405]);
        gpu.push_utilization(&[Some(20), Some(20)]);
        gpu.state.borrow_mut().encoder = Some(55);
        gpu.state.borrow_mut().decoder = Some(80);

        let sample = sample_utilization(&gpu, true).unwrap();
        assert_eq!(
            sample,
            UtilizationSample {
                gpu: 20,
                encoder: 55,
                decoder: 80
            }
        );
        assert_eq!(sample.max(), 80);
    }

    #[test]
    fn failed_codec_query_degrades_to_zero() {
        let gpu = MockGpu::new(0, &[5001, 405]);
        gpu.push_utilization(&[Some(35)]);
        gpu.state.borrow_mut().encoder = None;
        gpu.state.borrow_mut().decoder = Some(10);

        let sample = sample_utilization(&gpu, true).unwrap();
        assert_eq!(sample.encoder, 0);
        assert_eq!(sample.max(), 35);
    }

    #[test]
    fn failed_core_query_fails_sample() {
        let gpu = MockGpu::new(0, &[5001, 405]);
        gpu.push_utilization(&[None]);
        assert!(sample_utilization(&gpu, true).is_err());
    }
}
