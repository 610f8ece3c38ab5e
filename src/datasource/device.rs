use anyhow::Result;

/// Human-readable identity reported at probe time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: String,
    pub bus_id: String,
}

/// Driver surface of one governed GPU.
///
/// All utilization values are percentages in `0..=100`, all clocks are in MHz.
pub trait GpuDevice {
    /// Enumeration index, used to tag log lines.
    fn index(&self) -> u32;

    fn identity(&self) -> Result<DeviceIdentity>;

    /// Supported memory clocks in the order the driver reports them.
    fn supported_memory_clocks(&self) -> Result<Vec<u32>>;

    fn gpu_utilization(&self) -> Result<u32>;

    fn encoder_utilization(&self) -> Result<u32>;

    fn decoder_utilization(&self) -> Result<u32>;

    /// Pins the memory clock to a single frequency.
    fn lock_memory_clock(&mut self, mhz: u32) -> Result<()>;

    /// Returns the memory clock to driver control.
    fn reset_memory_clock(&mut self) -> Result<()>;
}

#[cfg(test)]
pub mod mock {
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    use anyhow::{Result, anyhow};

    use super::{DeviceIdentity, GpuDevice};
    use crate::utils::shutdown::ShutdownToken;

    pub struct MockState {
        /// `None` makes the clock query fail.
        pub clocks: Option<Vec<u32>>,
        /// Popped once per core sample; `None` entries fail, an empty queue reads 0.
        pub utilization: VecDeque<Option<u32>>,
        pub encoder: Option<u32>,
        pub decoder: Option<u32>,
        pub fail_identity: bool,
        pub fail_lock: bool,
        pub fail_reset: bool,
        pub locks: Vec<u32>,
        pub resets: usize,
        pub samples: usize,
        /// Cancels the token once `samples` reaches the given count.
        pub cancel_after: Option<(usize, ShutdownToken)>,
    }

    #[derive(Clone)]
    pub struct MockGpu {
        pub index: u32,
        pub state: Rc<RefCell<MockState>>,
    }

    impl MockGpu {
        pub fn new(index: u32, clocks: &[u32]) -> Self {
            Self {
                index,
                state: Rc::new(RefCell::new(MockState {
                    clocks: Some(clocks.to_vec()),
                    utilization: VecDeque::new(),
                    encoder: Some(0),
                    decoder: Some(0),
                    fail_identity: false,
                    fail_lock: false,
                    fail_reset: false,
                    locks: Vec::new(),
                    resets: 0,
                    samples: 0,
                    cancel_after: None,
                })),
            }
        }

        pub fn push_utilization(&self, samples: &[Option<u32>]) {
            self.state.borrow_mut().utilization.extend(samples.iter().copied());
        }

        pub fn locks(&self) -> Vec<u32> {
            self.state.borrow().locks.clone()
        }

        pub fn resets(&self) -> usize {
            self.state.borrow().resets
        }

        pub fn samples(&self) -> usize {
            self.state.borrow().samples
        }
    }

    impl GpuDevice for MockGpu {
        fn index(&self) -> u32 {
            self.index
        }

        fn identity(&self) -> Result<DeviceIdentity> {
            if self.state.borrow().fail_identity {
                return Err(anyhow!("Failed to get device name: mock"));
            }
            Ok(DeviceIdentity {
                name: format!("Mock GPU {}", self.index),
                bus_id: format!("00000000:0{}:00.0", self.index),
            })
        }

        fn supported_memory_clocks(&self) -> Result<Vec<u32>> {
            self.state
                .borrow()
                .clocks
                .clone()
                .ok_or_else(|| anyhow!("Failed to get supported memory clocks: mock"))
        }

        fn gpu_utilization(&self) -> Result<u32> {
            let mut state = self.state.borrow_mut();
            state.samples += 1;
            if let Some((after, token)) = &state.cancel_after {
                if state.samples >= *after {
                    token.cancel();
                }
            }
            match state.utilization.pop_front() {
                Some(Some(value)) => Ok(value),
                Some(None) => Err(anyhow!("Failed to get utilization: mock")),
                None => Ok(0),
            }
        }

        fn encoder_utilization(&self) -> Result<u32> {
            self.state
                .borrow()
                .encoder
                .ok_or_else(|| anyhow!("Failed to get encoder utilization: mock"))
        }

        fn decoder_utilization(&self) -> Result<u32> {
            self.state
                .borrow()
                .decoder
                .ok_or_else(|| anyhow!("Failed to get decoder utilization: mock"))
        }

        fn lock_memory_clock(&mut self, mhz: u32) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_lock {
                return Err(anyhow!("Failed to lock memory clocks: mock"));
            }
            state.locks.push(mhz);
            Ok(())
        }

        fn reset_memory_clock(&mut self) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.resets += 1;
            if state.fail_reset {
                return Err(anyhow!("Failed to reset memory clocks: mock"));
            }
            Ok(())
        }
    }
}
