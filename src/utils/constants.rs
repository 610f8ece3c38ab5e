/// Powermizer constants
pub const NOTES: &str = "NVIDIA Powermizer";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Device probing limits
pub mod probe {
    /// Memory clock levels read per device. Levels past this count are dropped.
    pub const MAX_CLOCK_LEVELS: usize = 10;
}
