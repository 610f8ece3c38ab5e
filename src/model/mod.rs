pub mod clock_table;
pub mod controller_config;
pub mod device_controller;
pub mod hysteresis;
pub mod scheduler;
pub mod utilization;
