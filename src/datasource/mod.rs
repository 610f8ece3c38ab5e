pub mod config_parser;
pub mod device;
pub mod nvml;
