/// Configuration loading

pub mod settings;

pub use settings::*;

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/earnfinity.toml";
