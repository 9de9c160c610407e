pub mod logger_config;
pub mod shim_config;

pub use logger_config::LoggerConfig;
pub use shim_config::{ResolveMode, ShimConfig, ShimConfigBuilder, ShimConfigReader};
