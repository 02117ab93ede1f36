//! CLI configuration: file discovery and the settings provider

pub mod loader;
pub mod settings;

pub use loader::CliConfigLoader;
pub use settings::Settings;
