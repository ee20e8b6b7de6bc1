//! Configuration loaded from `keepvault.toml` and the environment.

pub mod settings;

pub use settings::Settings;
