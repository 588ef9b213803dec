pub mod batch;
pub mod config;
pub mod constants;
pub mod process;

pub use batch::{ChangeBatch, ChangeRecord, Classification, LineDelta};
pub use config::{Config, ConfigError};
