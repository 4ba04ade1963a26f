pub mod config;
pub use config::{AppConfig, Language, LlmBackend};
pub mod db;
