pub mod broker;
pub mod conversation;
pub mod error;
pub mod executor;
pub mod messages;
pub mod models;
pub mod provider;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use conversation::Assistant;
pub use error::AssistantError;
