mod core;
pub use self::core::{Message, Role, SamplingOptions, completion, completion_content};
