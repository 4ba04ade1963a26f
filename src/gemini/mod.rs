mod core;
pub use self::core::{candidate_text, generate_content};
