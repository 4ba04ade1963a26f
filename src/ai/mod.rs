pub mod completion;
pub mod intent;
pub mod interpreter;
pub mod prompt;

pub use completion::Completion;
pub use intent::{Intent, Interpretation};
pub use interpreter::IntentInterpreter;
