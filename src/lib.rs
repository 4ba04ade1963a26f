pub mod ai;
pub mod api;
pub mod assistant;
pub mod cli;
pub mod core;
pub mod gemini;
pub mod google;
pub mod openai;
