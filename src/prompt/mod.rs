mod engine;
mod library;

pub use engine::PromptEngine;
pub use library::{streaming_system_prompt, PromptLibrary};
