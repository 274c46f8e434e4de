use std::str::FromStr;

use crate::router::ContentType;

/// Slash commands understood by the chat surface.
///
/// Content-type shortcuts (`/blog ...`, `/linkedin ...`) are quick actions:
/// the rest of the line is rewritten with a fixed prompt prefix for that type
/// before entering the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Status,
    New,
    Quit,
    QuickAction {
        content_type: ContentType,
        input: String,
    },
    Unknown(String),
}

impl ChatCommand {
    /// Parse a chat line. Returns `None` for regular messages.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let rest = trimmed.strip_prefix('/')?;

        let (word, tail) = match rest.split_once(char::is_whitespace) {
            Some((word, tail)) => (word, tail.trim()),
            None => (rest, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "help" => Self::Help,
            "status" => Self::Status,
            "new" => Self::New,
            "quit" | "exit" => Self::Quit,
            _ => match ContentType::from_str(word) {
                Ok(content_type) if !tail.is_empty() => Self::QuickAction {
                    content_type,
                    input: tail.to_string(),
                },
                _ => Self::Unknown(word.to_string()),
            },
        };

        Some(command)
    }
}
