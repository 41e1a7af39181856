//! The two question-answering chains and everything they share: prompt
//! templates, history handling, question condensing, and the event stream
//! they emit.

pub mod condense;
pub mod events;
pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod prompts;

pub use events::ChatEvent;
pub use history::HistoryManager;
pub use pipeline::{ChatMode, ChatPipeline};
pub use prompt::{PromptLibrary, PromptSet, PromptTemplate};

/// Answer language, selected per request by a numeric flag in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// `0` selects English; any other value selects Chinese.
    pub fn from_flag(flag: i64) -> Self {
        if flag == 0 {
            Language::English
        } else {
            Language::Chinese
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_english_everything_else_chinese() {
        assert_eq!(Language::from_flag(0), Language::English);
        assert_eq!(Language::from_flag(1), Language::Chinese);
        assert_eq!(Language::from_flag(7), Language::Chinese);
        assert_eq!(Language::from_flag(-1), Language::Chinese);
    }
}
