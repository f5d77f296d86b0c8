//! Classification of console input.
//!
//! Every line the user types is one of three things: nothing, a request to
//! leave, or a message for the model.

/// A classified line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Whitespace only; re-prompt without contacting the service.
    Blank,

    /// `quit` or `exit`, in any case.
    Exit,

    /// Trimmed text to send as the next turn.
    Message(String),
}

/// Words that end the chat.
const EXIT_WORDS: [&str; 2] = ["quit", "exit"];

/// Classifies a raw input line.
///
/// # Examples
///
/// ```
/// # use personachat::chat::{UserInput, parse_input};
/// assert_eq!(parse_input("  EXIT "), UserInput::Exit);
/// assert_eq!(parse_input(""), UserInput::Blank);
/// assert_eq!(
///     parse_input(" Tell me a joke "),
///     UserInput::Message("Tell me a joke".to_string())
/// );
/// ```
pub fn parse_input(line: &str) -> UserInput {
    let line = line.trim();

    if EXIT_WORDS.iter().any(|word| line.eq_ignore_ascii_case(word)) {
        UserInput::Exit
    } else if line.is_empty() {
        UserInput::Blank
    } else {
        UserInput::Message(line.to_string())
    }
}
