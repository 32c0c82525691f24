//! Command parsing for owner-issued channel messages
//!
//! Splits raw message text into shell-like tokens (quoted payloads stay
//! whole) and classifies the leading token against one client's
//! namespaced command set.

use thiserror::Error;

/// Error types for command parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unbalanced quote in command")]
    UnbalancedQuote,
}

/// Split raw text into whitespace-separated tokens, honoring single and
/// double quotes so a payload containing spaces can be passed as one
/// token. A blank message yields an empty token list.
pub fn tokenize(raw: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in raw.chars() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    in_token = true;
                } else if ch.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(ch);
                    in_token = true;
                }
            }
        }
    }

    if quote.is_some() {
        return Err(CommandError::UnbalancedQuote);
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

/// The four commands a client answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Start or replace the repeating macro in the invoking channel
    StartMacro,
    /// Stop the macro in the invoking channel
    Stop,
    /// Stop every macro owned by this client
    StopAll,
    /// Report all active macros via direct message
    Status,
}

/// Fixed command names for one client, namespaced by its index
/// (`!macro1`, `!stop1`, ...). Anything else is not a command for this
/// client and is ignored.
#[derive(Debug, Clone)]
pub struct CommandSet {
    macro_cmd: String,
    stop_cmd: String,
    stop_all_cmd: String,
    status_cmd: String,
}

impl CommandSet {
    /// Build the command set for a client index
    pub fn new(index: usize) -> Self {
        Self {
            macro_cmd: format!("!macro{}", index),
            stop_cmd: format!("!stop{}", index),
            stop_all_cmd: format!("!stopall{}", index),
            status_cmd: format!("!status{}", index),
        }
    }

    /// Match a leading token (case-insensitive) against this set
    pub fn classify(&self, token: &str) -> Option<CommandKind> {
        let token = token.to_lowercase();
        if token == self.macro_cmd {
            Some(CommandKind::StartMacro)
        } else if token == self.stop_cmd {
            Some(CommandKind::Stop)
        } else if token == self.stop_all_cmd {
            Some(CommandKind::StopAll)
        } else if token == self.status_cmd {
            Some(CommandKind::Status)
        } else {
            None
        }
    }

    /// Usage string for the macro command
    pub fn macro_usage(&self) -> String {
        format!(
            "❌ Usage: `{} [item] [interval like 2s, 1.5m, 0.5h]`",
            self.macro_cmd
        )
    }
}
