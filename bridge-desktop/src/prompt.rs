//! Terminal prompt implementation
//!
//! Reads answers from stdin on the blocking thread pool so the async runtime
//! keeps running while the user types. End of input (Ctrl-D) cancels.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    prompt::{InteractivePrompt, PromptChoice},
};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Stdin/stdout backed [`InteractivePrompt`]
#[derive(Debug, Clone, Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }

    async fn read_answer(text: String) -> Result<Option<String>> {
        tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;

            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            Ok((read > 0).then_some(line))
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Prompt task failed: {}", e)))?
        .map_err(BridgeError::Io)
    }
}

fn parse_choice(answer: Option<&str>) -> PromptChoice {
    match answer.map(|a| a.trim().to_lowercase()) {
        Some(a) if a == "y" || a == "yes" => PromptChoice::Confirmed,
        _ => PromptChoice::Cancelled,
    }
}

fn parse_text(answer: Option<String>) -> Option<String> {
    answer.map(|a| a.trim().to_string())
}

#[async_trait]
impl InteractivePrompt for ConsolePrompt {
    async fn prompt_choice(&self, title: &str, message: &str) -> Result<PromptChoice> {
        let answer = Self::read_answer(format!("\n== {} ==\n{}\n[y/N] > ", title, message)).await?;
        let choice = parse_choice(answer.as_deref());
        debug!(title, ?choice, "Prompt answered");
        Ok(choice)
    }

    async fn prompt_text(&self, title: &str, message: &str, hint: &str) -> Result<Option<String>> {
        let answer =
            Self::read_answer(format!("\n== {} ==\n{}\n{} > ", title, message, hint)).await?;
        let text = parse_text(answer);
        debug!(title, cancelled = text.is_none(), "Prompt answered");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice(Some("y\n")), PromptChoice::Confirmed);
        assert_eq!(parse_choice(Some(" YES ")), PromptChoice::Confirmed);
        assert_eq!(parse_choice(Some("n")), PromptChoice::Cancelled);
        assert_eq!(parse_choice(Some("\n")), PromptChoice::Cancelled);
        assert_eq!(parse_choice(None), PromptChoice::Cancelled);
    }

    #[test]
    fn test_parse_text_distinguishes_skip_and_cancel() {
        assert_eq!(parse_text(Some("  abc123 \n".to_string())), Some("abc123".to_string()));
        assert_eq!(parse_text(Some("\n".to_string())), Some(String::new()));
        assert_eq!(parse_text(None), None);
    }
}
