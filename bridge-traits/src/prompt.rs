//! Interactive Prompt Abstraction
//!
//! The transfer engine occasionally needs a human decision: confirming a
//! submission, or typing the ID of an entity that could not be matched
//! automatically. Hosts provide an [`InteractivePrompt`] at construction time;
//! the core never reaches for a global window or terminal handle.
//!
//! Every call is a blocking suspension point from the caller's perspective:
//! the awaiting task does not resume until the user answers or cancels, and no
//! timeout is imposed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptChoice {
    /// The user accepted.
    Confirmed,
    /// The user declined or dismissed the dialog.
    Cancelled,
}

impl PromptChoice {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PromptChoice::Confirmed)
    }
}

/// Interactive collaborator trait
///
/// # Text answers
///
/// [`prompt_text`](InteractivePrompt::prompt_text) distinguishes two outcomes
/// that a plain string cannot:
///
/// - `Ok(None)`: the user cancelled the whole operation
/// - `Ok(Some(String::new()))`: the user left the field empty (skip this item)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::prompt::InteractivePrompt;
///
/// async fn ask_for_id(prompt: &dyn InteractivePrompt) -> Result<Option<String>> {
///     prompt
///         .prompt_text("Track not found", "Provide an id (empty to skip):", "(Paste id here)")
///         .await
/// }
/// ```
#[async_trait]
pub trait InteractivePrompt: Send + Sync {
    /// Ask a yes/no question.
    async fn prompt_choice(&self, title: &str, message: &str) -> Result<PromptChoice>;

    /// Ask for a line of text.
    ///
    /// Returns `None` when the user cancels, `Some` (possibly empty) otherwise.
    async fn prompt_text(&self, title: &str, message: &str, hint: &str) -> Result<Option<String>>;
}
