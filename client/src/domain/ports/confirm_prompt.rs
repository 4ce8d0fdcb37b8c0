//! Port for interactive yes/no confirmation before destructive actions.

/// Yes/no question put to the user.
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmPrompt: Send + Sync {
    /// Ask the user; `true` means proceed.
    fn confirm(&self, question: &str) -> bool;
}

/// Prompt that always agrees. Used when input is non-interactive.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl ConfirmPrompt for AssumeYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}
