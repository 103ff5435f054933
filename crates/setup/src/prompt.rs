use anyhow::{Context, Result};
use dialoguer::Confirm;

/// Yes/no questions asked during installation
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Asks on the terminal; anything but an explicit yes is a no
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .context("Failed to read answer from terminal")
    }
}
