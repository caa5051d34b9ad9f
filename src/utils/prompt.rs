//! User prompt utilities for interactive confirmation

use anyhow::Result;
use dialoguer::Confirm;
use std::io::IsTerminal;

/// Whether a human can answer prompts on this terminal
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Ask user for yes/no confirmation
pub fn confirm(prompt: &str) -> Result<bool> {
    confirm_with_default(prompt, false)
}

/// Ask for confirmation; without a terminal the default answer is returned
/// and nothing is printed.
pub fn confirm_with_default(prompt: &str, default: bool) -> Result<bool> {
    if !is_interactive() {
        crate::log_debug!("No terminal attached, answering '{}' with {}", prompt, default);
        return Ok(default);
    }

    let result = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;

    Ok(result)
}
