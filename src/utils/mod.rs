//! Utility modules for harbor-installer

pub mod dryrun;
pub mod errors;
pub mod logger;
pub mod preflight;
pub mod prereqs;
pub mod progress;
pub mod prompt;

// Re-export commonly used items
pub use logger::{log_error, log_info, log_warn};
pub use prereqs::{CommonPrereqs, Prerequisite};
pub use prompt::confirm;
