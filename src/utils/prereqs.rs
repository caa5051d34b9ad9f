//! Prerequisite checking system for required tools

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrereqError {
    #[error("Tool '{name}' not found. {hint}")]
    NotFound { name: String, hint: String },

    #[error("Missing required tools: {}", tool_names(.missing))]
    Missing { missing: Vec<(String, String)> },
}

fn tool_names(missing: &[(String, String)]) -> String {
    missing
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trait for checking prerequisites
pub trait Prerequisite {
    /// Name of the prerequisite tool
    fn name(&self) -> &str;

    /// Check if the tool is available
    fn check(&self) -> Result<(), PrereqError>;

    /// Installation hint for the user
    fn install_hint(&self) -> &str;
}

/// Basic prerequisite that checks if a command exists on PATH
pub struct CommandPrereq {
    pub name: String,
    pub hint: String,
}

impl CommandPrereq {
    pub fn new(name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: hint.into(),
        }
    }
}

impl Prerequisite for CommandPrereq {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<(), PrereqError> {
        which::which(&self.name).map_err(|_| PrereqError::NotFound {
            name: self.name.clone(),
            hint: self.hint.clone(),
        })?;
        Ok(())
    }

    fn install_hint(&self) -> &str {
        &self.hint
    }
}

/// Common prerequisites for harbor-installer
pub struct CommonPrereqs;

impl CommonPrereqs {
    /// Get kubectl prerequisite
    pub fn kubectl() -> CommandPrereq {
        CommandPrereq::new(
            "kubectl",
            "Install from: https://kubernetes.io/docs/tasks/tools/",
        )
    }

    /// Get helm prerequisite
    pub fn helm() -> CommandPrereq {
        CommandPrereq::new("helm", "Install from: https://helm.sh/docs/intro/install/")
    }

    /// Get openssl prerequisite
    pub fn openssl() -> CommandPrereq {
        CommandPrereq::new(
            "openssl",
            "Install from: https://www.openssl.org/source/ (or your OS package manager)",
        )
    }

    /// Everything the install workflow shells out to
    pub fn install_tools() -> Vec<CommandPrereq> {
        vec![Self::kubectl(), Self::helm(), Self::openssl()]
    }

    /// Check all prerequisites and return detailed results
    /// Returns (found_tools, missing_tools)
    pub fn check_all(prereqs: &[&dyn Prerequisite]) -> (Vec<String>, Vec<(String, String)>) {
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for prereq in prereqs {
            match prereq.check() {
                Ok(_) => {
                    crate::log_debug!("Found {}", prereq.name());
                    found.push(prereq.name().to_string());
                }
                Err(PrereqError::NotFound { name, .. }) => {
                    missing.push((name, prereq.install_hint().to_string()));
                }
                Err(e) => {
                    crate::log_warn!("Failed to check {}: {}", prereq.name(), e);
                }
            }
        }

        (found, missing)
    }

    /// Fail when any prerequisite is missing
    pub fn ensure(prereqs: &[&dyn Prerequisite]) -> Result<(), PrereqError> {
        let (_, missing) = Self::check_all(prereqs);

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PrereqError::Missing { missing })
        }
    }
}
