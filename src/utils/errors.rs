//! Enhanced error types with actionable suggestions

use crate::utils::prereqs::PrereqError;
use colored::Colorize;
use thiserror::Error;

/// Enhanced error with suggestions and documentation links
#[derive(Error, Debug)]
#[error("{message}")]
pub struct InstallerError {
    pub message: String,
    pub suggestions: Vec<String>,
    pub docs_link: Option<String>,
}

impl InstallerError {
    /// Create a new error with suggestions
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            docs_link: None,
        }
    }

    /// Add a suggestion to the error
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a documentation link
    pub fn with_docs(mut self, link: impl Into<String>) -> Self {
        self.docs_link = Some(link.into());
        self
    }

    /// Display the error with suggestions
    pub fn display(&self) {
        crate::log_error!("{}", self.message);

        if !self.suggestions.is_empty() {
            eprintln!();
            eprintln!("{}", "Suggestions:".yellow().bold());
            for suggestion in &self.suggestions {
                eprintln!("  {} {}", "→".blue(), suggestion);
            }
        }

        if let Some(docs) = &self.docs_link {
            eprintln!();
            eprintln!("{} {}", "Documentation:".cyan(), docs);
        }
    }

    // Common error patterns

    /// One or more required tools are not on PATH
    pub fn missing_prerequisites(missing: &[(String, String)]) -> Self {
        let names: Vec<&str> = missing.iter().map(|(name, _)| name.as_str()).collect();
        let mut err = Self::new(format!("Missing required tools: {}", names.join(", ")));
        for (name, hint) in missing {
            err = err.suggest(format!("{}: {}", name, hint));
        }
        err.suggest("Run 'harbor-installer check' after installing to verify")
    }

    /// Cluster API not reachable
    pub fn cluster_unreachable() -> Self {
        Self::new("Cannot connect to the Kubernetes cluster")
            .suggest("Check the current context: kubectl config current-context")
            .suggest("Use --kubeconfig (or KUBECONFIG) to point at the right cluster")
            .suggest("Verify network connectivity to the API server")
    }

    /// Pods did not become ready in time
    pub fn pods_not_ready(namespace: &str) -> Self {
        Self::new(format!(
            "Harbor pods in namespace '{}' did not become ready in time",
            namespace
        ))
        .suggest(format!("Check pod status: kubectl get pods -n {}", namespace))
        .suggest(format!(
            "Inspect events: kubectl get events -n {} --sort-by=.lastTimestamp",
            namespace
        ))
        .suggest("Increase behavior.wait_timeout in the config file")
    }

    /// Helm invocation failed
    pub fn helm_failed(reason: &str) -> Self {
        Self::new(format!("Helm failed: {}", reason))
            .suggest("Check that the chart repository is reachable: helm repo update")
            .suggest("Run with -v to see the exact helm command")
            .with_docs("https://goharbor.io/docs/latest/install-config/harbor-ha-helm/")
    }

    /// Certificate generation failed
    pub fn certificate_failed(reason: &str) -> Self {
        Self::new(format!("Failed to generate TLS certificate: {}", reason))
            .suggest("Verify openssl supports -addext (OpenSSL 1.1.1 or newer)")
            .suggest("Check that the working directory is writable")
    }

    /// A setting was rejected before anything ran
    pub fn invalid_setting(reason: &str) -> Self {
        Self::new(format!("Invalid configuration: {}", reason))
            .suggest("Print the effective settings with: harbor-installer config show")
            .suggest("Generate a fresh example with: harbor-installer config init")
    }

    /// Permission denied error
    pub fn permission_denied(operation: &str) -> Self {
        Self::new(format!("Permission denied: {}", operation))
            .suggest("Verify you have sufficient cluster permissions")
            .suggest("Namespace and secret creation need at least namespace-admin rights")
    }

    /// Connection timeout error
    pub fn connection_timeout(resource: &str) -> Self {
        Self::new(format!("Timeout waiting for {}", resource))
            .suggest("Check if the cluster is healthy")
            .suggest("Verify network connectivity")
            .suggest("Check for pending pods: kubectl get pods --all-namespaces")
    }
}

/// Helper to display error and exit
pub fn display_error_and_exit(error: InstallerError) -> ! {
    error.display();
    std::process::exit(1);
}

/// Convert anyhow error to InstallerError when possible
pub fn enhance_error(err: anyhow::Error) -> InstallerError {
    let err = match err.downcast::<InstallerError>() {
        Ok(installer_err) => return installer_err,
        Err(err) => err,
    };

    if let Some(PrereqError::Missing { missing }) = err.downcast_ref::<PrereqError>() {
        return InstallerError::missing_prerequisites(missing);
    }

    // Include the context chain, kubectl/helm put the real cause at the bottom
    let err_str = format!("{:#}", err);

    if err_str.contains("timed out waiting for the condition") {
        if let Some(namespace) = extract_namespace(&err_str) {
            return InstallerError::pods_not_ready(namespace);
        }
        return InstallerError::connection_timeout("Harbor pods");
    }

    if err_str.contains("connection refused") || err_str.contains("Unable to connect to the server")
    {
        return InstallerError::cluster_unreachable();
    }

    if err_str.contains("Unauthorized") || err_str.contains("forbidden") {
        return InstallerError::permission_denied("cluster operation");
    }

    if err_str.contains("helm command failed") {
        return InstallerError::helm_failed(&err_str);
    }

    if err_str.contains("openssl") {
        return InstallerError::certificate_failed(&err_str);
    }

    // Default error with generic suggestion
    InstallerError::new(err_str)
        .suggest("Run with -v for more details")
        .suggest("Re-running is safe: namespace, secret and release are applied idempotently")
}

/// Extract namespace from a kubectl command line in an error message
fn extract_namespace(msg: &str) -> Option<&str> {
    let start = msg.find(" -n ")? + 4;
    let rest = &msg[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let namespace = &rest[..end];
    (!namespace.is_empty()).then_some(namespace)
}
