//! Preflight validation checks before installation

use crate::config::settings::Settings;
use crate::k8s::{helm, kubectl};
use crate::utils::errors::InstallerError;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Result of a preflight check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Pass(String),
    Warn(String),
    Fail(String),
}

impl CheckResult {
    pub fn is_error(&self) -> bool {
        matches!(self, CheckResult::Fail(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, CheckResult::Warn(_))
    }

    pub fn display(&self) {
        match self {
            CheckResult::Pass(msg) => {
                println!("  {} {}", "✓".green(), msg);
            }
            CheckResult::Warn(msg) => {
                println!("  {} {}", "⚠".yellow(), msg);
            }
            CheckResult::Fail(msg) => {
                println!("  {} {}", "✗".red(), msg);
            }
        }
    }
}

/// Preflight checker for Harbor installs
#[derive(Debug, Default)]
pub struct PreflightChecker {
    checks: Vec<CheckResult>,
}

impl PreflightChecker {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Run all preflight checks
    pub fn run_all(&mut self, settings: &Settings, kubeconfig: Option<&Path>) {
        crate::log_info!("Running preflight checks...");

        if !self.check_cluster_connection(kubeconfig) {
            // Everything below needs the API server
            return;
        }

        self.check_ingress_class(settings.harbor.ingress_class.as_deref(), kubeconfig);
        self.check_existing_namespace(&settings.harbor.namespace, kubeconfig);
        self.check_existing_release(
            &settings.harbor.release_name,
            &settings.harbor.namespace,
            kubeconfig,
        );
    }

    /// Print every check and the totals
    pub fn display_results(&self) {
        println!();

        let errors = self.checks.iter().filter(|c| c.is_error()).count();
        let warnings = self.checks.iter().filter(|c| c.is_warning()).count();

        for check in &self.checks {
            check.display();
        }

        println!();

        if errors > 0 {
            println!("{} error(s), {} warning(s)", errors, warnings);
        } else if warnings > 0 {
            println!("{} warning(s), continuing with installation", warnings);
        } else {
            println!("{}", "All checks passed!".green());
        }
    }

    /// Failed checks stop the install; warnings never do
    pub fn verdict(&self) -> Result<()> {
        if self.checks.iter().any(|c| c.is_error()) {
            return Err(InstallerError::cluster_unreachable().into());
        }
        Ok(())
    }

    /// Check if cluster is reachable
    fn check_cluster_connection(&mut self, kubeconfig: Option<&Path>) -> bool {
        match kubectl::run_kubectl_output(&["cluster-info"], kubeconfig) {
            Ok(_) => {
                self.checks
                    .push(CheckResult::Pass("Cluster is reachable".to_string()));
                true
            }
            Err(_) => {
                self.checks
                    .push(CheckResult::Fail("Cannot connect to cluster".to_string()));
                false
            }
        }
    }

    /// Check that an ingress class can serve the Harbor ingress
    fn check_ingress_class(&mut self, wanted: Option<&str>, kubeconfig: Option<&Path>) {
        let output = kubectl::run_kubectl_output(
            &["get", "ingressclass", "-o", "jsonpath={.items[*].metadata.name}"],
            kubeconfig,
        );

        let classes: Vec<String> = match output {
            Ok(names) => names.split_whitespace().map(str::to_string).collect(),
            Err(_) => {
                self.checks.push(CheckResult::Warn(
                    "Could not list ingress classes".to_string(),
                ));
                return;
            }
        };

        self.checks.push(ingress_class_check(wanted, &classes));
    }

    /// Check for an existing namespace
    fn check_existing_namespace(&mut self, namespace: &str, kubeconfig: Option<&Path>) {
        if kubectl::namespace_exists(namespace, kubeconfig) {
            self.checks.push(CheckResult::Pass(format!(
                "Namespace {} exists (will be reused)",
                namespace
            )));
        } else {
            self.checks.push(CheckResult::Pass(format!(
                "Namespace {} will be created",
                namespace
            )));
        }
    }

    /// Check for an existing Harbor release
    fn check_existing_release(&mut self, release: &str, namespace: &str, kubeconfig: Option<&Path>) {
        if helm::release_exists(release, namespace, kubeconfig) {
            self.checks.push(CheckResult::Warn(format!(
                "Release {} already installed in {} (will be upgraded, certificate regenerated)",
                release, namespace
            )));
        } else {
            self.checks.push(CheckResult::Pass(format!(
                "No existing release {} in {}",
                release, namespace
            )));
        }
    }
}

fn ingress_class_check(wanted: Option<&str>, classes: &[String]) -> CheckResult {
    match wanted {
        Some(name) if classes.iter().any(|c| c == name) => {
            CheckResult::Pass(format!("Ingress class {} is available", name))
        }
        Some(name) => CheckResult::Warn(format!(
            "Ingress class {} not found (available: {})",
            name,
            if classes.is_empty() {
                "none".to_string()
            } else {
                classes.join(", ")
            }
        )),
        None if classes.is_empty() => CheckResult::Warn(
            "No ingress class installed; Harbor will not be reachable until an ingress controller runs"
                .to_string(),
        ),
        None => CheckResult::Pass(format!(
            "Ingress classes available: {}",
            classes.join(", ")
        )),
    }
}

/// Run and print all checks. Warnings are reported without asking anything.
pub fn run_preflight(settings: &Settings, kubeconfig: Option<&Path>) -> Result<()> {
    let mut checker = PreflightChecker::new();
    checker.run_all(settings, kubeconfig);
    checker.display_results();
    checker.verdict()
}
