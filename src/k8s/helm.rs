//! Helm wrapper utilities

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Command;

fn helm_command<S: AsRef<str>>(args: &[S], kubeconfig: Option<&Path>) -> Command {
    let mut cmd = Command::new("helm");

    if let Some(kc) = kubeconfig {
        cmd.env("KUBECONFIG", kc);
    }

    crate::log_debug!("Running: {}", crate::utils::dryrun::render_command("helm", args));
    cmd.args(args.iter().map(AsRef::as_ref));
    cmd
}

fn joined<S: AsRef<str>>(args: &[S]) -> String {
    args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
}

/// Run a helm command with optional kubeconfig
pub fn run_helm<S: AsRef<str>>(args: &[S], kubeconfig: Option<&Path>) -> Result<()> {
    let status = helm_command(args, kubeconfig)
        .status()
        .context("Failed to run helm command")?;

    if !status.success() {
        return Err(anyhow!("helm command failed: {}", joined(args)));
    }

    Ok(())
}

/// Run helm and capture output
pub fn run_helm_output<S: AsRef<str>>(args: &[S], kubeconfig: Option<&Path>) -> Result<String> {
    let output = helm_command(args, kubeconfig)
        .output()
        .context("Failed to run helm command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "helm command failed: {}\n{}",
            joined(args),
            stderr.trim()
        ));
    }

    Ok(String::from_utf8(output.stdout)?)
}

/// A chart release to create or upgrade
#[derive(Debug, Clone)]
pub struct ChartRelease<'a> {
    pub release: &'a str,
    pub chart: &'a str,
    pub namespace: &'a str,
    pub values_file: &'a Path,
    pub version: Option<&'a str>,
    pub extra_args: &'a [String],
}

impl ChartRelease<'_> {
    /// `helm upgrade --install` arguments; the release is created on first run
    /// and upgraded in place afterwards
    pub fn install_args(&self) -> Vec<String> {
        let mut args = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            self.release.to_string(),
            self.chart.to_string(),
            "--namespace".to_string(),
            self.namespace.to_string(),
            "--values".to_string(),
            self.values_file.display().to_string(),
        ];

        if let Some(version) = self.version {
            args.push("--version".to_string());
            args.push(version.to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Arguments for `helm repo add`; re-adding an existing name refreshes its URL
pub fn repo_add_args<'a>(name: &'a str, url: &'a str) -> [&'a str; 5] {
    ["repo", "add", name, url, "--force-update"]
}

/// Register the chart repository
pub fn repo_add(name: &str, url: &str, kubeconfig: Option<&Path>) -> Result<()> {
    run_helm(&repo_add_args(name, url), kubeconfig)
        .with_context(|| format!("Failed to add Helm repository {} ({})", name, url))
}

/// Refresh one repository's index
pub fn repo_update(name: &str, kubeconfig: Option<&Path>) -> Result<()> {
    run_helm(&["repo", "update", name], kubeconfig)
        .with_context(|| format!("Failed to update Helm repository {}", name))
}

/// Install or upgrade a release
pub fn upgrade_install(release: &ChartRelease<'_>, kubeconfig: Option<&Path>) -> Result<()> {
    run_helm(&release.install_args(), kubeconfig)
        .with_context(|| format!("Failed to install chart {}", release.chart))
}

/// Whether a release exists in a namespace
pub fn release_exists(release: &str, namespace: &str, kubeconfig: Option<&Path>) -> bool {
    run_helm_output(&["status", release, "--namespace", namespace], kubeconfig).is_ok()
}

/// Print a release's status and notes
pub fn status(release: &str, namespace: &str, kubeconfig: Option<&Path>) -> Result<()> {
    run_helm(&["status", release, "--namespace", namespace], kubeconfig)
}

/// Remove a release
pub fn uninstall(release: &str, namespace: &str, kubeconfig: Option<&Path>) -> Result<()> {
    run_helm(&["uninstall", release, "--namespace", namespace], kubeconfig)
        .with_context(|| format!("Failed to uninstall release {}", release))
}
