//! Kubectl wrapper utilities

use anyhow::{Context, Result, anyhow};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn kubectl_command(args: &[&str], kubeconfig: Option<&Path>) -> Command {
    let mut cmd = Command::new("kubectl");

    if let Some(kc) = kubeconfig {
        cmd.env("KUBECONFIG", kc);
    }

    crate::log_debug!("Running: {}", crate::utils::dryrun::render_command("kubectl", args));
    cmd.args(args);
    cmd
}

/// Run a kubectl command with optional kubeconfig
pub fn run_kubectl(args: &[&str], kubeconfig: Option<&Path>) -> Result<()> {
    let status = kubectl_command(args, kubeconfig)
        .status()
        .context("Failed to run kubectl command")?;

    if !status.success() {
        return Err(anyhow!("kubectl command failed: {}", args.join(" ")));
    }

    Ok(())
}

/// Run kubectl and capture output
pub fn run_kubectl_output(args: &[&str], kubeconfig: Option<&Path>) -> Result<String> {
    let output = kubectl_command(args, kubeconfig)
        .output()
        .context("Failed to run kubectl command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "kubectl command failed: {}\n{}",
            args.join(" "),
            stderr.trim()
        ));
    }

    Ok(String::from_utf8(output.stdout)?)
}

/// Apply a YAML manifest from string
pub fn apply_yaml(yaml: &str, kubeconfig: Option<&Path>) -> Result<()> {
    let mut child = kubectl_command(&["apply", "-f", "-"], kubeconfig)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .context("Failed to spawn kubectl apply")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(yaml.as_bytes())
            .context("Failed to write YAML to kubectl")?;
    }

    let status = child.wait().context("Failed to wait for kubectl apply")?;

    if !status.success() {
        return Err(anyhow!("kubectl apply failed"));
    }

    Ok(())
}

/// Arguments for `kubectl wait`
pub fn wait_args<'a>(
    resource: &'a str,
    condition: &'a str,
    namespace: Option<&'a str>,
    timeout: &'a str,
) -> Vec<&'a str> {
    let mut args = vec!["wait", "--for", condition, "--timeout", timeout];

    if let Some(ns) = namespace {
        args.push("-n");
        args.push(ns);
    }

    args.push(resource);

    // Bare resource types ("pod") wait on every object; "pod/x" waits on one
    if !resource.contains('/') {
        args.push("--all");
    }

    args
}

/// Wait for a resource to reach a condition, returning kubectl's report
pub fn wait_for_condition(
    resource: &str,
    condition: &str,
    namespace: Option<&str>,
    timeout: &str,
    kubeconfig: Option<&Path>,
) -> Result<String> {
    run_kubectl_output(&wait_args(resource, condition, namespace, timeout), kubeconfig)
}

/// Check whether a namespace exists
pub fn namespace_exists(namespace: &str, kubeconfig: Option<&Path>) -> bool {
    run_kubectl_output(&["get", "namespace", namespace], kubeconfig).is_ok()
}

/// Get resources in a namespace with jsonpath
pub fn get_with_jsonpath(
    resource: &str,
    namespace: &str,
    jsonpath: &str,
    kubeconfig: Option<&Path>,
) -> Result<String> {
    run_kubectl_output(
        &[
            "get",
            resource,
            "-n",
            namespace,
            "-o",
            &format!("jsonpath={}", jsonpath),
        ],
        kubeconfig,
    )
}

/// Print resources of a type in a namespace as a table
pub fn show(resource: &str, namespace: &str, kubeconfig: Option<&Path>) -> Result<()> {
    run_kubectl(&["get", resource, "-n", namespace, "-o", "wide"], kubeconfig)
}

/// Delete a named resource, tolerating its absence
pub fn delete_resource(
    kind: &str,
    name: &str,
    namespace: Option<&str>,
    kubeconfig: Option<&Path>,
) -> Result<()> {
    let mut args = vec!["delete", kind, name, "--ignore-not-found"];
    if let Some(ns) = namespace {
        args.push("-n");
        args.push(ns);
    }

    run_kubectl(&args, kubeconfig)
}

/// First published address of the ingresses in a namespace
pub fn ingress_address(namespace: &str, kubeconfig: Option<&Path>) -> Option<String> {
    let output = get_with_jsonpath(
        "ingress",
        namespace,
        "{.items[0].status.loadBalancer.ingress[0]['ip','hostname']}",
        kubeconfig,
    )
    .ok()?;

    output
        .split_whitespace()
        .next()
        .map(|address| address.to_string())
}
