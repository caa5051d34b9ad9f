//! Harbor installation steps
//!
//! Each step is one external invocation. Steps run strictly in
//! [`Step::ALL`] order and the first failure stops the install.

use crate::config::settings::Settings;
use crate::config::values;
use crate::install::certificate::{self, CertificatePair, CertificateRequest};
use crate::k8s::helm::{self, ChartRelease};
use crate::k8s::{kubectl, resources};
use crate::utils::dryrun::render_command;
use crate::utils::progress::WaitProgress;
use anyhow::{Context, Result, anyhow};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Everything a step needs to run
#[derive(Debug, Clone)]
pub struct InstallContext<'a> {
    pub settings: &'a Settings,
    pub kubeconfig: Option<&'a Path>,
    /// Where tls.key, tls.crt and the values file are written
    pub workdir: PathBuf,
}

impl<'a> InstallContext<'a> {
    pub fn new(settings: &'a Settings, kubeconfig: Option<&'a Path>, workdir: PathBuf) -> Self {
        Self {
            settings,
            kubeconfig,
            workdir,
        }
    }

    pub fn certificate_pair(&self) -> CertificatePair {
        CertificatePair::in_dir(&self.workdir, &self.settings.tls)
    }

    pub fn values_path(&self) -> PathBuf {
        self.workdir.join(&self.settings.behavior.values_file)
    }

    fn namespace(&self) -> &str {
        &self.settings.harbor.namespace
    }

    /// Build the chart release for these settings and hand it to `f`
    fn with_chart_release<T>(&self, f: impl FnOnce(&ChartRelease<'_>) -> T) -> Result<T> {
        let extra_args = self.settings.chart.extra_args()?;
        let chart = self.settings.chart.reference();
        let values_file = self.values_path();

        Ok(f(&ChartRelease {
            release: &self.settings.harbor.release_name,
            chart: &chart,
            namespace: self.namespace(),
            values_file: &values_file,
            version: self.settings.chart.version.as_deref(),
            extra_args: &extra_args,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Namespace,
    Certificate,
    Secret,
    Repository,
    Values,
    Chart,
    Wait,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Namespace,
        Step::Certificate,
        Step::Secret,
        Step::Repository,
        Step::Values,
        Step::Chart,
        Step::Wait,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Step::Namespace => "Create namespace",
            Step::Certificate => "Generate self-signed certificate",
            Step::Secret => "Create TLS secret",
            Step::Repository => "Add Helm repository",
            Step::Values => "Render values file",
            Step::Chart => "Install Harbor chart",
            Step::Wait => "Wait for Harbor to become ready",
        }
    }

    /// One-line description for the dry-run plan, with the exact command line
    pub fn describe(&self, ctx: &InstallContext<'_>) -> Result<String> {
        let settings = ctx.settings;
        let pair = ctx.certificate_pair();

        let detail = match self {
            Step::Namespace => format!(
                "kubectl apply -f - (Namespace {})",
                settings.harbor.namespace
            ),
            Step::Certificate => render_command(
                "openssl",
                &CertificateRequest::new(&settings.harbor.domain, &settings.tls)
                    .openssl_args(&pair.key_path, &pair.cert_path),
            ),
            Step::Secret => format!(
                "kubectl apply -f - (Secret {}/{} of type kubernetes.io/tls)",
                settings.harbor.namespace, settings.tls.secret_name
            ),
            Step::Repository => format!(
                "{} && {}",
                render_command(
                    "helm",
                    &helm::repo_add_args(&settings.chart.repo_name, &settings.chart.repo_url)
                ),
                render_command("helm", &["repo", "update", settings.chart.repo_name.as_str()])
            ),
            Step::Values => format!("write {}", ctx.values_path().display()),
            Step::Chart => {
                ctx.with_chart_release(|release| render_command("helm", &release.install_args()))?
            }
            Step::Wait => format!(
                "{} && {} (one {} bound shared by both waits)",
                render_command(
                    "kubectl",
                    &kubectl::wait_args(
                        "deployment",
                        "condition=Available",
                        Some(ctx.namespace()),
                        &settings.behavior.wait_timeout,
                    )
                ),
                render_command(
                    "kubectl",
                    &kubectl::wait_args(
                        "pod",
                        "condition=Ready",
                        Some(ctx.namespace()),
                        "<remaining>",
                    )
                ),
                settings.behavior.wait_timeout
            ),
        };

        Ok(format!("{}: {}", self.title(), detail))
    }

    pub fn run(&self, ctx: &InstallContext<'_>) -> Result<()> {
        let settings = ctx.settings;

        match self {
            Step::Namespace => {
                crate::log_info!("Ensuring namespace {} exists...", ctx.namespace());
                let manifest = resources::to_yaml(&resources::namespace(ctx.namespace()))?;
                kubectl::apply_yaml(&manifest, ctx.kubeconfig)
                    .with_context(|| format!("Failed to create namespace {}", ctx.namespace()))
            }
            Step::Certificate => {
                let request = CertificateRequest::new(&settings.harbor.domain, &settings.tls);
                certificate::generate(&request, &ctx.certificate_pair())
            }
            Step::Secret => {
                crate::log_info!(
                    "Creating TLS secret {} in {}...",
                    settings.tls.secret_name,
                    ctx.namespace()
                );
                let (cert, key) = ctx.certificate_pair().read()?;
                let secret =
                    resources::tls_secret(&settings.tls.secret_name, ctx.namespace(), &cert, &key);
                kubectl::apply_yaml(&resources::to_yaml(&secret)?, ctx.kubeconfig)
                    .with_context(|| format!("Failed to create secret {}", settings.tls.secret_name))
            }
            Step::Repository => {
                crate::log_info!(
                    "Adding Helm repository {} ({})...",
                    settings.chart.repo_name,
                    settings.chart.repo_url
                );
                helm::repo_add(&settings.chart.repo_name, &settings.chart.repo_url, ctx.kubeconfig)?;
                helm::repo_update(&settings.chart.repo_name, ctx.kubeconfig)
            }
            Step::Values => values::write(settings, &ctx.values_path()),
            Step::Chart => {
                crate::log_info!(
                    "Installing {} as release {} in {}...",
                    settings.chart.reference(),
                    settings.harbor.release_name,
                    ctx.namespace()
                );
                ctx.with_chart_release(|release| helm::upgrade_install(release, ctx.kubeconfig))?
            }
            Step::Wait => wait_for_ready(ctx),
        }
    }
}

/// Deployments first (they exist as soon as helm returns), then every pod.
/// Both waits share one `wait_timeout` deadline.
fn wait_for_ready(ctx: &InstallContext<'_>) -> Result<()> {
    let namespace = ctx.namespace();
    let timeout = &ctx.settings.behavior.wait_timeout;
    let total = ctx
        .settings
        .behavior
        .wait_timeout_duration()
        .ok_or_else(|| anyhow!("Invalid behavior.wait_timeout: {}", timeout))?;
    let label = format!("Harbor pods in {}", namespace);

    crate::log_info!("Waiting up to {} for Harbor to become ready...", timeout);

    let progress = if ctx.settings.behavior.show_progress && std::io::stderr().is_terminal() {
        WaitProgress::new(&label, "Ready")
    } else {
        WaitProgress::hidden(&label)
    };

    let started = Instant::now();
    let result = kubectl::wait_for_condition(
        "deployment",
        "condition=Available",
        Some(namespace),
        timeout,
        ctx.kubeconfig,
    )
    .and_then(|_| {
        let remaining = remaining_timeout(total, started.elapsed());
        kubectl::wait_for_condition(
            "pod",
            "condition=Ready",
            Some(namespace),
            &remaining,
            ctx.kubeconfig,
        )
    });

    match result {
        Ok(report) => {
            progress.finish_success();
            crate::log_debug!("{}", report.trim());
            crate::log_info!("Harbor is ready");
            Ok(())
        }
        Err(e) => {
            progress.finish_error("timed out or failed");
            Err(e)
        }
    }
}

/// What is left of `total` as a kubectl duration, rounded up and never below one second
fn remaining_timeout(total: Duration, elapsed: Duration) -> String {
    let left = total.saturating_sub(elapsed);
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    format!("{}s", secs.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(settings: &Settings) -> InstallContext<'_> {
        InstallContext::new(settings, None, PathBuf::from("/work"))
    }

    #[test]
    fn test_steps_in_install_order() {
        let titles: Vec<&str> = Step::ALL.iter().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            [
                "Create namespace",
                "Generate self-signed certificate",
                "Create TLS secret",
                "Add Helm repository",
                "Render values file",
                "Install Harbor chart",
                "Wait for Harbor to become ready"
            ]
        );
    }

    #[test]
    fn test_artifact_paths() {
        let settings = Settings::default();
        let ctx = context(&settings);
        assert_eq!(ctx.values_path(), PathBuf::from("/work/harbor-values.yaml"));
        assert_eq!(
            ctx.certificate_pair().cert_path,
            PathBuf::from("/work/tls.crt")
        );
    }

    #[test]
    fn test_describe_shows_commands() {
        let mut settings = Settings::default();
        settings.harbor.namespace = "registry".to_string();
        let ctx = context(&settings);

        let chart = Step::Chart.describe(&ctx).unwrap();
        assert!(chart.starts_with("Install Harbor chart: helm upgrade --install harbor harbor/harbor"));
        assert!(chart.contains("--namespace registry"));
        assert!(chart.contains("--values /work/harbor-values.yaml"));

        let repo = Step::Repository.describe(&ctx).unwrap();
        assert!(repo.starts_with("Add Helm repository: helm repo add harbor "));
        assert!(repo.contains("--force-update"));
        assert!(repo.contains("helm repo update harbor"));

        let wait = Step::Wait.describe(&ctx).unwrap();
        assert!(wait.contains("--timeout 600s -n registry deployment --all"));
        assert!(wait.contains("-n registry pod --all"));
        assert!(wait.ends_with("(one 600s bound shared by both waits)"));

        let secret = Step::Secret.describe(&ctx).unwrap();
        assert!(secret.contains("registry/harbor-tls"));
    }

    #[test]
    fn test_describe_rejects_unparseable_extra_args() {
        let mut settings = Settings::default();
        settings.chart.extra_args = "--set 'unterminated".to_string();
        assert!(Step::Chart.describe(&context(&settings)).is_err());
    }

    #[test]
    fn test_remaining_timeout() {
        let total = Duration::from_secs(600);
        assert_eq!(remaining_timeout(total, Duration::ZERO), "600s");
        assert_eq!(remaining_timeout(total, Duration::from_secs(200)), "400s");
        assert_eq!(remaining_timeout(total, Duration::from_millis(200_500)), "400s");
        assert_eq!(remaining_timeout(total, Duration::from_secs(600)), "1s");
        assert_eq!(remaining_timeout(total, Duration::from_secs(900)), "1s");
    }
}
