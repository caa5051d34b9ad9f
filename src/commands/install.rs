//! Install command implementation

use crate::commands::status;
use crate::config::settings::{CleanupPolicy, Settings};
use crate::install::certificate::CertificatePair;
use crate::install::harbor::{InstallContext, Step};
use crate::utils::prereqs::{CommandPrereq, CommonPrereqs, Prerequisite};
use crate::utils::{dryrun, preflight};
use anyhow::{Context, Result};
use colored::Colorize;
use std::env;
use std::path::PathBuf;

pub struct InstallOptions {
    pub settings: Settings,
    pub kubeconfig: Option<PathBuf>,
    pub skip_preflight: bool,
}

/// Fail with every missing tool and its install link
pub fn ensure_prerequisites(tools: &[CommandPrereq]) -> Result<()> {
    let prereqs: Vec<&dyn Prerequisite> = tools.iter().map(|t| t as &dyn Prerequisite).collect();
    CommonPrereqs::ensure(&prereqs)?;
    Ok(())
}

/// Numbered dry-run plan for the whole workflow
pub fn plan(ctx: &InstallContext<'_>) -> Result<Vec<String>> {
    let mut actions = Step::ALL
        .iter()
        .map(|step| step.describe(ctx))
        .collect::<Result<Vec<_>>>()?;

    actions.push("Print pod and ingress status with post-install instructions".to_string());

    let pair = ctx.certificate_pair();
    let files = format!("{} and {}", pair.key_path.display(), pair.cert_path.display());
    actions.push(match ctx.settings.behavior.cleanup_certificates {
        CleanupPolicy::Ask => format!("Ask whether to delete {}", files),
        CleanupPolicy::Always => format!("Delete {}", files),
        CleanupPolicy::Never => format!("Keep {}", files),
    });

    Ok(actions)
}

/// Run the full install workflow
pub fn install(options: InstallOptions) -> Result<()> {
    let InstallOptions {
        settings,
        kubeconfig,
        skip_preflight,
    } = options;
    let kubeconfig = kubeconfig.as_deref();

    ensure_prerequisites(&CommonPrereqs::install_tools())?;

    let workdir = env::current_dir().context("Failed to determine working directory")?;
    let ctx = InstallContext::new(&settings, kubeconfig, workdir);

    if dryrun::is_dry_run() {
        dryrun::log_actions(&plan(&ctx)?);
        return Ok(());
    }

    if !skip_preflight {
        preflight::run_preflight(&settings, kubeconfig)?;
    }

    crate::log_info!(
        "Installing Harbor for {} into namespace {}",
        settings.harbor.domain,
        settings.harbor.namespace
    );

    let total = Step::ALL.len();
    for (i, step) in Step::ALL.iter().enumerate() {
        println!(
            "{} {}",
            format!("[{}/{}]", i + 1, total).cyan().bold(),
            step.title()
        );
        step.run(&ctx)?;
    }

    let pair = ctx.certificate_pair();
    status::print_summary(&settings, kubeconfig, &pair)?;

    cleanup_certificates(settings.behavior.cleanup_certificates, &pair)
}

/// Delete or keep the local key/certificate pair
pub fn cleanup_certificates(policy: CleanupPolicy, pair: &CertificatePair) -> Result<()> {
    let remove = match policy {
        CleanupPolicy::Always => true,
        CleanupPolicy::Never => false,
        CleanupPolicy::Ask => crate::utils::confirm(&format!(
            "Delete local certificate files ({} and {})?",
            pair.key_path.display(),
            pair.cert_path.display()
        ))?,
    };

    if remove {
        pair.remove()
    } else {
        crate::log_info!(
            "Keeping {} and {}; the private key is unencrypted, store it safely",
            pair.key_path.display(),
            pair.cert_path.display()
        );
        Ok(())
    }
}
