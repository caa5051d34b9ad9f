//! Uninstall command implementation

use crate::commands::install::ensure_prerequisites;
use crate::config::settings::Settings;
use crate::install::certificate::CertificatePair;
use crate::k8s::{helm, kubectl};
use crate::utils::{CommonPrereqs, dryrun};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct UninstallOptions {
    pub settings: Settings,
    pub kubeconfig: Option<PathBuf>,
    pub yes: bool,
    pub delete_namespace: bool,
}

/// What uninstall is about to do, in order
pub fn plan(settings: &Settings, delete_namespace: bool, workdir: &Path) -> Vec<String> {
    let harbor = &settings.harbor;
    let mut actions = vec![
        format!(
            "helm uninstall {} --namespace {}",
            harbor.release_name, harbor.namespace
        ),
        format!(
            "kubectl delete secret {} -n {} --ignore-not-found",
            settings.tls.secret_name, harbor.namespace
        ),
    ];

    if delete_namespace {
        actions.push(format!(
            "kubectl delete namespace {} --ignore-not-found",
            harbor.namespace
        ));
    }

    let pair = CertificatePair::in_dir(workdir, &settings.tls);
    actions.push(format!(
        "Remove local files {}, {} and {}",
        pair.key_path.display(),
        pair.cert_path.display(),
        workdir.join(&settings.behavior.values_file).display()
    ));

    actions
}

pub fn uninstall(options: UninstallOptions) -> Result<()> {
    let UninstallOptions {
        settings,
        kubeconfig,
        yes,
        delete_namespace,
    } = options;
    let kubeconfig = kubeconfig.as_deref();
    let harbor = &settings.harbor;

    ensure_prerequisites(&[CommonPrereqs::kubectl(), CommonPrereqs::helm()])?;

    let workdir = env::current_dir().context("Failed to determine working directory")?;

    if dryrun::is_dry_run() {
        dryrun::log_actions(&plan(&settings, delete_namespace, &workdir));
        return Ok(());
    }

    if !yes {
        let target = if delete_namespace {
            format!("release '{}' and namespace '{}'", harbor.release_name, harbor.namespace)
        } else {
            format!("release '{}' in namespace '{}'", harbor.release_name, harbor.namespace)
        };
        if !crate::utils::confirm(&format!("Are you sure you want to delete Harbor {}?", target))? {
            crate::log_info!("Uninstall cancelled (pass --yes to skip this question)");
            return Ok(());
        }
    }

    if helm::release_exists(&harbor.release_name, &harbor.namespace, kubeconfig) {
        crate::log_info!("Uninstalling release {}...", harbor.release_name);
        helm::uninstall(&harbor.release_name, &harbor.namespace, kubeconfig)?;
    } else {
        crate::log_warn!(
            "Release {} not found in {}, skipping helm uninstall",
            harbor.release_name,
            harbor.namespace
        );
    }

    crate::log_info!("Deleting secret {}...", settings.tls.secret_name);
    kubectl::delete_resource(
        "secret",
        &settings.tls.secret_name,
        Some(harbor.namespace.as_str()),
        kubeconfig,
    )?;

    if delete_namespace {
        crate::log_info!("Deleting namespace {}...", harbor.namespace);
        kubectl::delete_resource("namespace", &harbor.namespace, None, kubeconfig)?;
    } else {
        crate::log_info!(
            "Keeping namespace {} (persistent volume claims survive; pass --delete-namespace to remove them)",
            harbor.namespace
        );
    }

    CertificatePair::in_dir(&workdir, &settings.tls).remove()?;
    remove_if_present(&workdir.join(&settings.behavior.values_file))?;

    crate::log_info!("Harbor uninstalled");
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        crate::log_info!("Removed {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_keeps_namespace_by_default() {
        let settings = Settings::default();
        let actions = plan(&settings, false, Path::new("/work"));

        assert_eq!(actions[0], "helm uninstall harbor --namespace harbor");
        assert_eq!(
            actions[1],
            "kubectl delete secret harbor-tls -n harbor --ignore-not-found"
        );
        assert_eq!(actions.len(), 3);
        assert!(actions[2].contains("/work/harbor-values.yaml"));
    }

    #[test]
    fn test_plan_with_namespace_deletion() {
        let settings = Settings::default();
        let actions = plan(&settings, true, Path::new("/work"));
        assert_eq!(actions.len(), 4);
        assert_eq!(actions[2], "kubectl delete namespace harbor --ignore-not-found");
    }

    #[test]
    fn test_remove_if_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor-values.yaml");

        remove_if_present(&path).unwrap();

        fs::write(&path, "expose: {}\n").unwrap();
        remove_if_present(&path).unwrap();
        assert!(!path.exists());
    }
}
