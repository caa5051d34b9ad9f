//! Status command and post-install instructions

use crate::config::settings::Settings;
use crate::install::certificate::CertificatePair;
use crate::install::health;
use crate::k8s::{helm, kubectl};
use crate::utils::errors::InstallerError;
use crate::utils::progress::with_spinner_result;
use anyhow::{Context, Result};
use colored::Colorize;
use std::env;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the ingress controller publishes Harbor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressAddress {
    Ip(IpAddr),
    Hostname(String),
    Unknown,
}

impl IngressAddress {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => IngressAddress::Unknown,
            Some(value) => match value.parse::<IpAddr>() {
                Ok(ip) => IngressAddress::Ip(ip),
                Err(_) => IngressAddress::Hostname(value.to_string()),
            },
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            IngressAddress::Ip(ip) => Some(*ip),
            _ => None,
        }
    }
}

/// Post-install instructions, one line each
pub fn instructions(settings: &Settings, address: &IngressAddress, cert_path: &Path) -> Vec<String> {
    let domain = &settings.harbor.domain;
    let mut lines = vec![
        format!("Harbor UI:      https://{}", domain),
        format!(
            "Login:          admin / {}",
            settings.harbor.admin_password
        ),
    ];

    lines.push(match address {
        IngressAddress::Ip(ip) => format!("Name lookup:    echo '{} {}' | sudo tee -a /etc/hosts", ip, domain),
        IngressAddress::Hostname(host) => {
            format!("Name lookup:    create a DNS record {} CNAME {}", domain, host)
        }
        IngressAddress::Unknown => format!(
            "Name lookup:    point {} at your ingress controller's address (DNS or /etc/hosts)",
            domain
        ),
    });

    lines.push(format!(
        "Trust the CA:   sudo mkdir -p /etc/docker/certs.d/{d} && sudo cp {c} /etc/docker/certs.d/{d}/ca.crt",
        d = domain,
        c = cert_path.display()
    ));
    lines.push(format!("Push images:    docker login {}", domain));
    lines.push(format!(
        "                docker tag <image> {}/library/<image> && docker push {}/library/<image>",
        domain, domain
    ));

    lines
}

fn lookup_address(settings: &Settings, kubeconfig: Option<&Path>) -> IngressAddress {
    IngressAddress::parse(kubectl::ingress_address(&settings.harbor.namespace, kubeconfig).as_deref())
}

fn print_instructions(settings: &Settings, address: &IngressAddress, cert_path: &Path) {
    println!();
    println!("{}", "Next steps".green().bold());
    for line in instructions(settings, address, cert_path) {
        println!("  {}", line);
    }
    println!();
}

/// Pods, ingress and instructions, printed after a successful install
pub fn print_summary(
    settings: &Settings,
    kubeconfig: Option<&Path>,
    pair: &CertificatePair,
) -> Result<()> {
    let namespace = &settings.harbor.namespace;

    println!();
    println!("{}", "==========================================".green());
    println!("{}", "Harbor installed successfully!".green().bold());
    println!("{}", "==========================================".green());
    println!();

    kubectl::show("pods", namespace, kubeconfig)?;
    println!();
    kubectl::show("ingress", namespace, kubeconfig)?;

    print_instructions(settings, &lookup_address(settings, kubeconfig), &pair.cert_path);
    Ok(())
}

/// `status` command: release, pods, ingress, instructions and optionally a health probe
pub fn show(settings: &Settings, kubeconfig: Option<&Path>, probe: bool) -> Result<()> {
    crate::commands::install::ensure_prerequisites(&[
        crate::utils::CommonPrereqs::kubectl(),
        crate::utils::CommonPrereqs::helm(),
    ])?;

    let namespace = &settings.harbor.namespace;
    let release = &settings.harbor.release_name;

    if !helm::release_exists(release, namespace, kubeconfig) {
        return Err(InstallerError::new(format!(
            "Release {} not found in namespace {}",
            release, namespace
        ))
        .suggest("Install Harbor with: harbor-installer install")
        .suggest("Use --namespace if Harbor was installed elsewhere")
        .into());
    }

    helm::status(release, namespace, kubeconfig)?;
    println!();
    kubectl::show("pods", namespace, kubeconfig)?;
    println!();
    kubectl::show("ingress", namespace, kubeconfig)?;

    let workdir = env::current_dir().context("Failed to determine working directory")?;
    let pair = CertificatePair::in_dir(&workdir, &settings.tls);
    let address = lookup_address(settings, kubeconfig);

    print_instructions(settings, &address, &pair.cert_path);

    if probe {
        probe_health(settings, &pair, &address)?;
    }

    Ok(())
}

fn probe_health(settings: &Settings, pair: &CertificatePair, address: &IngressAddress) -> Result<()> {
    let domain = &settings.harbor.domain;
    let ca_cert = pair.cert_path.exists().then_some(pair.cert_path.as_path());

    let report = with_spinner_result(
        &format!("Probing {}", health::health_url(domain)),
        "Health endpoint answered",
        || health::probe(domain, ca_cert, address.ip(), PROBE_TIMEOUT),
    )?;

    for component in &report.components {
        let mark = if component.status == "healthy" {
            "✓".green()
        } else {
            "✗".red()
        };
        match &component.error {
            Some(error) => println!("  {} {} ({})", mark, component.name, error),
            None => println!("  {} {}", mark, component.name),
        }
    }

    if report.is_healthy() {
        crate::log_info!("Harbor reports healthy");
        Ok(())
    } else {
        let broken: Vec<&str> = report
            .unhealthy_components()
            .map(|c| c.name.as_str())
            .collect();
        Err(InstallerError::new(format!(
            "Harbor reports {} (components: {})",
            report.status,
            broken.join(", ")
        ))
        .suggest(format!(
            "Check pod logs: kubectl logs -n {} -l app=harbor --all-containers",
            settings.harbor.namespace
        ))
        .into())
    }
}
