//! Harbor health endpoint probe

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Response of `GET /api/v2.0/health`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub components: Vec<ComponentHealth>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }

    pub fn unhealthy_components(&self) -> impl Iterator<Item = &ComponentHealth> {
        self.components.iter().filter(|c| c.status != "healthy")
    }
}

pub fn health_url(domain: &str) -> String {
    format!("https://{}/api/v2.0/health", domain)
}

/// Query Harbor through its ingress.
///
/// `ca_cert` is the generated certificate when it is still on disk; without
/// it certificate verification is disabled. `address` pins the domain to the
/// ingress address so no DNS or /etc/hosts entry is needed.
pub fn probe(
    domain: &str,
    ca_cert: Option<&Path>,
    address: Option<IpAddr>,
    timeout: Duration,
) -> Result<HealthReport> {
    let mut builder = reqwest::blocking::Client::builder().timeout(timeout);

    match ca_cert {
        Some(path) => {
            let pem = fs::read(path)
                .with_context(|| format!("Failed to read certificate {}", path.display()))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .with_context(|| format!("Invalid PEM certificate {}", path.display()))?;
            builder = builder.add_root_certificate(cert);
        }
        None => {
            crate::log_warn!("No local certificate found, skipping TLS verification for the probe");
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    if let Some(ip) = address {
        builder = builder.resolve(domain, SocketAddr::new(ip, 443));
    }

    let client = builder.build().context("Failed to build HTTP client")?;
    let url = health_url(domain);

    crate::log_debug!("GET {}", url);
    let body = client
        .get(&url)
        .send()
        .with_context(|| format!("Failed to reach {}", url))?
        .error_for_status()
        .with_context(|| format!("Harbor health endpoint returned an error: {}", url))?
        .text()
        .context("Failed to read Harbor health response")?;

    parse_report(&body)
}

/// Parse a health response body; anything that is not the report (a default
/// backend page, say) is quoted back in the error
pub fn parse_report(body: &str) -> Result<HealthReport> {
    serde_json::from_str(body).with_context(|| {
        let snippet: String = body.chars().take(200).collect();
        format!("Unexpected response from Harbor health endpoint: {}", snippet.trim())
    })
}
