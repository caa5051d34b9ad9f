//! Helm values for the Harbor chart
//!
//! Only the keys the installer sets are modelled; everything else keeps the
//! chart default.

use crate::config::settings::Settings;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarborValues {
    pub expose: Expose,
    #[serde(rename = "externalURL")]
    pub external_url: String,
    pub harbor_admin_password: String,
    pub persistence: Persistence,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Expose {
    #[serde(rename = "type")]
    pub kind: String,
    pub tls: ExposeTls,
    pub ingress: Ingress,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExposeTls {
    pub enabled: bool,
    pub cert_source: String,
    pub secret: TlsSecretRef,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSecretRef {
    pub secret_name: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    pub hosts: IngressHosts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct IngressHosts {
    pub core: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Persistence {
    pub enabled: bool,
    pub resource_policy: String,
    pub persistent_volume_claim: PersistentVolumeClaims,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PersistentVolumeClaims {
    pub registry: VolumeClaim,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    pub size: String,
}

impl HarborValues {
    pub fn from_settings(settings: &Settings) -> Self {
        let domain = &settings.harbor.domain;

        Self {
            expose: Expose {
                kind: "ingress".to_string(),
                tls: ExposeTls {
                    enabled: true,
                    cert_source: "secret".to_string(),
                    secret: TlsSecretRef {
                        secret_name: settings.tls.secret_name.clone(),
                    },
                },
                ingress: Ingress {
                    hosts: IngressHosts {
                        core: domain.clone(),
                    },
                    class_name: settings.harbor.ingress_class.clone(),
                },
            },
            external_url: format!("https://{}", domain),
            harbor_admin_password: settings.harbor.admin_password.clone(),
            persistence: Persistence {
                enabled: settings.persistence.enabled,
                resource_policy: "keep".to_string(),
                persistent_volume_claim: PersistentVolumeClaims {
                    registry: VolumeClaim {
                        storage_class: settings.persistence.storage_class.clone(),
                        size: settings.persistence.registry_size.clone(),
                    },
                },
            },
        }
    }
}

/// Render the values document, headed by a comment naming release, namespace and domain
pub fn render(settings: &Settings) -> Result<String> {
    let values = HarborValues::from_settings(settings);
    let body = serde_yaml::to_string(&values).context("Failed to serialize Harbor values")?;

    Ok(format!(
        "# Harbor values generated by harbor-installer\n\
         # release: {}\n\
         # namespace: {}\n\
         # domain: {}\n\
         {}",
        settings.harbor.release_name, settings.harbor.namespace, settings.harbor.domain, body
    ))
}

/// Render and write the values file
pub fn write(settings: &Settings, path: &Path) -> Result<()> {
    let rendered = render(settings)?;

    fs::write(path, rendered)
        .with_context(|| format!("Failed to write values file: {}", path.display()))?;

    crate::log_info!("Wrote Helm values to {}", path.display());
    Ok(())
}
