//! Typed manifests for the resources the installer owns
//!
//! Both are piped to `kubectl apply`, so creating them a second time updates
//! them in place instead of failing.

use anyhow::{Context, Result};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use std::collections::BTreeMap;

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY: &str = "harbor-installer";

fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string())])
}

/// Namespace manifest
pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(managed_labels()),
            ..ObjectMeta::default()
        },
        ..Namespace::default()
    }
}

/// `kubernetes.io/tls` secret holding a PEM key/certificate pair
pub fn tls_secret(name: &str, namespace: &str, cert_pem: &[u8], key_pem: &[u8]) -> Secret {
    let data = BTreeMap::from([
        ("tls.crt".to_string(), ByteString(cert_pem.to_vec())),
        ("tls.key".to_string(), ByteString(key_pem.to_vec())),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels()),
            ..ObjectMeta::default()
        },
        type_: Some("kubernetes.io/tls".to_string()),
        data: Some(data),
        ..Secret::default()
    }
}

/// Serialize a resource for `kubectl apply -f -`
pub fn to_yaml<T: Serialize>(resource: &T) -> Result<String> {
    serde_yaml::to_string(resource).context("Failed to serialize manifest")
}
