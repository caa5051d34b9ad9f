//! Self-signed TLS certificate generation via openssl

use crate::config::settings::TlsSettings;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Parameters for one self-signed certificate
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub domain: String,
    pub organization: String,
    pub validity_days: u32,
    pub key_bits: u32,
}

impl CertificateRequest {
    pub fn new(domain: &str, tls: &TlsSettings) -> Self {
        Self {
            domain: domain.to_string(),
            organization: tls.organization.clone(),
            validity_days: tls.validity_days,
            key_bits: tls.key_bits,
        }
    }

    pub fn subject(&self) -> String {
        format!("/CN={}/O={}", self.domain, self.organization)
    }

    /// `openssl req` arguments writing an unencrypted key and a certificate
    /// whose SAN carries the domain
    pub fn openssl_args(&self, key_path: &Path, cert_path: &Path) -> Vec<String> {
        vec![
            "req".to_string(),
            "-x509".to_string(),
            "-nodes".to_string(),
            "-newkey".to_string(),
            format!("rsa:{}", self.key_bits),
            "-days".to_string(),
            self.validity_days.to_string(),
            "-keyout".to_string(),
            key_path.display().to_string(),
            "-out".to_string(),
            cert_path.display().to_string(),
            "-subj".to_string(),
            self.subject(),
            "-addext".to_string(),
            format!("subjectAltName=DNS:{}", self.domain),
        ]
    }
}

/// Key and certificate written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePair {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

impl CertificatePair {
    /// Paths from the TLS settings, relative to `dir`
    pub fn in_dir(dir: &Path, tls: &TlsSettings) -> Self {
        Self {
            key_path: dir.join(&tls.key_file),
            cert_path: dir.join(&tls.cert_file),
        }
    }

    pub fn exists(&self) -> bool {
        self.key_path.exists() && self.cert_path.exists()
    }

    /// PEM bytes as (certificate, key)
    pub fn read(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let cert = fs::read(&self.cert_path)
            .with_context(|| format!("Failed to read {}", self.cert_path.display()))?;
        let key = fs::read(&self.key_path)
            .with_context(|| format!("Failed to read {}", self.key_path.display()))?;
        Ok((cert, key))
    }

    /// Delete both files; missing files are not an error
    pub fn remove(&self) -> Result<()> {
        for path in [&self.key_path, &self.cert_path] {
            match fs::remove_file(path) {
                Ok(()) => crate::log_info!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
                }
            }
        }
        Ok(())
    }
}

/// Generate the pair with openssl, overwriting earlier files
pub fn generate(request: &CertificateRequest, pair: &CertificatePair) -> Result<()> {
    crate::log_info!(
        "Generating self-signed certificate for {} (valid {} days)...",
        request.domain,
        request.validity_days
    );

    let args = request.openssl_args(&pair.key_path, &pair.cert_path);
    crate::log_debug!("Running: {}", crate::utils::dryrun::render_command("openssl", &args));

    let output = Command::new("openssl")
        .args(&args)
        .output()
        .context("Failed to run openssl")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("openssl req failed:\n{}", stderr.trim()));
    }

    if !pair.exists() {
        return Err(anyhow!(
            "openssl reported success but {} or {} is missing",
            pair.key_path.display(),
            pair.cert_path.display()
        ));
    }

    crate::log_info!(
        "Wrote {} and {}",
        pair.key_path.display(),
        pair.cert_path.display()
    );
    Ok(())
}
