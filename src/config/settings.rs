//! Configuration file support for harbor-installer

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Local config file name, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".harbor-installer.toml";

static HOSTNAME_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("valid regex"));

static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*[smh]$").expect("valid regex"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("harbor.domain '{0}' is not a valid DNS hostname")]
    InvalidDomain(String),

    #[error("{field} '{value}' is not a valid DNS-1123 name")]
    InvalidName { field: &'static str, value: String },

    #[error(
        "harbor.admin_password must be 8-128 characters with at least one uppercase letter, one lowercase letter and one digit"
    )]
    WeakPassword,

    #[error("tls.validity_days must be greater than zero")]
    ZeroValidity,

    #[error("tls.key_bits must be at least 2048 (got {0})")]
    WeakKey(u32),

    #[error("behavior.wait_timeout '{0}' must look like 600s, 10m or 1h")]
    InvalidTimeout(String),

    #[error("tls.organization '{0}' must be non-empty and free of '/', '=' and '\\'")]
    InvalidOrganization(String),
}

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub harbor: HarborSettings,

    #[serde(default)]
    pub chart: ChartSettings,

    #[serde(default)]
    pub tls: TlsSettings,

    #[serde(default)]
    pub persistence: PersistenceSettings,

    #[serde(default)]
    pub behavior: Behavior,
}

/// What gets installed and where
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HarborSettings {
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_release_name")]
    pub release_name: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Ingress class for the Harbor ingress. Cluster default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class: Option<String>,
}

/// Helm repository and chart coordinates
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChartSettings {
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    #[serde(default = "default_chart_name")]
    pub name: String,

    /// Chart version; latest when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Extra arguments appended to `helm upgrade --install`, shell-quoted
    #[serde(default)]
    pub extra_args: String,
}

/// Self-signed certificate parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TlsSettings {
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    #[serde(default = "default_validity_days")]
    pub validity_days: u32,

    #[serde(default = "default_key_bits")]
    pub key_bits: u32,

    #[serde(default = "default_organization")]
    pub organization: String,

    #[serde(default = "default_key_file")]
    pub key_file: String,

    #[serde(default = "default_cert_file")]
    pub cert_file: String,
}

/// Storage settings passed through to the chart
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PersistenceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    #[serde(default = "default_registry_size")]
    pub registry_size: String,
}

/// Behavior settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Behavior {
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: String,

    #[serde(default)]
    pub cleanup_certificates: CleanupPolicy,

    #[serde(default = "default_true")]
    pub show_progress: bool,

    #[serde(default = "default_values_file")]
    pub values_file: String,
}

/// What to do with `tls.key`/`tls.crt` once the secret exists
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CleanupPolicy {
    #[default]
    Ask,
    Always,
    Never,
}

impl FromStr for CleanupPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ask" => Ok(CleanupPolicy::Ask),
            "always" | "yes" => Ok(CleanupPolicy::Always),
            "never" | "no" => Ok(CleanupPolicy::Never),
            _ => Err(anyhow::anyhow!(
                "Invalid cleanup policy: {}. Must be 'ask', 'always' or 'never'",
                s
            )),
        }
    }
}

impl fmt::Display for CleanupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupPolicy::Ask => write!(f, "ask"),
            CleanupPolicy::Always => write!(f, "always"),
            CleanupPolicy::Never => write!(f, "never"),
        }
    }
}

/// Values given on the command line, applied over the loaded file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub domain: Option<String>,
    pub namespace: Option<String>,
    pub admin_password: Option<String>,
    pub cleanup_certificates: Option<CleanupPolicy>,
}

// Default value functions
fn default_domain() -> String {
    "harbor.local".to_string()
}

fn default_namespace() -> String {
    "harbor".to_string()
}

fn default_release_name() -> String {
    "harbor".to_string()
}

fn default_admin_password() -> String {
    "Harbor12345".to_string()
}

fn default_repo_name() -> String {
    "harbor".to_string()
}

fn default_repo_url() -> String {
    "https://helm.goharbor.io".to_string()
}

fn default_chart_name() -> String {
    "harbor".to_string()
}

fn default_secret_name() -> String {
    "harbor-tls".to_string()
}

fn default_validity_days() -> u32 {
    365
}

fn default_key_bits() -> u32 {
    2048
}

fn default_organization() -> String {
    "Harbor".to_string()
}

fn default_key_file() -> String {
    "tls.key".to_string()
}

fn default_cert_file() -> String {
    "tls.crt".to_string()
}

fn default_registry_size() -> String {
    "5Gi".to_string()
}

fn default_wait_timeout() -> String {
    "600s".to_string()
}

fn default_values_file() -> String {
    "harbor-values.yaml".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for HarborSettings {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            namespace: default_namespace(),
            release_name: default_release_name(),
            admin_password: default_admin_password(),
            ingress_class: None,
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            repo_name: default_repo_name(),
            repo_url: default_repo_url(),
            name: default_chart_name(),
            version: None,
            extra_args: String::new(),
        }
    }
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            secret_name: default_secret_name(),
            validity_days: default_validity_days(),
            key_bits: default_key_bits(),
            organization: default_organization(),
            key_file: default_key_file(),
            cert_file: default_cert_file(),
        }
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            storage_class: None,
            registry_size: default_registry_size(),
        }
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            wait_timeout: default_wait_timeout(),
            cleanup_certificates: CleanupPolicy::default(),
            show_progress: default_true(),
            values_file: default_values_file(),
        }
    }
}

impl Behavior {
    /// `wait_timeout` as a duration, `None` when it is not `<n>s`, `<n>m` or `<n>h`
    pub fn wait_timeout_duration(&self) -> Option<Duration> {
        parse_duration(&self.wait_timeout)
    }
}

impl ChartSettings {
    /// `<repo>/<chart>` as passed to helm
    pub fn reference(&self) -> String {
        format!("{}/{}", self.repo_name, self.name)
    }

    /// `extra_args` split the way a shell would
    pub fn extra_args(&self) -> Result<Vec<String>> {
        shell_words::split(&self.extra_args)
            .with_context(|| format!("Failed to parse chart.extra_args: {}", self.extra_args))
    }
}

impl Settings {
    /// Load settings from an explicit file, the standard locations, or defaults.
    /// An explicit path must exist; a broken file in a standard location is an error too.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match Self::find_config_file() {
            Some(path) => {
                crate::log_debug!("Using config file {}", path.display());
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Find config file in standard locations
    /// Priority:
    /// 1. .harbor-installer.toml in current directory
    /// 2. ~/.config/harbor-installer/config.toml (XDG config directory)
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        Self::user_config_path().filter(|path| path.exists())
    }

    /// Per-user config location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("harbor-installer").join("config.toml"))
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(domain) = &overrides.domain {
            self.harbor.domain = domain.clone();
        }
        if let Some(namespace) = &overrides.namespace {
            self.harbor.namespace = namespace.clone();
        }
        if let Some(password) = &overrides.admin_password {
            self.harbor.admin_password = password.clone();
        }
        if let Some(policy) = overrides.cleanup_certificates {
            self.behavior.cleanup_certificates = policy;
        }
    }

    /// Reject settings that would only fail later inside kubectl, helm or Harbor
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !is_hostname(&self.harbor.domain) {
            return Err(SettingsError::InvalidDomain(self.harbor.domain.clone()));
        }

        for (field, value) in [
            ("harbor.namespace", &self.harbor.namespace),
            ("harbor.release_name", &self.harbor.release_name),
        ] {
            if !HOSTNAME_LABEL.is_match(value) {
                return Err(SettingsError::InvalidName {
                    field,
                    value: value.clone(),
                });
            }
        }

        if !is_hostname(&self.tls.secret_name) {
            return Err(SettingsError::InvalidName {
                field: "tls.secret_name",
                value: self.tls.secret_name.clone(),
            });
        }

        if !is_strong_password(&self.harbor.admin_password) {
            return Err(SettingsError::WeakPassword);
        }

        if self.tls.validity_days == 0 {
            return Err(SettingsError::ZeroValidity);
        }

        if self.tls.key_bits < 2048 {
            return Err(SettingsError::WeakKey(self.tls.key_bits));
        }

        if !is_subject_value(&self.tls.organization) {
            return Err(SettingsError::InvalidOrganization(
                self.tls.organization.clone(),
            ));
        }

        if self.behavior.wait_timeout_duration().is_none() {
            return Err(SettingsError::InvalidTimeout(
                self.behavior.wait_timeout.clone(),
            ));
        }

        Ok(())
    }

    /// Settings as TOML with the admin password masked
    pub fn to_display_toml(&self) -> Result<String> {
        let mut masked = self.clone();
        masked.harbor.admin_password = "********".to_string();
        toml::to_string_pretty(&masked).context("Failed to serialize settings")
    }

    /// Generate example config file content
    pub fn example_config() -> Result<String> {
        let header = "# harbor-installer configuration file\n\
                      # Place this file at ~/.config/harbor-installer/config.toml or .harbor-installer.toml in your project\n\
                      # Optional keys: harbor.ingress_class, chart.version, persistence.storage_class\n\n";

        let body = toml::to_string_pretty(&Settings::default())
            .context("Failed to serialize default settings")?;

        Ok(format!("{}{}", header, body))
    }
}

/// RFC 1123 hostname: dot-separated labels, at most 253 characters
fn is_hostname(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 253
        && value.split('.').all(|label| HOSTNAME_LABEL.is_match(label))
}

/// kubectl duration with a single unit
fn parse_duration(value: &str) -> Option<Duration> {
    if !DURATION.is_match(value) {
        return None;
    }

    let (amount, unit) = value.split_at(value.len() - 1);
    let amount: u64 = amount.parse().ok()?;
    let secs = match unit {
        "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(3600)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// Safe inside an openssl `-subj /CN=../O=..` string
fn is_subject_value(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains(['/', '=', '\\'])
}

/// Harbor's own admin password rule
fn is_strong_password(value: &str) -> bool {
    let len = value.chars().count();
    (8..=128).contains(&len)
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.harbor.domain, "harbor.local");
        assert_eq!(settings.harbor.namespace, "harbor");
        assert_eq!(settings.harbor.admin_password, "Harbor12345");
        assert_eq!(settings.tls.validity_days, 365);
        assert_eq!(settings.tls.secret_name, "harbor-tls");
        assert_eq!(settings.behavior.values_file, "harbor-values.yaml");
        assert_eq!(settings.behavior.cleanup_certificates, CleanupPolicy::Ask);
        assert_eq!(settings.chart.reference(), "harbor/harbor");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_deserialization() {
        let toml_str = r#"
[harbor]
domain = "registry.example.com"
namespace = "registry"

[tls]
validity_days = 30

[behavior]
cleanup_certificates = "always"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.harbor.domain, "registry.example.com");
        assert_eq!(settings.harbor.namespace, "registry");
        assert_eq!(settings.harbor.release_name, "harbor");
        assert_eq!(settings.tls.validity_days, 30);
        assert_eq!(settings.tls.key_bits, 2048);
        assert_eq!(settings.behavior.cleanup_certificates, CleanupPolicy::Always);
    }

    #[test]
    fn test_example_config_round_trips() {
        let example = Settings::example_config().unwrap();
        assert!(example.contains("harbor-installer configuration"));
        assert!(example.contains("[harbor]"));
        assert!(example.contains("[tls]"));
        assert!(example.contains("[behavior]"));

        let parsed: Settings = toml::from_str(&example).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.harbor.domain = "harbor.corp.internal".to_string();
        settings.chart.version = Some("1.16.0".to_string());
        fs::write(&path, toml::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut settings = Settings::default();
        settings.apply(&Overrides {
            domain: Some("hub.example.org".to_string()),
            namespace: None,
            admin_password: Some("S3cretPassw0rd".to_string()),
            cleanup_certificates: Some(CleanupPolicy::Never),
        });
        assert_eq!(settings.harbor.domain, "hub.example.org");
        assert_eq!(settings.harbor.namespace, "harbor");
        assert_eq!(settings.harbor.admin_password, "S3cretPassw0rd");
        assert_eq!(settings.behavior.cleanup_certificates, CleanupPolicy::Never);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.harbor.domain = "Harbor_Local".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidDomain(_))
        ));

        let mut settings = Settings::default();
        settings.harbor.namespace = "-harbor".to_string();
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvalidName {
                field: "harbor.namespace",
                value: "-harbor".to_string()
            })
        );

        let mut settings = Settings::default();
        settings.harbor.admin_password = "harbor12345".to_string();
        assert_eq!(settings.validate(), Err(SettingsError::WeakPassword));

        let mut settings = Settings::default();
        settings.tls.validity_days = 0;
        assert_eq!(settings.validate(), Err(SettingsError::ZeroValidity));

        let mut settings = Settings::default();
        settings.tls.key_bits = 1024;
        assert_eq!(settings.validate(), Err(SettingsError::WeakKey(1024)));

        let mut settings = Settings::default();
        settings.behavior.wait_timeout = "10 minutes".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_organization_must_fit_certificate_subject() {
        let mut settings = Settings::default();
        settings.tls.organization = "ACME Registry, Inc.".to_string();
        assert!(settings.validate().is_ok());

        for bad in ["Dev/Ops", "O=Evil", "back\\slash", "  "] {
            settings.tls.organization = bad.to_string();
            assert_eq!(
                settings.validate(),
                Err(SettingsError::InvalidOrganization(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_wait_timeout_duration() {
        let mut behavior = Behavior::default();
        assert_eq!(
            behavior.wait_timeout_duration(),
            Some(Duration::from_secs(600))
        );

        behavior.wait_timeout = "10m".to_string();
        assert_eq!(
            behavior.wait_timeout_duration(),
            Some(Duration::from_secs(600))
        );

        behavior.wait_timeout = "2h".to_string();
        assert_eq!(
            behavior.wait_timeout_duration(),
            Some(Duration::from_secs(7200))
        );

        behavior.wait_timeout = "0s".to_string();
        assert_eq!(behavior.wait_timeout_duration(), None);

        behavior.wait_timeout = "99999999999999999999h".to_string();
        assert_eq!(behavior.wait_timeout_duration(), None);
    }

    #[test]
    fn test_hostname_rules() {
        assert!(is_hostname("harbor.local"));
        assert!(is_hostname("registry-1.k8s.example.com"));
        assert!(!is_hostname(""));
        assert!(!is_hostname("harbor..local"));
        assert!(!is_hostname("harbor.local."));
        assert!(!is_hostname(&"a".repeat(64)));
    }

    #[test]
    fn test_extra_args_split() {
        let mut chart = ChartSettings::default();
        chart.extra_args = r#"--set "trivy.enabled=false" --atomic"#.to_string();
        assert_eq!(
            chart.extra_args().unwrap(),
            ["--set", "trivy.enabled=false", "--atomic"]
        );

        chart.extra_args = String::new();
        assert!(chart.extra_args().unwrap().is_empty());
    }

    #[test]
    fn test_cleanup_policy_from_str() {
        assert_eq!("ask".parse::<CleanupPolicy>().unwrap(), CleanupPolicy::Ask);
        assert_eq!("YES".parse::<CleanupPolicy>().unwrap(), CleanupPolicy::Always);
        assert_eq!("never".parse::<CleanupPolicy>().unwrap(), CleanupPolicy::Never);
        assert!("sometimes".parse::<CleanupPolicy>().is_err());
        assert_eq!(CleanupPolicy::Always.to_string(), "always");
    }
}
