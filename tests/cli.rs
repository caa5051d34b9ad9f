//! End-to-end checks against the built binary that need no cluster

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Run the binary inside `dir` with config lookup and tool discovery isolated
fn run_in(dir: &Path, path_env: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_harbor-installer"))
        .args(args)
        .current_dir(dir)
        .env("PATH", path_env)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("KUBECONFIG")
        .env_remove("HARBOR_ADMIN_PASSWORD")
        .env_remove("HARBOR_INSTALLER_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run harbor-installer")
}

fn host_path() -> String {
    std::env::var("PATH").unwrap_or_default()
}

#[test]
fn install_without_tools_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(dir.path(), "", &["install"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing required tools"), "stderr: {}", stderr);
    assert!(stderr.contains("kubectl"));
    assert!(stderr.contains("helm"));

    // Nothing may be written when prerequisites are missing
    assert!(!dir.path().join("tls.key").exists());
    assert!(!dir.path().join("tls.crt").exists());
    assert!(!dir.path().join("harbor-values.yaml").exists());
}

#[test]
fn default_command_is_install() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(dir.path(), "", &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing required tools"), "stderr: {}", stderr);
}

#[test]
fn render_to_stdout_uses_overrides() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(
        dir.path(),
        &host_path(),
        &[
            "render",
            "--stdout",
            "--domain",
            "registry.example.com",
            "--namespace",
            "registry",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# namespace: registry"));
    assert!(stdout.contains("core: registry.example.com"));
    assert!(stdout.contains("externalURL: https://registry.example.com"));
    assert!(stdout.contains("secretName: harbor-tls"));
}

#[test]
fn render_writes_values_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.yaml");

    let output = run_in(
        dir.path(),
        &host_path(),
        &["render", "--output", target.to_str().unwrap()],
    );

    assert!(output.status.success());
    let contents = fs::read_to_string(&target).unwrap();
    assert!(contents.contains("core: harbor.local"));
    assert!(contents.contains("harborAdminPassword: Harbor12345"));
}

#[test]
fn render_reads_local_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".harbor-installer.toml"),
        "[harbor]\ndomain = \"hub.internal\"\n\n[persistence]\nregistry_size = \"50Gi\"\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &host_path(), &["render", "--stdout"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("core: hub.internal"));
    assert!(stdout.contains("size: 50Gi"));
}

#[test]
fn invalid_domain_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(
        dir.path(),
        &host_path(),
        &["render", "--stdout", "--domain", "not a hostname"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn dry_run_render_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(dir.path(), &host_path(), &["--dry-run", "render"]);

    assert!(output.status.success());
    assert!(!dir.path().join("harbor-values.yaml").exists());
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();

    let first = run_in(dir.path(), &host_path(), &["config", "init"]);
    assert!(first.status.success());
    let written = fs::read_to_string(dir.path().join(".harbor-installer.toml")).unwrap();
    assert!(written.contains("[harbor]"));

    let second = run_in(dir.path(), &host_path(), &["config", "init"]);
    assert_eq!(second.status.code(), Some(1));

    let forced = run_in(dir.path(), &host_path(), &["config", "init", "--force"]);
    assert!(forced.status.success());
}

#[test]
fn config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(dir.path(), &host_path(), &["config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("harbor.local"));
    assert!(!stdout.contains("Harbor12345"));
}
