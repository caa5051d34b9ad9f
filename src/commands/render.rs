//! Render command: write the Helm values file without touching the cluster

use crate::config::settings::Settings;
use crate::config::values;
use crate::utils::dryrun;
use anyhow::Result;
use std::path::PathBuf;

/// Explicit `--output`, else `behavior.values_file`
pub fn output_path(settings: &Settings, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| PathBuf::from(&settings.behavior.values_file))
}

pub fn render(settings: &Settings, output: Option<PathBuf>, to_stdout: bool) -> Result<()> {
    if to_stdout {
        print!("{}", values::render(settings)?);
        return Ok(());
    }

    let path = output_path(settings, output);

    dryrun::exec_unless_dry_run(&format!("write {}", path.display()), || {
        values::write(settings, &path)
    })
}
