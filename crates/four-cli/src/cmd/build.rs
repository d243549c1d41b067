//! Build command

use std::path::{Path, PathBuf};

use anyhow::Result;
use four_core::{Settings, ops};

use crate::ui::Output;
use crate::ui::theme::format_size;

/// Build `file` into a package, optionally overriding the output directory.
pub fn build(file: &Path, out_dir: Option<PathBuf>, output: &Output) -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(dir) = out_dir {
        settings.out_dir = dir;
    }

    let outcome = ops::build(file, &settings, output)?;

    if !outcome.missing_assets.is_empty() {
        output.warning(&format!(
            "{} asset{} missing from the package",
            outcome.missing_assets.len(),
            if outcome.missing_assets.len() == 1 { "" } else { "s" }
        ));
    }
    output.success(&format!(
        "Built {} ({}) in {:.1}s",
        outcome.output.display(),
        format_size(outcome.bytes),
        outcome.elapsed.as_secs_f64()
    ));
    Ok(())
}
