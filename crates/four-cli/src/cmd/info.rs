//! Info command

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;
use four_core::ops;

use crate::ui::theme::format_size;

/// Print the metadata and contents of a package.
pub fn info(file: &Path) -> Result<()> {
    let report = ops::info(file)?;

    println!();
    print!("{report}");

    let files = report.entries.iter().filter(|e| !e.is_dir);
    let total: u64 = files.clone().map(|e| e.size).sum();
    println!();
    println!(
        "{}",
        format!("{} files, {} uncompressed", files.count(), format_size(total)).dark_grey()
    );
    Ok(())
}
