//! `four info`: describe a package without running it.

use std::fmt;
use std::path::Path;

use four_schema::PACKAGE_EXTENSION;

use super::require_extension;
use crate::codec::{self, ArchiveEntry, DecodedPackage};
use crate::error::Result;

/// Human-readable description of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    /// Labelled metadata fields in display order. Empty optional fields are
    /// left out.
    pub fields: Vec<(String, String)>,
    pub entries: Vec<ArchiveEntry>,
}

impl PackageReport {
    /// Value of the field labelled `label`, if present.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode `package_path` and describe it.
///
/// # Errors
///
/// Returns [`FourError::Extension`](crate::FourError::Extension) for a
/// non-`.app` path, and any decode error.
pub fn info(package_path: &Path) -> Result<PackageReport> {
    require_extension(package_path, PACKAGE_EXTENSION)?;
    let package = codec::decode_file(package_path)?;
    Ok(report(&package))
}

/// Describe an already decoded package.
pub fn report(package: &DecodedPackage) -> PackageReport {
    let meta = &package.metadata;
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut push = |label: &str, value: &str| {
        if !value.is_empty() {
            fields.push((label.to_string(), value.to_string()));
        }
    };

    push("Project", &meta.project);
    push("Version", &meta.version);
    push("Platform", meta.platform.as_str());
    push("Run Command", &meta.run);
    push("Author", &meta.author);
    push("Description", &meta.description);
    push("Readme", &meta.readme);
    push("Build Time", truncate_chars(&meta.build_time, 19));
    push("Build Platform", &meta.build_platform);
    push(
        "Checksum",
        meta.checksum.as_ref().map_or("", |c| c.as_str()),
    );
    push("Wrapper", meta.wrapper.as_deref().unwrap_or_default());
    push("Format", package.format.as_str());
    for (key, value) in &meta.extra {
        push(key, value);
    }

    PackageReport {
        fields,
        entries: package.entries.clone(),
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl fmt::Display for PackageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .fields
            .iter()
            .map(|(label, _)| label.len() + 1)
            .max()
            .unwrap_or(0);

        for (label, value) in &self.fields {
            writeln!(f, "{:<width$} {value}", format!("{label}:"))?;
        }

        writeln!(f)?;
        writeln!(f, "Contents:")?;
        for entry in &self.entries {
            if entry.is_dir {
                writeln!(f, "  {}", entry.name)?;
            } else {
                writeln!(f, "  {} ({} bytes)", entry.name, entry.size)?;
            }
        }
        Ok(())
    }
}
