//! User-facing operations: `build`, `run` and `info`.
//!
//! Each operation takes its collaborators explicitly ([`Settings`],
//! [`Reporter`], [`Launcher`]) so the CLI and the tests drive the same code.
//!
//! [`Settings`]: crate::settings::Settings
//! [`Reporter`]: crate::reporter::Reporter
//! [`Launcher`]: crate::launcher::Launcher

mod build;
mod info;
mod run;

pub use build::{BuildOutcome, build};
pub use info::{PackageReport, info, report};
pub use run::{RunOutcome, run};

use std::path::Path;

use crate::error::{FourError, Result};

/// Fail unless `path` ends in `.{expected}`.
fn require_extension(path: &Path, expected: &'static str) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == expected => Ok(()),
        _ => Err(FourError::Extension {
            path: path.to_path_buf(),
            expected,
        }),
    }
}
