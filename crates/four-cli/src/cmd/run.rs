//! Run command

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use four_core::{Settings, SystemLauncher, ops};
use four_schema::Platform;

use crate::ui::Output;

/// Run a package and return the exit code `four` should exit with.
///
/// A child killed by a signal maps to 1.
pub fn run(
    file: &Path,
    timeout: Option<u64>,
    platform: Option<Platform>,
    output: &Output,
) -> Result<i32> {
    let mut settings = Settings::from_env();
    if let Some(secs) = timeout {
        settings.run_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(host) = platform {
        settings.host = host;
    }

    let outcome = ops::run(file, &settings, &SystemLauncher, output)?;

    // Child output goes after everything the reporter queued.
    output.wait();
    io::stdout().write_all(&outcome.stdout)?;
    io::stdout().flush()?;
    io::stderr().write_all(&outcome.stderr)?;

    match outcome.exit_code {
        Some(0) => {
            output.success("Program finished");
            Ok(0)
        }
        Some(code) => {
            output.warning(&format!("Program exited with code {code}"));
            Ok(code)
        }
        None => {
            output.warning("Program was terminated by a signal");
            Ok(1)
        }
    }
}
