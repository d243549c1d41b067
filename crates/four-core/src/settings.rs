//! Runtime settings shared by every operation.

use std::path::PathBuf;
use std::time::Duration;

use four_schema::Platform;

/// Knobs that are not part of a descriptor or a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where staging directories are created.
    pub temp_root: PathBuf,
    /// Where `build` writes packages.
    pub out_dir: PathBuf,
    /// Kill `run` children after this long.
    pub run_timeout: Option<Duration>,
    /// Platform family `run` checks packages against.
    pub host: Platform,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
            out_dir: PathBuf::from("."),
            run_timeout: None,
            host: Platform::current(),
        }
    }
}

impl Settings {
    /// Load settings from `FOUR_*` environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults; a bad value
    /// is logged rather than treated as fatal.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(dir) = lookup("FOUR_TMPDIR").filter(|v| !v.is_empty()) {
            settings.temp_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FOUR_OUT_DIR").filter(|v| !v.is_empty()) {
            settings.out_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("FOUR_RUN_TIMEOUT") {
            match raw.trim().parse::<u64>() {
                Ok(0) => {}
                Ok(secs) => settings.run_timeout = Some(Duration::from_secs(secs)),
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring FOUR_RUN_TIMEOUT"),
            }
        }
        if let Some(raw) = lookup("FOUR_PLATFORM") {
            match raw.parse::<Platform>() {
                Ok(host) => settings.host = host,
                Err(e) => tracing::warn!(error = %e, "ignoring FOUR_PLATFORM"),
            }
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.run_timeout, None);
        assert_eq!(settings.out_dir, PathBuf::from("."));
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            ("FOUR_TMPDIR", "/scratch"),
            ("FOUR_OUT_DIR", "dist"),
            ("FOUR_RUN_TIMEOUT", "30"),
            ("FOUR_PLATFORM", "windows-10"),
        ]));
        assert_eq!(settings.temp_root, PathBuf::from("/scratch"));
        assert_eq!(settings.out_dir, PathBuf::from("dist"));
        assert_eq!(settings.run_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.host, Platform::Windows10);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            ("FOUR_RUN_TIMEOUT", "soon"),
            ("FOUR_PLATFORM", "plan9"),
            ("FOUR_TMPDIR", ""),
        ]));
        assert_eq!(settings.run_timeout, None);
        assert_eq!(settings.host, Platform::current());
        assert_eq!(settings.temp_root, std::env::temp_dir());
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let settings = Settings::from_lookup(lookup(&[("FOUR_RUN_TIMEOUT", "0")]));
        assert_eq!(settings.run_timeout, None);
    }
}
