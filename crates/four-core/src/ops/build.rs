//! `four build`: descriptor in, package out.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use four_schema::{Checksum, DESCRIPTOR_EXTENSION, PACKAGE_EXTENSION};

use super::require_extension;
use crate::codec::{self, BuildContext};
use crate::descriptor;
use crate::project::ValidProject;
use crate::error::Result;
use crate::reporter::Reporter;
use crate::settings::Settings;

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    /// Path of the written package.
    pub output: PathBuf,
    /// Package size in bytes.
    pub bytes: u64,
    pub checksum: Option<Checksum>,
    pub missing_assets: Vec<String>,
    pub elapsed: Duration,
}

/// Interpreters expected to exist on a stock Windows machine with the usual
/// runtimes installed.
const WINDOWS_RUNNERS: &[&str] = &[
    "python", "python3", "node", "java", "dotnet", "powershell", "cmd",
];

/// Build the package described by `descriptor_path` into `settings.out_dir`.
///
/// # Errors
///
/// Returns [`FourError::Extension`](crate::FourError::Extension) for a
/// non-`.four` path, and any parse, validation, encoding or I/O error.
pub fn build(
    descriptor_path: &Path,
    settings: &Settings,
    reporter: &dyn Reporter,
) -> Result<BuildOutcome> {
    let started = Instant::now();
    require_extension(descriptor_path, DESCRIPTOR_EXTENSION)?;

    reporter.section("Building");
    let project = descriptor::parse_file(descriptor_path)?.validate()?;
    reporter.info(&format!(
        "{} {} for {}",
        project.name, project.version, project.platform
    ));

    let source_root = match descriptor_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if let Some(program) = foreign_windows_runner(&project, &source_root) {
        reporter.warning(&format!(
            "Run command '{program}' might not be available on Windows"
        ));
    }
    let ctx = BuildContext::new(source_root, &settings.temp_root);
    let encoded = codec::encode(&project, &ctx, reporter)?;

    fs::create_dir_all(&settings.out_dir)?;
    let output = settings
        .out_dir
        .join(format!("{}.{PACKAGE_EXTENSION}", project.name));
    fs::write(&output, &encoded.bytes)?;

    let outcome = BuildOutcome {
        output,
        bytes: encoded.bytes.len() as u64,
        checksum: encoded.metadata.checksum,
        missing_assets: encoded.missing_assets,
        elapsed: started.elapsed(),
    };
    tracing::info!(
        output = %outcome.output.display(),
        bytes = outcome.bytes,
        missing_assets = outcome.missing_assets.len(),
        "build complete"
    );
    Ok(outcome)
}

/// The first word of `run` when a Windows-family package names a program
/// that is neither a known runner nor a file shipped next to the descriptor.
fn foreign_windows_runner<'a>(project: &'a ValidProject, source_root: &Path) -> Option<&'a str> {
    if !project.platform.is_windows_family() {
        return None;
    }
    let program = project.run.split_whitespace().next()?;
    let lowered = program.to_ascii_lowercase();
    let base = lowered.strip_suffix(".exe").unwrap_or(&lowered);
    if WINDOWS_RUNNERS.contains(&base) || source_root.join(program).exists() {
        None
    } else {
        Some(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::error::FourError;
    use crate::reporter::NullReporter;
    use four_schema::Platform;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        warnings: Mutex<Vec<String>>,
    }

    impl Reporter for RecordingReporter {
        fn section(&self, _: &str) {}
        fn step(&self, _: &str) {}
        fn info(&self, _: &str) {}
        fn success(&self, _: &str) {}
        fn warning(&self, msg: &str) {
            self.warnings.lock().unwrap().push(msg.to_string());
        }
        fn error(&self, _: &str) {}
    }

    fn write_descriptor(dir: &Path, platform: &str, run: &str) -> PathBuf {
        let descriptor = dir.join("w.four");
        fs::write(
            &descriptor,
            format!(
                "PROJECT \"w\"\nCONFIGURE[\"platform\", \"{platform}\"]\nCONFIGURE[\"run\", \"{run}\"]\nDEFINE w\nx\n"
            ),
        )
        .unwrap();
        descriptor
    }

    fn settings(root: &Path) -> Settings {
        Settings {
            temp_root: root.join("tmp"),
            out_dir: root.join("dist"),
            run_timeout: None,
            host: Platform::Linux,
        }
    }

    #[test]
    fn writes_package_named_after_project() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("demo.four");
        fs::write(
            &descriptor,
            "PROJECT \"my:app\"\nCONFIGURE[\"platform\", \"all\"]\nCONFIGURE[\"run\", \"echo\"]\nDEFINE demo\nhello\n",
        )
        .unwrap();

        let outcome = build(&descriptor, &settings(dir.path()), &NullReporter).unwrap();
        assert_eq!(outcome.output, dir.path().join("dist/my_app.app"));
        assert!(outcome.missing_assets.is_empty());

        let bytes = fs::read(&outcome.output).unwrap();
        assert_eq!(bytes.len() as u64, outcome.bytes);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.metadata.project, "my_app");
        assert_eq!(decoded.metadata.checksum, outcome.checksum);
    }

    #[test]
    fn asset_sources_resolve_next_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("proj");
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(project_dir.join("data.txt"), "data").unwrap();
        let descriptor = project_dir.join("a.four");
        fs::write(
            &descriptor,
            "PROJECT \"a\"\nCONFIGURE[\"platform\", \"linux\"]\nCONFIGURE[\"run\", \"cat\"]\n\
             FILE \"data.txt\" \"data.txt\"\nFILE \"gone.txt\" \"gone.txt\"\nDEFINE a\nx\n",
        )
        .unwrap();

        let outcome = build(&descriptor, &settings(dir.path()), &NullReporter).unwrap();
        assert_eq!(outcome.missing_assets, vec!["gone.txt".to_string()]);
        let decoded = decode(&fs::read(&outcome.output).unwrap()).unwrap();
        assert!(decoded.has_entry("data.txt"));
    }

    #[test]
    fn rejects_wrong_extension_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(
            &dir.path().join("demo.txt"),
            &settings(dir.path()),
            &NullReporter,
        )
        .unwrap_err();
        assert!(matches!(err, FourError::Extension { .. }));
    }

    #[test]
    fn missing_descriptor_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(
            &dir.path().join("absent.four"),
            &settings(dir.path()),
            &NullReporter,
        )
        .unwrap_err();
        assert!(matches!(err, FourError::FileNotFound(_)));
    }

    #[test]
    fn invalid_project_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("bad.four");
        fs::write(&descriptor, "PROJECT \"bad\"\nDEFINE m\nx\n").unwrap();

        let err = build(&descriptor, &settings(dir.path()), &NullReporter).unwrap_err();
        assert!(matches!(err, FourError::Validation(_)));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn warns_about_unknown_windows_runner() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write_descriptor(dir.path(), "windows-10", "bash -e");
        let reporter = RecordingReporter::default();
        build(&descriptor, &settings(dir.path()), &reporter).unwrap();

        let warnings = reporter.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'bash'"));
    }

    #[test]
    fn known_windows_runners_are_quiet() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tool.bat"), "@echo off\n").unwrap();
        for run in ["python -u", "Node.exe", "tool.bat"] {
            let descriptor = write_descriptor(dir.path(), "windows", run);
            let reporter = RecordingReporter::default();
            build(&descriptor, &settings(dir.path()), &reporter).unwrap();
            assert!(reporter.warnings.lock().unwrap().is_empty(), "{run} warned");
        }
    }

    #[test]
    fn runner_check_only_applies_to_windows_targets() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write_descriptor(dir.path(), "linux", "bash");
        let reporter = RecordingReporter::default();
        build(&descriptor, &settings(dir.path()), &reporter).unwrap();
        assert!(reporter.warnings.lock().unwrap().is_empty());
    }
}
