//! `four run`: unpack a package and hand its payload to the run command.

use std::fs;
use std::path::Path;
use std::time::Duration;

use four_schema::{CODE_ENTRY, PACKAGE_EXTENSION};

use super::require_extension;
use crate::codec::{self, ChecksumStatus, DecodedPackage};
use crate::error::{FourError, Result, ValidationError};
use crate::launcher::{Invocation, Launcher};
use crate::reporter::Reporter;
use crate::settings::Settings;

/// What the launched program produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `None` if the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Decode `package_path`, check it may run on `settings.host` and launch it.
///
/// The package is extracted into a fresh staging directory under
/// `settings.temp_root`, which is also the child's working directory and is
/// removed once the child exits.
///
/// # Errors
///
/// Returns [`FourError::PlatformMismatch`] without launching anything when
/// the package targets another platform, plus decode, checksum, launch and
/// timeout errors.
pub fn run(
    package_path: &Path,
    settings: &Settings,
    launcher: &dyn Launcher,
    reporter: &dyn Reporter,
) -> Result<RunOutcome> {
    require_extension(package_path, PACKAGE_EXTENSION)?;
    let package = codec::decode_file(package_path)?;
    let meta = &package.metadata;

    reporter.section("Running");
    reporter.info(&format!("{} {} by {}", meta.project, meta.version, meta.author));

    match package.verify_checksum()? {
        ChecksumStatus::Verified => {}
        ChecksumStatus::Pending => reporter.warning("Package carries no payload checksum"),
        ChecksumStatus::Unverifiable => reporter.warning(&format!(
            "Payload checksum {} is not SHA256 and was not verified",
            meta.checksum.as_ref().map_or("", |c| c.as_str())
        )),
    }

    if !meta.platform.accepts(settings.host) {
        return Err(FourError::PlatformMismatch {
            package: meta.platform,
            host: settings.host,
        });
    }

    fs::create_dir_all(&settings.temp_root)?;
    let staging = tempfile::Builder::new()
        .prefix("four-run-")
        .tempdir_in(&settings.temp_root)?;
    package.extract_to(staging.path())?;
    tracing::debug!(staging = %staging.path().display(), "package extracted");

    let invocation = invocation_for(
        &package,
        staging.path(),
        launcher.supports_wrapper(),
        settings.run_timeout,
    )?;
    reporter.step(&format!(
        "{} {}",
        invocation.program,
        invocation.args.join(" ")
    ));

    let output = launcher.launch(&invocation)?;
    tracing::info!(
        project = %meta.project,
        exit_code = ?output.code,
        "run complete"
    );

    Ok(RunOutcome {
        exit_code: output.code,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Resolve the command line for an extracted package.
fn invocation_for(
    package: &DecodedPackage,
    staging: &Path,
    wrapper_supported: bool,
    timeout: Option<Duration>,
) -> Result<Invocation> {
    let wrapper = package
        .metadata
        .wrapper
        .as_deref()
        .filter(|name| wrapper_supported && staging.join(name).is_file());

    let (program, args) = if let Some(script) = wrapper {
        ("cmd".to_string(), vec!["/C".to_string(), script.to_string()])
    } else {
        let mut words = package.metadata.run.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(ValidationError::MissingRun)?;
        let mut args: Vec<String> = words.collect();
        args.push(CODE_ENTRY.to_string());
        (program, args)
    };

    Ok(Invocation {
        program,
        args,
        cwd: staging.to_path_buf(),
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::ProcessOutput;
    use crate::ops::build;
    use crate::reporter::NullReporter;
    use four_schema::Platform;
    use std::sync::Mutex;

    /// Records invocations instead of spawning processes.
    #[derive(Default)]
    struct FakeLauncher {
        wrapper: bool,
        calls: Mutex<Vec<Invocation>>,
        saw_payload: Mutex<Option<String>>,
    }

    impl Launcher for FakeLauncher {
        fn supports_wrapper(&self) -> bool {
            self.wrapper
        }

        fn launch(&self, invocation: &Invocation) -> Result<ProcessOutput> {
            *self.saw_payload.lock().unwrap() =
                fs::read_to_string(invocation.cwd.join(CODE_ENTRY)).ok();
            self.calls.lock().unwrap().push(invocation.clone());
            Ok(ProcessOutput {
                code: Some(0),
                stdout: b"code.four-code\n".to_vec(),
                stderr: Vec::new(),
            })
        }
    }

    fn settings(root: &Path, host: Platform) -> Settings {
        Settings {
            temp_root: root.join("tmp"),
            out_dir: root.to_path_buf(),
            run_timeout: None,
            host,
        }
    }

    fn package(root: &Path, platform: &str, run: &str) -> std::path::PathBuf {
        let descriptor = root.join("demo.four");
        fs::write(
            &descriptor,
            format!(
                "PROJECT \"demo\"\nCONFIGURE[\"platform\", \"{platform}\"]\nCONFIGURE[\"run\", \"{run}\"]\nDEFINE demo\nhello\n"
            ),
        )
        .unwrap();
        build(&descriptor, &settings(root, Platform::Linux), &NullReporter)
            .unwrap()
            .output
    }

    #[test]
    fn demo_runs_command_with_payload_appended() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "all", "echo");
        let launcher = FakeLauncher::default();

        let outcome = run(
            &app,
            &settings(dir.path(), Platform::Linux),
            &launcher,
            &NullReporter,
        )
        .unwrap();
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.stdout, b"code.four-code\n");

        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "echo");
        assert_eq!(calls[0].args, vec!["code.four-code".to_string()]);
        assert_eq!(launcher.saw_payload.lock().unwrap().as_deref(), Some("hello\n"));
    }

    #[test]
    fn staging_directory_is_gone_after_run() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "all", "echo");
        let launcher = FakeLauncher::default();
        let settings = settings(dir.path(), Platform::Linux);
        run(&app, &settings, &launcher, &NullReporter).unwrap();

        let cwd = launcher.calls.lock().unwrap()[0].cwd.clone();
        assert!(cwd.starts_with(&settings.temp_root));
        assert!(!cwd.exists());
    }

    #[test]
    fn run_command_words_become_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "linux", "python3 -u");
        let launcher = FakeLauncher::default();
        run(&app, &settings(dir.path(), Platform::Linux), &launcher, &NullReporter).unwrap();

        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls[0].program, "python3");
        assert_eq!(calls[0].args, vec!["-u".to_string(), "code.four-code".to_string()]);
    }

    #[test]
    fn windows_package_on_linux_is_refused_without_launching() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "windows-11", "python");
        let launcher = FakeLauncher::default();

        let err = run(&app, &settings(dir.path(), Platform::Linux), &launcher, &NullReporter)
            .unwrap_err();
        assert!(matches!(
            err,
            FourError::PlatformMismatch {
                package: Platform::Windows11,
                host: Platform::Linux
            }
        ));
        assert!(launcher.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn linux_package_is_refused_on_windows() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "linux", "sh");
        let launcher = FakeLauncher::default();
        let err = run(&app, &settings(dir.path(), Platform::Windows), &launcher, &NullReporter)
            .unwrap_err();
        assert!(matches!(err, FourError::PlatformMismatch { .. }));
    }

    #[test]
    fn all_runs_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "all", "echo");
        for host in Platform::ALL {
            let launcher = FakeLauncher::default();
            run(&app, &settings(dir.path(), host), &launcher, &NullReporter).unwrap();
            assert_eq!(launcher.calls.lock().unwrap().len(), 1);
        }
    }

    #[test]
    fn wrapper_is_used_when_supported() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "windows-10", "python");
        let launcher = FakeLauncher {
            wrapper: true,
            ..FakeLauncher::default()
        };
        run(&app, &settings(dir.path(), Platform::Windows10), &launcher, &NullReporter).unwrap();

        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls[0].program, "cmd");
        assert_eq!(calls[0].args, vec!["/C".to_string(), "run.bat".to_string()]);
    }

    #[test]
    fn wrapper_is_skipped_when_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "windows", "python");
        let launcher = FakeLauncher::default();
        run(&app, &settings(dir.path(), Platform::Windows), &launcher, &NullReporter).unwrap();

        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls[0].program, "python");
        assert_eq!(calls[0].args, vec!["code.four-code".to_string()]);
    }

    #[test]
    fn timeout_setting_reaches_the_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let app = package(dir.path(), "all", "echo");
        let launcher = FakeLauncher::default();
        let mut settings = settings(dir.path(), Platform::Linux);
        settings.run_timeout = Some(Duration::from_secs(7));
        run(&app, &settings, &launcher, &NullReporter).unwrap();
        assert_eq!(
            launcher.calls.lock().unwrap()[0].timeout,
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn rejects_non_app_paths() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &dir.path().join("demo.four"),
            &settings(dir.path(), Platform::Linux),
            &FakeLauncher::default(),
            &NullReporter,
        )
        .unwrap_err();
        assert!(matches!(err, FourError::Extension { expected: "app", .. }));
    }

    #[test]
    fn garbage_file_is_an_invalid_header() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("junk.app");
        fs::write(&app, b"definitely not a package").unwrap();
        let err = run(
            &app,
            &settings(dir.path(), Platform::Linux),
            &FakeLauncher::default(),
            &NullReporter,
        )
        .unwrap_err();
        assert!(matches!(err, FourError::InvalidHeader(_)));
    }
}
