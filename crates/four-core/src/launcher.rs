//! External process execution.
//!
//! `run` hands the payload to a configured command. The [`Launcher`] trait is
//! the only place a process gets spawned, so operations can be exercised in
//! tests with a recording fake.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::{FourError, Result};

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Kill the child after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

/// What a finished child left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Capability to run external commands on the host.
pub trait Launcher {
    /// Whether embedded launcher scripts (`run.bat`) can run on this host.
    fn supports_wrapper(&self) -> bool;

    /// Run `invocation` to completion, capturing both output streams.
    ///
    /// # Errors
    ///
    /// Returns [`FourError::Launch`] if the program cannot be started and
    /// [`FourError::Timeout`] if it outlives `invocation.timeout`.
    fn launch(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs commands with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn supports_wrapper(&self) -> bool {
        cfg!(windows)
    }

    fn launch(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            program = %invocation.program,
            args = ?invocation.args,
            cwd = %invocation.cwd.display(),
            "launching"
        );

        let launch_error = |source| FourError::Launch {
            program: invocation.program.clone(),
            source,
        };

        let Some(limit) = invocation.timeout else {
            let output = cmd.output().map_err(launch_error)?;
            return Ok(ProcessOutput {
                code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        };

        let mut child = cmd.spawn().map_err(launch_error)?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        if let Some(status) = child.wait_timeout(limit)? {
            Ok(ProcessOutput {
                code: status.code(),
                stdout: collect(stdout)?,
                stderr: collect(stderr)?,
            })
        } else {
            // Timeout - kill the process
            let _ = child.kill();
            let _ = child.wait();
            Err(FourError::Timeout {
                program: invocation.program.clone(),
                seconds: limit.as_secs(),
            })
        }
    }
}

/// Read a pipe to the end on its own thread so a chatty child cannot block
/// on a full pipe while we wait for it.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("output reader thread panicked"))??;
    Ok(bytes)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn invocation(program: &str, args: &[&str]) -> Invocation {
        Invocation {
            program: program.to_string(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
            cwd: std::env::temp_dir(),
            timeout: None,
        }
    }

    #[test]
    fn captures_stdout_and_exit_code() {
        let out = SystemLauncher.launch(&invocation("echo", &["hi"])).unwrap();
        assert_eq!(out.code, Some(0));
        assert_eq!(out.stdout, b"hi\n");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn propagates_non_zero_exit_and_stderr() {
        let out = SystemLauncher
            .launch(&invocation("sh", &["-c", "echo oops >&2; exit 3"]))
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr, b"oops\n");
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let mut inv = invocation("cat", &["marker.txt"]);
        inv.cwd = dir.path().to_path_buf();
        let out = SystemLauncher.launch(&inv).unwrap();
        assert_eq!(out.stdout, b"here");
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let err = SystemLauncher
            .launch(&invocation("four-test-no-such-program", &[]))
            .unwrap_err();
        assert!(matches!(err, FourError::Launch { .. }));
    }

    #[test]
    fn timeout_kills_slow_child() {
        let mut inv = invocation("sleep", &["5"]);
        inv.timeout = Some(Duration::from_millis(100));
        let err = SystemLauncher.launch(&inv).unwrap_err();
        assert!(matches!(err, FourError::Timeout { .. }));
    }

    #[test]
    fn timeout_path_still_captures_output() {
        let mut inv = invocation("sh", &["-c", "echo fast"]);
        inv.timeout = Some(Duration::from_secs(10));
        let out = SystemLauncher.launch(&inv).unwrap();
        assert_eq!(out.code, Some(0));
        assert_eq!(out.stdout, b"fast\n");
    }
}
