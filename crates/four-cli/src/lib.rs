//! four - build and run `.four` descriptors
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! A `.four` descriptor declares a project, its configuration, assets and a
//! payload. `four build` packs it into a `.app` file; `four run` unpacks the
//! file and hands the payload to the configured command; `four info` prints
//! what a package contains.
//!
//! # Layout
//!
//! - [`cmd`]: one handler per subcommand, returning `anyhow::Result`
//! - [`ui`]: terminal rendering, driven through [`ui::Output`]

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use four_schema::Platform;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "four")]
#[command(author, version, about = "four - package .four descriptors into runnable .app files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a .four descriptor into a .app package
    Build {
        /// Descriptor file (.four)
        file: PathBuf,
        /// Directory the package is written to
        #[arg(long, short = 'o', env = "FOUR_OUT_DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Run a .app package
    Run {
        /// Package file (.app)
        file: PathBuf,
        /// Kill the program after this many seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,
        /// Treat the host as this platform when checking compatibility
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Show what a .app package contains
    Info {
        /// Package file (.app)
        file: PathBuf,
    },
    /// Show version and host platform
    Version,
}
