pub mod codec;
pub mod descriptor;
pub mod error;
pub mod launcher;
pub mod ops;
pub mod project;
pub mod settings;

pub mod reporter;

pub use codec::{ArchiveEntry, BuildContext, ChecksumStatus, DecodedPackage, EncodedPackage};
pub use error::{FourError, Result, ValidationError};
pub use launcher::{Invocation, Launcher, ProcessOutput, SystemLauncher};
pub use project::{ProjectModel, ValidProject};
pub use reporter::{NullReporter, Reporter};
pub use settings::Settings;
