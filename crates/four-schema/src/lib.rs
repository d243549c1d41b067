//! Shared types and wire format for `four` application packages.
//!
//! Everything that has to agree between the packager (`build`) and the
//! consumers (`run`, `info`) lives here: target platforms, the magic headers
//! that tag a package, the metadata record and the payload checksum.

pub mod format;
pub mod hash;
pub mod metadata;
pub mod platform;

// Re-exports
pub use format::{PackageFormat, UnknownHeader};
pub use hash::{Checksum, Sha256Hash};
pub use metadata::Metadata;
pub use platform::{Platform, PlatformError, build_host_tag};

/// Archive entry holding the serialized [`Metadata`].
pub const SETTINGS_ENTRY: &str = "settings.json";

/// Archive entry holding the verbatim payload text.
pub const CODE_ENTRY: &str = "code.four-code";

/// Archive entry holding the Windows launcher script, when one is embedded.
pub const WRAPPER_ENTRY: &str = "run.bat";

/// File extension of descriptor sources.
pub const DESCRIPTOR_EXTENSION: &str = "four";

/// File extension of built packages.
pub const PACKAGE_EXTENSION: &str = "app";
