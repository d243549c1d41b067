//! The `settings.json` record embedded in every package.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Checksum, Platform};

/// Package metadata as stored in the archive.
///
/// `checksum` is `None` only while a build is still in progress: the first
/// write of `settings.json` happens before the payload hash is known, and the
/// record is rewritten once every other field is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Sanitized project name.
    pub project: String,
    /// Target platform.
    pub platform: Platform,
    /// Command template the payload is handed to.
    pub run: String,
    /// Readme text (possibly substituted from an export).
    pub readme: String,
    /// Free-form version string.
    pub version: String,
    /// Author name.
    pub author: String,
    /// Description; may be empty.
    #[serde(default)]
    pub description: String,
    /// ISO-8601 build timestamp.
    pub build_time: String,
    /// `<os>-<arch>` of the machine that produced the package.
    pub build_platform: String,
    /// Hex digest of the payload, `null` while pending. `four` writes SHA256.
    pub checksum: Option<Checksum>,
    /// Name of the embedded launcher script, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    /// Configuration keys the descriptor declared but `four` does not know.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Serialize as indented JSON, the on-disk form.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse the on-disk JSON form.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if `json` is not a valid metadata record.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
