//! In-memory project model.
//!
//! The parser fills a [`ProjectModel`]; [`ProjectModel::validate`] turns it
//! into a [`ValidProject`], the only shape the codec accepts. Keeping the
//! two apart means an unvalidated project can never reach the packager.

use std::collections::BTreeMap;
use std::fmt;
use std::path::MAIN_SEPARATOR;

use four_schema::Platform;

use crate::error::ValidationError;

/// Readme used when the descriptor configures none.
pub const DEFAULT_README: &str = "Welcome to my app made with Love! ❤️";

/// Version used when the descriptor configures none.
pub const DEFAULT_VERSION: &str = "1.0";

/// Author used when the descriptor configures none.
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// A typed constant declared with `EXPORT`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ExportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Values set through `CONFIGURE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub platform: Option<String>,
    pub run: Option<String>,
    pub readme: String,
    pub version: String,
    pub author: String,
    pub description: String,
    /// Keys `four` does not interpret, kept verbatim.
    pub extra: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: None,
            run: None,
            readme: DEFAULT_README.to_string(),
            version: DEFAULT_VERSION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            description: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Assign `key`. Unknown keys land in `extra`.
    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "platform" => self.platform = Some(value),
            "run" => self.run = Some(value),
            "readme" => self.readme = value,
            "version" => self.version = value,
            "author" => self.author = value,
            "description" => self.description = value,
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }
}

/// An asset copy instruction from a `FILE` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCopy {
    pub source: String,
    pub dest: String,
}

/// Project state as the descriptor parser builds it up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectModel {
    pub name: Option<String>,
    pub config: Config,
    pub exports: BTreeMap<String, ExportValue>,
    /// Identifier given to `DEFINE`.
    pub entry: Option<String>,
    pub payload: String,
    pub folders: Vec<String>,
    pub files: Vec<FileCopy>,
}

/// A project whose mandatory fields are present and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProject {
    pub name: String,
    pub platform: Platform,
    pub run: String,
    pub readme: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub extra: BTreeMap<String, String>,
    pub exports: BTreeMap<String, ExportValue>,
    pub entry: String,
    pub payload: String,
    pub folders: Vec<String>,
    pub files: Vec<FileCopy>,
}

impl ProjectModel {
    /// Check every invariant and produce the packageable form.
    ///
    /// Checks run in a fixed order (project, platform, run, define, platform
    /// value) so the reported error is stable when several are missing.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(self) -> Result<ValidProject, ValidationError> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::MissingProject)?;
        let platform = self
            .config
            .platform
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::MissingPlatform)?;
        let run = self
            .config
            .run
            .filter(|r| !r.trim().is_empty())
            .ok_or(ValidationError::MissingRun)?;
        if self.payload.trim().is_empty() {
            return Err(ValidationError::MissingDefine);
        }
        let platform: Platform = platform
            .parse()
            .map_err(|_| ValidationError::InvalidPlatform(platform))?;

        Ok(ValidProject {
            name,
            platform,
            run,
            readme: self.config.readme,
            version: self.config.version,
            author: self.config.author,
            description: self.config.description,
            extra: self.config.extra,
            exports: self.exports,
            entry: self.entry.unwrap_or_default(),
            payload: self.payload,
            folders: self.folders,
            files: self.files,
        })
    }
}

/// Replace characters that are illegal in file names on any host.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// Rewrite both separator styles to the host separator.
pub fn normalize_path(path: &str) -> String {
    path.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}
