//! Package codec: [`ValidProject`] to package bytes and back.
//!
//! Layout of a package:
//!
//! ```text
//! +----------------------+-------------------------------------------+
//! | magic (8 or 12 B)    | zip archive                               |
//! | LOVE-APP[-WIN]       |   settings.json   metadata (JSON)         |
//! |                      |   code.four-code  payload (verbatim)      |
//! |                      |   run.bat         launcher (Windows only) |
//! |                      |   <folders>/ <files>                      |
//! +----------------------+-------------------------------------------+
//! ```
//!
//! Encoding materializes the archive contents in a staging directory first,
//! the same tree `run` later extracts into, and zips it in one pass.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use four_schema::{
    CODE_ENTRY, Checksum, Metadata, PackageFormat, SETTINGS_ENTRY, Sha256Hash, WRAPPER_ENTRY,
    build_host_tag,
};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{FourError, Result};
use crate::project::ValidProject;
use crate::reporter::Reporter;

/// Environment a build runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Directory relative `FILE` sources resolve against.
    pub source_root: PathBuf,
    /// Directory the staging tree is created in.
    pub temp_root: PathBuf,
    /// Tag of the machine producing the package.
    pub build_platform: String,
    /// Timestamp recorded in the metadata.
    pub build_time: String,
}

impl BuildContext {
    /// Context for a build happening now, on this machine.
    pub fn new(source_root: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            temp_root: temp_root.into(),
            build_platform: build_host_tag(),
            build_time: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// Result of [`encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPackage {
    pub bytes: Vec<u8>,
    pub format: PackageFormat,
    /// Metadata exactly as stored in the archive.
    pub metadata: Metadata,
    /// `FILE` sources that did not exist and were skipped.
    pub missing_assets: Vec<String>,
}

/// One entry of a package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    pub is_dir: bool,
}

/// Outcome of [`DecodedPackage::verify_checksum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    Verified,
    /// The metadata carries no checksum (an interrupted two-pass write).
    Pending,
    /// The checksum uses an algorithm other than SHA256 and cannot be recomputed.
    Unverifiable,
}

/// A package read back from bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPackage {
    pub format: PackageFormat,
    pub metadata: Metadata,
    pub payload: String,
    /// Every archive entry, in archive order.
    pub entries: Vec<ArchiveEntry>,
    archive: Vec<u8>,
}

/// Launcher script embedded for Windows-family targets.
pub fn wrapper_script(run: &str) -> String {
    format!("@echo off\r\ncd /d \"%~dp0\"\r\n{run} {CODE_ENTRY}\r\n")
}

/// Serialize `project` into package bytes.
///
/// Missing `FILE` sources are reported as warnings and listed in
/// [`EncodedPackage::missing_assets`]; they do not fail the build.
///
/// # Errors
///
/// Returns [`FourError::UnsafePath`] if an asset destination escapes the
/// package root or shadows a reserved entry, and I/O or archive errors from
/// staging and compression.
pub fn encode(
    project: &ValidProject,
    ctx: &BuildContext,
    reporter: &dyn Reporter,
) -> Result<EncodedPackage> {
    fs::create_dir_all(&ctx.temp_root)?;
    let staging = tempfile::Builder::new()
        .prefix("four-build-")
        .tempdir_in(&ctx.temp_root)?;
    let root = staging.path();
    tracing::debug!(staging = %root.display(), project = %project.name, "staging package");

    let mut metadata = Metadata {
        project: project.name.clone(),
        platform: project.platform,
        run: project.run.clone(),
        readme: project.readme.clone(),
        version: project.version.clone(),
        author: project.author.clone(),
        description: project.description.clone(),
        build_time: ctx.build_time.clone(),
        build_platform: ctx.build_platform.clone(),
        checksum: None,
        wrapper: None,
        extra: project.extra.clone(),
    };

    let settings_path = root.join(SETTINGS_ENTRY);
    fs::write(&settings_path, metadata.to_json()?)?;
    fs::write(root.join(CODE_ENTRY), &project.payload)?;

    if project.platform.is_windows_family() {
        fs::write(root.join(WRAPPER_ENTRY), wrapper_script(&project.run))?;
        metadata.wrapper = Some(WRAPPER_ENTRY.to_string());
    }

    for folder in &project.folders {
        fs::create_dir_all(staged_path(root, folder)?)?;
        reporter.step(&format!("Created folder: {folder}"));
    }

    let mut missing_assets = Vec::new();
    for file in &project.files {
        let source = ctx.source_root.join(&file.source);
        if !source.is_file() {
            tracing::warn!(source = %source.display(), "asset source not found, skipping");
            reporter.warning(&format!("Source file not found: {}", file.source));
            missing_assets.push(file.source.clone());
            continue;
        }
        let dest = staged_path(root, &file.dest)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &dest)?;
        reporter.step(&format!("Copied: {} -> {}", file.source, file.dest));
    }

    // Second pass: every other field is final now.
    metadata.checksum = Some(Sha256Hash::compute(project.payload.as_bytes()).into());
    fs::write(&settings_path, metadata.to_json()?)?;

    let format = if metadata.wrapper.is_some() {
        PackageFormat::Wrapped
    } else {
        PackageFormat::Base
    };
    let archive = zip_tree(root)?;
    tracing::debug!(format = %format, archive_bytes = archive.len(), "package encoded");

    Ok(EncodedPackage {
        bytes: format.frame(&archive),
        format,
        metadata,
        missing_assets,
    })
}

/// Resolve a package-relative path inside the staging root.
fn staged_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    let mut clean = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(FourError::UnsafePath {
                    path: relative.to_string(),
                    reason: "escapes the package root",
                });
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(FourError::UnsafePath {
            path: relative.to_string(),
            reason: "is empty",
        });
    }
    if [SETTINGS_ENTRY, CODE_ENTRY, WRAPPER_ENTRY]
        .iter()
        .any(|reserved| clean == Path::new(reserved))
    {
        return Err(FourError::UnsafePath {
            path: relative.to_string(),
            reason: "collides with a reserved package entry",
        });
    }
    Ok(root.join(clean))
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .unix_permissions(mode)
}

#[cfg(unix)]
fn mode_of(path: &Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn mode_of(path: &Path) -> io::Result<u32> {
    Ok(if fs::metadata(path)?.is_dir() { 0o755 } else { 0o644 })
}

/// Zip every entry under `root`, sorted by name so the layout is stable.
fn zip_tree(root: &Path) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(io::Error::other)?;
        let name = entry_name(relative);
        let options = file_options(mode_of(entry.path())?);

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(FourError::ArchiveWrite)?;
        } else {
            tracing::debug!(entry = %name, "adding archive entry");
            writer
                .start_file(name, options)
                .map_err(FourError::ArchiveWrite)?;
            writer.write_all(&fs::read(entry.path())?)?;
        }
    }

    let cursor = writer.finish().map_err(FourError::ArchiveWrite)?;
    Ok(cursor.into_inner())
}

/// Decode package bytes.
///
/// # Errors
///
/// Returns [`FourError::InvalidHeader`] if no magic tag is present,
/// [`FourError::CorruptArchive`] if the zip cannot be read,
/// [`FourError::MissingEntry`] if metadata or payload is absent and
/// [`FourError::CorruptMetadata`] if the metadata is not valid JSON.
pub fn decode(bytes: &[u8]) -> Result<DecodedPackage> {
    let (format, archive) = PackageFormat::split(bytes)?;
    let mut zip = ZipArchive::new(Cursor::new(archive))?;

    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let file = zip.by_index(i)?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            size: file.size(),
            is_dir: file.is_dir(),
        });
    }

    let metadata = Metadata::from_json(&read_entry(&mut zip, SETTINGS_ENTRY)?)?;
    let payload = read_entry(&mut zip, CODE_ENTRY)?;

    Ok(DecodedPackage {
        format,
        metadata,
        payload,
        entries,
        archive: archive.to_vec(),
    })
}

/// Read and decode `path`.
///
/// # Errors
///
/// Returns [`FourError::FileNotFound`] if `path` does not exist, plus every
/// error of [`decode`].
pub fn decode_file(path: &Path) -> Result<DecodedPackage> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FourError::FileNotFound(path.to_path_buf()),
        _ => FourError::Io(e),
    })?;
    decode(&bytes)
}

fn read_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &'static str) -> Result<String> {
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Err(FourError::MissingEntry(name)),
        Err(e) => return Err(e.into()),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| FourError::CorruptArchive(e.into()))?;
    Ok(text)
}

impl DecodedPackage {
    /// Whether the archive contains an entry called `name`.
    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Recompute the payload hash and compare it with the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`FourError::ChecksumMismatch`] if the hashes differ.
    pub fn verify_checksum(&self) -> Result<ChecksumStatus> {
        let Some(stored) = &self.metadata.checksum else {
            tracing::warn!(project = %self.metadata.project, "package has no payload checksum");
            return Ok(ChecksumStatus::Pending);
        };
        let Checksum::Sha256(expected) = stored else {
            tracing::warn!(
                project = %self.metadata.project,
                checksum = %stored,
                "payload checksum is not SHA256, skipping verification"
            );
            return Ok(ChecksumStatus::Unverifiable);
        };
        let actual = Sha256Hash::compute(self.payload.as_bytes());
        if &actual == expected {
            Ok(ChecksumStatus::Verified)
        } else {
            Err(FourError::ChecksumMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    /// Unpack every archive entry under `dest_dir`.
    ///
    /// Entries whose names would land outside `dest_dir` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FourError::CorruptArchive`] or I/O errors.
    pub fn extract_to(&self, dest_dir: &Path) -> Result<()> {
        let mut zip = ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        fs::create_dir_all(dest_dir)?;

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            let Some(relative_path) = file.enclosed_name() else {
                tracing::warn!(entry = %file.name(), "skipping entry outside the package root");
                continue;
            };
            let absolute_path = dest_dir.join(&relative_path);

            if file.is_dir() {
                fs::create_dir_all(&absolute_path)?;
                continue;
            }
            if let Some(parent) = absolute_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&absolute_path)?;
            io::copy(&mut file, &mut outfile)?;

            #[cfg(unix)]
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            }
        }

        Ok(())
    }
}
