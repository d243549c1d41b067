//! Package header formats.
//!
//! A package is a zip archive prefixed with a fixed-length magic tag. Two
//! tags exist; the wrapped one is a strict extension of the base one, so the
//! longer tag must be tried first.

/// Header of a plain package (8 bytes).
pub const BASE_MAGIC: &[u8; 8] = b"LOVE-APP";

/// Header of a package that embeds a platform launcher script (12 bytes).
pub const WRAPPED_MAGIC: &[u8; 12] = b"LOVE-APP-WIN";

/// Which header variant a package carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFormat {
    /// `LOVE-APP`
    Base,
    /// `LOVE-APP-WIN`
    Wrapped,
}

/// The leading bytes matched no known header.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid .app file (incorrect header)")]
pub struct UnknownHeader;

impl PackageFormat {
    /// Candidates in dispatch order, longest header first.
    const DISPATCH: [PackageFormat; 2] = [Self::Wrapped, Self::Base];

    /// The magic bytes written in front of the archive.
    pub fn magic(self) -> &'static [u8] {
        match self {
            Self::Base => BASE_MAGIC,
            Self::Wrapped => WRAPPED_MAGIC,
        }
    }

    /// Length of the header in bytes.
    pub fn header_len(self) -> usize {
        self.magic().len()
    }

    /// Short human-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Wrapped => "wrapped",
        }
    }

    /// Split package bytes into their format and the archive that follows
    /// the header.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownHeader`] if neither magic tag prefixes `bytes`.
    pub fn split(bytes: &[u8]) -> Result<(Self, &[u8]), UnknownHeader> {
        Self::DISPATCH
            .into_iter()
            .find_map(|format| {
                bytes
                    .strip_prefix(format.magic())
                    .map(|archive| (format, archive))
            })
            .ok_or(UnknownHeader)
    }

    /// Prefix `archive` with this format's header.
    pub fn frame(self, archive: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_len() + archive.len());
        out.extend_from_slice(self.magic());
        out.extend_from_slice(archive);
        out
    }
}

impl std::fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_header_is_not_mistaken_for_base() {
        let bytes = PackageFormat::Wrapped.frame(b"PK\x03\x04rest");
        let (format, archive) = PackageFormat::split(&bytes).unwrap();
        assert_eq!(format, PackageFormat::Wrapped);
        assert_eq!(archive, b"PK\x03\x04rest");
    }

    #[test]
    fn base_header_skips_eight_bytes() {
        let bytes = PackageFormat::Base.frame(b"PK");
        let (format, archive) = PackageFormat::split(&bytes).unwrap();
        assert_eq!(format, PackageFormat::Base);
        assert_eq!(format.header_len(), 8);
        assert_eq!(archive, b"PK");
    }

    #[test]
    fn unknown_or_truncated_headers_are_rejected() {
        assert_eq!(PackageFormat::split(b"PK\x03\x04"), Err(UnknownHeader));
        assert_eq!(PackageFormat::split(b"LOVE-AP"), Err(UnknownHeader));
        assert_eq!(PackageFormat::split(b""), Err(UnknownHeader));
    }

    #[test]
    fn header_alone_yields_empty_archive() {
        let (format, archive) = PackageFormat::split(BASE_MAGIC).unwrap();
        assert_eq!(format, PackageFormat::Base);
        assert!(archive.is_empty());
    }
}
