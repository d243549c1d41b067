use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Newtype for a SHA256 hash string (64 lowercase hex characters).
///
/// The digest `four` computes for payloads. Deserialization validates the
/// shape so a tampered `settings.json` cannot smuggle an arbitrary string
/// into the checksum comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Compute the SHA256 digest of `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Create a validated `Sha256Hash` (64 hex characters).
    ///
    /// # Errors
    ///
    /// Returns an error string if `s` is not exactly 64 ASCII hex characters.
    pub fn validated(s: &str) -> Result<Self, String> {
        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(format!(
                "Invalid SHA256 hash: expected 64 hex chars, got '{s}'"
            ))
        }
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::validated(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Payload checksum as stored in package metadata.
///
/// Packages built by `four` carry SHA256. Other tools wrote shorter hex
/// digests (MD5 in particular); those still decode but cannot be verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Checksum {
    Sha256(Sha256Hash),
    /// Lowercase hex digest of an algorithm `four` does not compute.
    Other(String),
}

impl Checksum {
    /// Classify a hex digest by its length.
    ///
    /// # Errors
    ///
    /// Returns an error string if `s` is empty or not entirely ASCII hex.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid checksum: expected hex digits, got '{s}'"));
        }
        if s.len() == 64 {
            Sha256Hash::validated(s).map(Self::Sha256)
        } else {
            Ok(Self::Other(s.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Sha256(hash) => hash.as_str(),
            Self::Other(hex) => hex,
        }
    }

    /// The SHA256 digest, if that is what this checksum holds.
    pub fn as_sha256(&self) -> Option<&Sha256Hash> {
        match self {
            Self::Sha256(hash) => Some(hash),
            Self::Other(_) => None,
        }
    }
}

impl From<Sha256Hash> for Checksum {
    fn from(hash: Sha256Hash) -> Self {
        Self::Sha256(hash)
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
