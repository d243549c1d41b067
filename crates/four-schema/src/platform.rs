/// Target platform a package is built for.
///
/// `four` distinguishes Linux from the Windows family. The Windows variants
/// narrow the target to a release but are all satisfied by any Windows host.
///
/// # Example
///
/// ```
/// use four_schema::Platform;
///
/// let target: Platform = "windows-11".parse().unwrap();
/// assert!(target.is_windows_family());
/// assert!(!target.accepts(Platform::Linux));
/// assert!(Platform::All.accepts(Platform::Linux));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Platform {
    /// Linux (and other Unix hosts, which run packages the same way).
    #[serde(rename = "linux")]
    Linux,
    /// Any Windows release.
    #[serde(rename = "windows")]
    Windows,
    /// Windows 10.
    #[serde(rename = "windows-10")]
    Windows10,
    /// Windows 11.
    #[serde(rename = "windows-11")]
    Windows11,
    /// Runs anywhere.
    #[serde(rename = "all")]
    All,
}

/// Error returned when a string names no known platform.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Platform '{0}' is not valid. Use: linux, windows, windows-10, windows-11, all")]
pub struct PlatformError(pub String);

impl Platform {
    /// Every accepted platform, in the order they are documented.
    pub const ALL: [Platform; 5] = [
        Self::Linux,
        Self::Windows,
        Self::Windows10,
        Self::Windows11,
        Self::All,
    ];

    /// The platform family of the running host.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Canonical descriptor spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Windows10 => "windows-10",
            Self::Windows11 => "windows-11",
            Self::All => "all",
        }
    }

    /// True for `windows`, `windows-10` and `windows-11`.
    pub fn is_windows_family(&self) -> bool {
        matches!(self, Self::Windows | Self::Windows10 | Self::Windows11)
    }

    /// Whether a package targeting `self` may run on `host`.
    pub fn accepts(&self, host: Platform) -> bool {
        match self {
            Self::All => true,
            Self::Linux => !host.is_windows_family(),
            Self::Windows | Self::Windows10 | Self::Windows11 => {
                host.is_windows_family() || host == Self::All
            }
        }
    }
}

/// Tag describing the machine a package was built on, e.g. `linux-x86_64`.
pub fn build_host_tag() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            "windows-10" => Ok(Self::Windows10),
            "windows-11" => Ok(Self::Windows11),
            "all" => Ok(Self::All),
            _ => Err(PlatformError(s.to_string())),
        }
    }
}
