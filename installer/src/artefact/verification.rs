//! Checksum model and verification policy for downloaded archives.
//!
//! Repositories such as Artifactory advertise a digest of the served file in
//! `X-Checksum-*` response headers. The installer hashes the payload as it
//! streams past and compares the result with the advertised digest before
//! anything is extracted. A missing header means "unverified", not
//! "invalid", unless the [`VerificationPolicy`] requires a checksum.

use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;

/// Response header carrying the SHA-256 digest of the body.
pub const SHA256_HEADER: &str = "X-Checksum-Sha256";

/// Response header carrying the MD5 digest of the body.
pub const MD5_HEADER: &str = "X-Checksum-Md5";

/// Digest algorithms the installer can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// MD5, as advertised by `X-Checksum-Md5`.
    Md5,
    /// SHA-256, as advertised by `X-Checksum-Sha256`.
    Sha256,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// A digest declared by the server for the archive it is serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedChecksum {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl ExpectedChecksum {
    /// Create an expected checksum, normalising the digest to lowercase.
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm, hex: &str) -> Self {
        Self {
            algorithm,
            hex: hex.trim().to_ascii_lowercase(),
        }
    }

    /// Choose the strongest declared digest, preferring SHA-256 over MD5.
    ///
    /// Blank header values are treated as absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use sm2_installer::artefact::verification::{ChecksumAlgorithm, ExpectedChecksum};
    ///
    /// let expected = ExpectedChecksum::from_declared(None, Some("D41D8CD98F00B204E9800998ECF8427E"))
    ///     .expect("md5 declared");
    /// assert_eq!(expected.algorithm(), ChecksumAlgorithm::Md5);
    /// assert_eq!(expected.hex(), "d41d8cd98f00b204e9800998ecf8427e");
    /// ```
    #[must_use]
    pub fn from_declared(sha256: Option<&str>, md5: Option<&str>) -> Option<Self> {
        declared(sha256)
            .map(|hex| Self::new(ChecksumAlgorithm::Sha256, hex))
            .or_else(|| declared(md5).map(|hex| Self::new(ChecksumAlgorithm::Md5, hex)))
    }

    /// The algorithm the digest was computed with.
    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// The lowercase hex digest.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Return whether `actual` (hex, any case) matches this digest.
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        self.hex.eq_ignore_ascii_case(actual)
    }
}

fn declared(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Display for ExpectedChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Incremental digest over a byte stream.
#[derive(Debug, Clone)]
pub enum Checksummer {
    /// MD5 state.
    Md5(Md5),
    /// SHA-256 state.
    Sha256(Sha256),
}

impl Checksummer {
    /// Start a digest for `algorithm`.
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Md5 => Self::Md5(Md5::new()),
            ChecksumAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    /// The algorithm being computed.
    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        match self {
            Self::Md5(_) => ChecksumAlgorithm::Md5,
            Self::Sha256(_) => ChecksumAlgorithm::Sha256,
        }
    }

    /// Feed `bytes` into the digest.
    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Md5(hasher) => hasher.update(bytes),
            Self::Sha256(hasher) => hasher.update(bytes),
        }
    }

    /// Finish the digest and return it as lowercase hex.
    #[must_use]
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Md5(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha256(hasher) => format!("{:x}", hasher.finalize()),
        }
    }
}

/// The digest of a fully consumed payload and whether it was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumOutcome {
    /// The computed digest matched the declared one.
    Verified {
        /// The algorithm used.
        algorithm: ChecksumAlgorithm,
        /// The matching hex digest.
        digest: String,
    },
    /// No digest was declared, so nothing was compared.
    Unverified {
        /// The algorithm used for the informational digest.
        algorithm: ChecksumAlgorithm,
        /// The computed hex digest.
        digest: String,
    },
}

impl ChecksumOutcome {
    /// Return whether the payload was checked against a declared digest.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// The computed hex digest.
    #[must_use]
    pub fn digest(&self) -> &str {
        match self {
            Self::Verified { digest, .. } | Self::Unverified { digest, .. } => digest,
        }
    }
}

/// Policy governing how a downloaded archive is verified before use.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::verification::VerificationPolicy;
///
/// let policy = VerificationPolicy::default();
/// assert!(!policy.require_checksum());
/// assert!(VerificationPolicy::strict().require_checksum());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationPolicy {
    require_checksum: bool,
}

impl VerificationPolicy {
    /// A policy that rejects archives served without a checksum header.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            require_checksum: true,
        }
    }

    /// Build a policy from a configuration flag.
    #[must_use]
    pub fn with_required_checksum(require_checksum: bool) -> Self {
        Self { require_checksum }
    }

    /// Return whether a declared checksum is mandatory.
    #[must_use]
    pub fn require_checksum(&self) -> bool {
        self.require_checksum
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.require_checksum {
            write!(f, "checksum verification required")
        } else {
            write!(f, "checksum verification when declared")
        }
    }
}
