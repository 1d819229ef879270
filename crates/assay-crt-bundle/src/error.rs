//! Error types for bundle loading and anchor verification.

use std::path::PathBuf;

use crate::crypto::{DigestAlgorithm, PkAlgorithm};

/// Errors raised while parsing or installing a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Truncated, overflowing or otherwise malformed bundle bytes.
    #[error("invalid certificate bundle: {reason}")]
    InvalidFormat { reason: String },

    /// Declared certificate count exceeds the configured ceiling.
    #[error("certificate bundle holds {count} certificates, maximum is {max}")]
    TooManyCertificates { count: usize, max: usize },

    /// The record offset table could not be allocated.
    #[error("unable to allocate offset table for {count} certificates")]
    AllocationFailure { count: usize },

    /// Bundle file could not be read.
    #[error("failed to read certificate bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BundleError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Status code reported to the host application.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidFormat { .. } | Self::Io { .. } => StatusCode::InvalidArgument,
            Self::TooManyCertificates { .. } => StatusCode::TooLarge,
            Self::AllocationFailure { .. } => StatusCode::OutOfMemory,
        }
    }
}

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;

/// Errors raised while checking a certificate against a bundled anchor.
///
/// These never cross the chain-verification hook; [`BundleVerifier`] logs
/// them and reports [`ChainVerifyError::Fatal`] instead.
///
/// [`BundleVerifier`]: crate::callback::BundleVerifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("public key parse failed: {reason}")]
    KeyParse { reason: String },

    #[error("anchor key is {key:?}, certificate is signed with {signature:?}")]
    AlgorithmMismatch {
        key: PkAlgorithm,
        signature: PkAlgorithm,
    },

    /// Raised by providers whose hash backend can fail; [`RustCryptoProvider`]
    /// hashes in memory and never does.
    ///
    /// [`RustCryptoProvider`]: crate::crypto::RustCryptoProvider
    #[error("digest {algorithm:?} failed: {reason}")]
    Digest {
        algorithm: DigestAlgorithm,
        reason: String,
    },

    #[error("signature verification failed: {reason}")]
    SignatureInvalid { reason: String },

    #[error("no certificates in bundle")]
    NoActiveBundle,

    #[error("issuer not found in bundle")]
    NoMatch,
}

/// Failure reported back to the chain-verification algorithm.
///
/// Deliberately coarse: the cause is logged, never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChainVerifyError {
    #[error("fatal error during certificate verification")]
    Fatal,
}

impl From<VerifyError> for ChainVerifyError {
    fn from(_: VerifyError) -> Self {
        Self::Fatal
    }
}

/// Host-facing status of `attach`/`set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    InvalidArgument,
    TooLarge,
    OutOfMemory,
}

const EINVAL: i32 = 22;
const E2BIG: i32 = 7;
const ENOMEM: i32 = 12;

impl StatusCode {
    /// Negative POSIX errno, `0` for [`StatusCode::Ok`].
    pub fn errno(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::InvalidArgument => -EINVAL,
            Self::TooLarge => -E2BIG,
            Self::OutOfMemory => -ENOMEM,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl<T> From<&BundleResult<T>> for StatusCode {
    fn from(result: &BundleResult<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => e.status_code(),
        }
    }
}
