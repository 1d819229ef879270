//! Chain-verification hook resolving trust-anchor status from the bundle.
//!
//! The chain walker validates every link up to the last certificate it holds
//! and calls the hook once per certificate. A certificate whose only defect
//! is "not trusted" is the first untrusted link; the hook checks that it was
//! signed by a bundled root and, if so, clears its flags.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::sync::{Arc, PoisonError, RwLock};

use crate::crypto::{CryptoProvider, RustCryptoProvider};
use crate::error::{ChainVerifyError, VerifyError};
use crate::store::Bundle;
use crate::verify::{CertificateView, SignatureVerifier};

/// Active bundle shared between a [`CrtBundle`] and its installed hooks.
///
/// [`CrtBundle`]: crate::lifecycle::CrtBundle
pub(crate) type BundleSlot = Arc<RwLock<Option<Bundle>>>;

/// Per-certificate defect bits accumulated by chain verification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VerifyFlags(u32);

impl VerifyFlags {
    pub const EXPIRED: Self = Self(0x01);
    pub const REVOKED: Self = Self(0x02);
    pub const CN_MISMATCH: Self = Self(0x04);
    pub const NOT_TRUSTED: Self = Self(0x08);
    pub const MISSING: Self = Self(0x40);
    pub const SKIP_VERIFY: Self = Self(0x80);
    pub const OTHER: Self = Self(0x0100);
    pub const FUTURE: Self = Self(0x0200);
    pub const KEY_USAGE: Self = Self(0x0800);
    pub const EXT_KEY_USAGE: Self = Self(0x1000);
    pub const NS_CERT_TYPE: Self = Self(0x2000);
    pub const BAD_MD: Self = Self(0x4000);
    pub const BAD_PK: Self = Self(0x8000);
    pub const BAD_KEY: Self = Self(0x01_0000);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for VerifyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for VerifyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for VerifyFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for VerifyFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for VerifyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyFlags({:#x})", self.0)
    }
}

/// What the hook did with a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// Certificate carries defects other than "not trusted"; flags untouched.
    Skipped,
    /// Certificate is signed by a bundled anchor; flags cleared.
    Trusted,
}

/// Hook the chain-verification algorithm invokes once per certificate.
pub trait AnchorVerifier: Send + Sync {
    /// `depth` is the certificate's position in the chain (0 = leaf).
    fn verify_anchor(
        &self,
        cert: &CertificateView<'_>,
        depth: usize,
        flags: &mut VerifyFlags,
    ) -> Result<AnchorOutcome, ChainVerifyError>;
}

/// [`AnchorVerifier`] backed by the active bundle.
pub struct BundleVerifier<P = RustCryptoProvider> {
    slot: BundleSlot,
    verifier: SignatureVerifier<P>,
}

impl<P> Clone for BundleVerifier<P> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            verifier: self.verifier.clone(),
        }
    }
}

impl<P: CryptoProvider> BundleVerifier<P> {
    pub(crate) fn new(slot: BundleSlot, verifier: SignatureVerifier<P>) -> Self {
        Self { slot, verifier }
    }

    fn check(&self, cert: &CertificateView<'_>) -> Result<(), VerifyError> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        let bundle = guard.as_ref().ok_or(VerifyError::NoActiveBundle)?;
        tracing::debug!(count = bundle.len(), "certificates in bundle");

        let anchor = bundle.find(cert.issuer_raw).ok_or(VerifyError::NoMatch)?;
        self.verifier.verify(cert, &anchor)
    }
}

impl<P: CryptoProvider> AnchorVerifier for BundleVerifier<P> {
    fn verify_anchor(
        &self,
        cert: &CertificateView<'_>,
        depth: usize,
        flags: &mut VerifyFlags,
    ) -> Result<AnchorOutcome, ChainVerifyError> {
        // A weak digest is acceptable once the signer is a trusted root.
        let filtered = flags.without(VerifyFlags::BAD_MD);
        if filtered != VerifyFlags::NOT_TRUSTED {
            return Ok(AnchorOutcome::Skipped);
        }

        match self.check(cert) {
            Ok(()) => {
                tracing::info!(depth, "certificate validated against bundle");
                *flags = VerifyFlags::empty();
                Ok(AnchorOutcome::Trusted)
            }
            Err(e) => {
                tracing::error!(depth, error = %e, "failed to verify certificate");
                Err(e.into())
            }
        }
    }
}
