//! Check that a bundled anchor's key signed a certificate.

use std::sync::Arc;

use crate::crypto::{CryptoProvider, RustCryptoProvider, SignatureAlgorithm};
use crate::error::VerifyError;
use crate::store::CertRecord;

/// The parts of a chain certificate needed for an anchor check.
///
/// Borrowed from the chain walker's parsed certificate; nothing is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateView<'a> {
    /// Raw DER encoding of the issuer name.
    pub issuer_raw: &'a [u8],
    /// Raw DER `tbsCertificate`.
    pub tbs: &'a [u8],
    pub signature: &'a [u8],
    pub signature_algorithm: SignatureAlgorithm,
}

/// Verifies child certificates against anchor keys through a [`CryptoProvider`].
pub struct SignatureVerifier<P = RustCryptoProvider> {
    provider: Arc<P>,
}

impl<P> Clone for SignatureVerifier<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl Default for SignatureVerifier<RustCryptoProvider> {
    fn default() -> Self {
        Self::new(RustCryptoProvider)
    }
}

impl<P: CryptoProvider> SignatureVerifier<P> {
    pub fn new(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    pub fn from_arc(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Verify that `anchor`'s public key produced `child`'s signature.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the anchor's SubjectPublicKeyInfo
    /// 2. Reject early if the key family cannot produce the child's signature
    /// 3. Digest the child's to-be-signed bytes with its declared digest
    /// 4. Verify the child's signature over that digest
    pub fn verify(
        &self,
        child: &CertificateView<'_>,
        anchor: &CertRecord<'_>,
    ) -> Result<(), VerifyError> {
        let key = self.provider.parse_public_key(anchor.public_key)?;

        let alg = child.signature_algorithm;
        if !self.provider.can_do(&key, alg.key) {
            return Err(VerifyError::AlgorithmMismatch {
                key: self.provider.key_algorithm(&key),
                signature: alg.key,
            });
        }

        let digest = self.provider.digest(alg.digest, child.tbs)?;

        self.provider.verify(&key, alg, &digest, child.signature)
    }
}
