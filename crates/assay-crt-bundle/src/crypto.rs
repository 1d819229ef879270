//! Crypto primitives used for anchor signature checks.
//!
//! [`CryptoProvider`] is the seam: the verifier only parses keys, hashes and
//! verifies through it. [`RustCryptoProvider`] is the default backend: RSA
//! PKCS#1 v1.5, ECDSA on P-256 and P-384, and Ed25519 over SHA-1 and SHA-2
//! digests.
//!
//! RSASSA-PSS signatures are not supported; their OID maps to no
//! [`SignatureAlgorithm`].

use ed25519_dalek::{Signature as Ed25519Signature, VerifyingKey as Ed25519Key};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature as P256Signature, VerifyingKey as P256Key};
use p384::ecdsa::{Signature as P384Signature, VerifyingKey as P384Key};
use pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use spki::der::Decode;
use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::error::VerifyError;

pub const OID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
pub const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
pub const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

pub const OID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub const OID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

const OID_SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const OID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const OID_SHA384_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const OID_SHA512_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
const OID_ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
const OID_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const OID_ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
const OID_ECDSA_WITH_SHA512: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");

// DER DigestInfo headers preceding the hash in PKCS#1 v1.5 signatures.
const SHA1_DIGEST_INFO: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];
const SHA256_DIGEST_INFO: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];
const SHA384_DIGEST_INFO: &[u8] = &[
    0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02, 0x05,
    0x00, 0x04, 0x30,
];
const SHA512_DIGEST_INFO: &[u8] = &[
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, 0x05,
    0x00, 0x04, 0x40,
];

/// Public-key algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PkAlgorithm {
    Rsa,
    Ecdsa,
    Ed25519,
}

/// Digest applied to a certificate's to-be-signed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// Weak; chain walkers flag it as `BAD_MD`.
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    /// No pre-hash; the signature covers the bytes themselves (Ed25519).
    Identity,
}

impl DigestAlgorithm {
    /// Output size in bytes, `None` for [`DigestAlgorithm::Identity`].
    pub fn output_len(self) -> Option<usize> {
        match self {
            Self::Sha1 => Some(20),
            Self::Sha256 => Some(32),
            Self::Sha384 => Some(48),
            Self::Sha512 => Some(64),
            Self::Identity => None,
        }
    }

    fn digest_info_prefix(self) -> Option<&'static [u8]> {
        match self {
            Self::Sha1 => Some(SHA1_DIGEST_INFO),
            Self::Sha256 => Some(SHA256_DIGEST_INFO),
            Self::Sha384 => Some(SHA384_DIGEST_INFO),
            Self::Sha512 => Some(SHA512_DIGEST_INFO),
            Self::Identity => None,
        }
    }
}

/// Signature algorithm a certificate declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureAlgorithm {
    pub key: PkAlgorithm,
    pub digest: DigestAlgorithm,
}

impl SignatureAlgorithm {
    pub const RSA_PKCS1_SHA1: Self = Self::new(PkAlgorithm::Rsa, DigestAlgorithm::Sha1);
    pub const RSA_PKCS1_SHA256: Self = Self::new(PkAlgorithm::Rsa, DigestAlgorithm::Sha256);
    pub const RSA_PKCS1_SHA384: Self = Self::new(PkAlgorithm::Rsa, DigestAlgorithm::Sha384);
    pub const RSA_PKCS1_SHA512: Self = Self::new(PkAlgorithm::Rsa, DigestAlgorithm::Sha512);
    pub const ECDSA_SHA1: Self = Self::new(PkAlgorithm::Ecdsa, DigestAlgorithm::Sha1);
    pub const ECDSA_SHA256: Self = Self::new(PkAlgorithm::Ecdsa, DigestAlgorithm::Sha256);
    pub const ECDSA_SHA384: Self = Self::new(PkAlgorithm::Ecdsa, DigestAlgorithm::Sha384);
    pub const ECDSA_SHA512: Self = Self::new(PkAlgorithm::Ecdsa, DigestAlgorithm::Sha512);
    pub const ED25519: Self = Self::new(PkAlgorithm::Ed25519, DigestAlgorithm::Identity);

    pub const fn new(key: PkAlgorithm, digest: DigestAlgorithm) -> Self {
        Self { key, digest }
    }

    /// Map an X.509 `signatureAlgorithm` OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        const TABLE: [(ObjectIdentifier, SignatureAlgorithm); 9] = [
            (OID_SHA1_WITH_RSA, SignatureAlgorithm::RSA_PKCS1_SHA1),
            (OID_SHA256_WITH_RSA, SignatureAlgorithm::RSA_PKCS1_SHA256),
            (OID_SHA384_WITH_RSA, SignatureAlgorithm::RSA_PKCS1_SHA384),
            (OID_SHA512_WITH_RSA, SignatureAlgorithm::RSA_PKCS1_SHA512),
            (OID_ECDSA_WITH_SHA1, SignatureAlgorithm::ECDSA_SHA1),
            (OID_ECDSA_WITH_SHA256, SignatureAlgorithm::ECDSA_SHA256),
            (OID_ECDSA_WITH_SHA384, SignatureAlgorithm::ECDSA_SHA384),
            (OID_ECDSA_WITH_SHA512, SignatureAlgorithm::ECDSA_SHA512),
            (OID_ED25519, SignatureAlgorithm::ED25519),
        ];

        TABLE
            .iter()
            .find(|(candidate, _)| candidate == oid)
            .map(|(_, alg)| *alg)
    }
}

/// Key parsing, hashing and signature checks.
pub trait CryptoProvider: Send + Sync {
    type PublicKey;

    /// Parse a DER SubjectPublicKeyInfo.
    fn parse_public_key(&self, spki_der: &[u8]) -> Result<Self::PublicKey, VerifyError>;

    /// Algorithm family of a parsed key.
    fn key_algorithm(&self, key: &Self::PublicKey) -> PkAlgorithm;

    /// Whether `key` can possibly verify signatures of family `alg`.
    fn can_do(&self, key: &Self::PublicKey, alg: PkAlgorithm) -> bool {
        self.key_algorithm(key) == alg
    }

    fn digest(&self, alg: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, VerifyError>;

    /// Verify `signature` over `digest` (as produced by [`CryptoProvider::digest`]).
    fn verify(
        &self,
        key: &Self::PublicKey,
        alg: SignatureAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError>;
}

/// Parsed anchor key for [`RustCryptoProvider`].
#[derive(Debug, Clone)]
pub enum AnchorKey {
    Rsa(RsaPublicKey),
    Ecdsa(EcdsaKey),
    Ed25519(Ed25519Key),
}

/// ECDSA anchor key on a supported named curve.
#[derive(Debug, Clone)]
pub enum EcdsaKey {
    P256(P256Key),
    P384(P384Key),
}

impl EcdsaKey {
    fn from_spki(
        spki: &SubjectPublicKeyInfoRef<'_>,
        spki_der: &[u8],
    ) -> Result<Self, VerifyError> {
        let curve = spki
            .algorithm
            .parameters_oid()
            .map_err(|e| VerifyError::KeyParse {
                reason: format!("missing EC curve parameter: {}", e),
            })?;

        let key = if curve == OID_SECP256R1 {
            P256Key::from_public_key_der(spki_der).map(Self::P256)
        } else if curve == OID_SECP384R1 {
            P384Key::from_public_key_der(spki_der).map(Self::P384)
        } else {
            return Err(VerifyError::KeyParse {
                reason: format!("unsupported EC curve {}", curve),
            });
        };

        key.map_err(|e| VerifyError::KeyParse {
            reason: format!("invalid EC public key: {}", e),
        })
    }

    /// Check a DER-encoded ECDSA signature over a prehashed message.
    fn verify_der(&self, prehash: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        let result = match self {
            Self::P256(key) => P256Signature::from_der(signature)
                .and_then(|sig| key.verify_prehash(prehash, &sig)),
            Self::P384(key) => P384Signature::from_der(signature)
                .and_then(|sig| key.verify_prehash(prehash, &sig)),
        };
        result.map_err(|_| VerifyError::SignatureInvalid {
            reason: "ecdsa verification failed".to_string(),
        })
    }
}

/// Default provider backed by the RustCrypto crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    type PublicKey = AnchorKey;

    fn parse_public_key(&self, spki_der: &[u8]) -> Result<AnchorKey, VerifyError> {
        let spki = SubjectPublicKeyInfoRef::from_der(spki_der).map_err(|e| VerifyError::KeyParse {
            reason: format!("invalid SubjectPublicKeyInfo: {}", e),
        })?;

        let oid = spki.algorithm.oid;
        if oid == OID_RSA_ENCRYPTION {
            RsaPublicKey::from_public_key_der(spki_der)
                .map(AnchorKey::Rsa)
                .map_err(|e| VerifyError::KeyParse {
                    reason: format!("invalid RSA public key: {}", e),
                })
        } else if oid == OID_ED25519 {
            Ed25519Key::from_public_key_der(spki_der)
                .map(AnchorKey::Ed25519)
                .map_err(|e| VerifyError::KeyParse {
                    reason: format!("invalid Ed25519 public key: {}", e),
                })
        } else if oid == OID_EC_PUBLIC_KEY {
            EcdsaKey::from_spki(&spki, spki_der).map(AnchorKey::Ecdsa)
        } else {
            Err(VerifyError::KeyParse {
                reason: format!("unknown public key algorithm {}", oid),
            })
        }
    }

    fn key_algorithm(&self, key: &AnchorKey) -> PkAlgorithm {
        match key {
            AnchorKey::Rsa(_) => PkAlgorithm::Rsa,
            AnchorKey::Ecdsa(_) => PkAlgorithm::Ecdsa,
            AnchorKey::Ed25519(_) => PkAlgorithm::Ed25519,
        }
    }

    fn digest(&self, alg: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, VerifyError> {
        Ok(match alg {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
            DigestAlgorithm::Identity => data.to_vec(),
        })
    }

    fn verify(
        &self,
        key: &AnchorKey,
        alg: SignatureAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError> {
        match key {
            AnchorKey::Rsa(key) => {
                let prefix = alg
                    .digest
                    .digest_info_prefix()
                    .filter(|_| alg.key == PkAlgorithm::Rsa)
                    .ok_or_else(|| VerifyError::SignatureInvalid {
                        reason: format!("unsupported RSA signature algorithm {:?}", alg),
                    })?;
                if Some(digest.len()) != alg.digest.output_len() {
                    return Err(VerifyError::SignatureInvalid {
                        reason: format!("digest length {} for {:?}", digest.len(), alg.digest),
                    });
                }

                let mut digest_info = Vec::with_capacity(prefix.len() + digest.len());
                digest_info.extend_from_slice(prefix);
                digest_info.extend_from_slice(digest);

                key.verify(Pkcs1v15Sign::new_unprefixed(), &digest_info, signature)
                    .map_err(|_| VerifyError::SignatureInvalid {
                        reason: "rsa pkcs1v15 verification failed".to_string(),
                    })
            }
            AnchorKey::Ecdsa(key) => {
                if alg.key != PkAlgorithm::Ecdsa || Some(digest.len()) != alg.digest.output_len() {
                    return Err(VerifyError::SignatureInvalid {
                        reason: format!("unsupported ECDSA signature algorithm {:?}", alg),
                    });
                }
                key.verify_der(digest, signature)
            }
            AnchorKey::Ed25519(key) => {
                if alg != SignatureAlgorithm::ED25519 {
                    return Err(VerifyError::SignatureInvalid {
                        reason: format!("unsupported Ed25519 signature algorithm {:?}", alg),
                    });
                }
                let signature = Ed25519Signature::from_slice(signature).map_err(|e| {
                    VerifyError::SignatureInvalid {
                        reason: format!("invalid signature bytes: {}", e),
                    }
                })?;
                key.verify_strict(digest, &signature)
                    .map_err(|_| VerifyError::SignatureInvalid {
                        reason: "ed25519 verification failed".to_string(),
                    })
            }
        }
    }
}
