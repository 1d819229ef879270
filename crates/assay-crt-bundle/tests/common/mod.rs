//! Shared fixtures for bundle integration tests.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use assay_crt_bundle::{
    AnchorVerifier, CertificateView, DigestAlgorithm, PlaceholderCaChain, SignatureAlgorithm,
    TlsConfig,
};
use ed25519_dalek::{Signer, SigningKey};
use p256::ecdsa::signature::hazmat::PrehashSigner;
use pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384};

const SHA1_DIGEST_INFO: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];
const SHA256_DIGEST_INFO: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("assay_crt_bundle=debug")
        .try_init();
}

/// DER-style subject name: SEQUENCE header followed by `cn`.
pub fn der_name(cn: &str) -> Vec<u8> {
    let mut name = vec![0x30, cn.len() as u8];
    name.extend_from_slice(cn.as_bytes());
    name
}

/// Serialize records in the bundle wire format, sorting them by name.
pub fn encode_bundle(records: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = (sorted.len() as u16).to_be_bytes().to_vec();
    for (name, key) in &sorted {
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(&(key.len() as u16).to_be_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(key);
    }
    out.resize(out.len().max(6), 0);
    out
}

fn prehash(alg: DigestAlgorithm, tbs: &[u8]) -> Vec<u8> {
    match alg {
        DigestAlgorithm::Sha1 => Sha1::digest(tbs).to_vec(),
        DigestAlgorithm::Sha256 => Sha256::digest(tbs).to_vec(),
        DigestAlgorithm::Sha384 => Sha384::digest(tbs).to_vec(),
        other => panic!("no fixture digest for {other:?}"),
    }
}

fn digest_info(alg: DigestAlgorithm) -> &'static [u8] {
    match alg {
        DigestAlgorithm::Sha1 => SHA1_DIGEST_INFO,
        DigestAlgorithm::Sha256 => SHA256_DIGEST_INFO,
        other => panic!("no fixture DigestInfo for {other:?}"),
    }
}

/// A root CA able to sign child certificates.
pub enum TestRoot {
    Ed25519 { name: Vec<u8>, key: SigningKey },
    Rsa { name: Vec<u8>, key: RsaPrivateKey },
    P256 { name: Vec<u8>, key: p256::ecdsa::SigningKey },
    P384 { name: Vec<u8>, key: p384::ecdsa::SigningKey },
}

impl TestRoot {
    pub fn ed25519(cn: &str) -> Self {
        Self::Ed25519 {
            name: der_name(cn),
            key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// RSA root sharing one generated key across the test binary.
    pub fn rsa(cn: &str) -> Self {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        let key = KEY
            .get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
            .clone();
        Self::Rsa {
            name: der_name(cn),
            key,
        }
    }

    pub fn p256(cn: &str) -> Self {
        Self::P256 {
            name: der_name(cn),
            key: p256::ecdsa::SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn p384(cn: &str) -> Self {
        Self::P384 {
            name: der_name(cn),
            key: p384::ecdsa::SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn name(&self) -> &[u8] {
        match self {
            Self::Ed25519 { name, .. }
            | Self::Rsa { name, .. }
            | Self::P256 { name, .. }
            | Self::P384 { name, .. } => name,
        }
    }

    pub fn spki(&self) -> Vec<u8> {
        match self {
            Self::Ed25519 { key, .. } => key.verifying_key().to_public_key_der(),
            Self::Rsa { key, .. } => key.to_public_key().to_public_key_der(),
            Self::P256 { key, .. } => key.verifying_key().to_public_key_der(),
            Self::P384 { key, .. } => key.verifying_key().to_public_key_der(),
        }
        .unwrap()
        .as_bytes()
        .to_vec()
    }

    pub fn record(&self) -> (Vec<u8>, Vec<u8>) {
        (self.name().to_vec(), self.spki())
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::Ed25519 { .. } => SignatureAlgorithm::ED25519,
            Self::Rsa { .. } => SignatureAlgorithm::RSA_PKCS1_SHA256,
            Self::P256 { .. } => SignatureAlgorithm::ECDSA_SHA256,
            Self::P384 { .. } => SignatureAlgorithm::ECDSA_SHA384,
        }
    }

    /// Issue a child certificate over `tbs` with the root's usual algorithm.
    pub fn issue(&self, tbs: &[u8]) -> TestCert {
        self.issue_with(tbs, self.algorithm())
    }

    /// Issue a child certificate signed with `algorithm`'s digest.
    pub fn issue_with(&self, tbs: &[u8], algorithm: SignatureAlgorithm) -> TestCert {
        let signature = match self {
            Self::Ed25519 { key, .. } => key.sign(tbs).to_bytes().to_vec(),
            Self::Rsa { key, .. } => {
                let mut message = digest_info(algorithm.digest).to_vec();
                message.extend_from_slice(&prehash(algorithm.digest, tbs));
                key.sign(Pkcs1v15Sign::new_unprefixed(), &message).unwrap()
            }
            Self::P256 { key, .. } => {
                let signature: p256::ecdsa::Signature =
                    key.sign_prehash(&prehash(algorithm.digest, tbs)).unwrap();
                signature.to_der().as_bytes().to_vec()
            }
            Self::P384 { key, .. } => {
                let signature: p384::ecdsa::Signature =
                    key.sign_prehash(&prehash(algorithm.digest, tbs)).unwrap();
                signature.to_der().as_bytes().to_vec()
            }
        };

        TestCert {
            issuer: self.name().to_vec(),
            tbs: tbs.to_vec(),
            signature,
            algorithm,
        }
    }
}

/// Owned certificate parts; [`TestCert::view`] borrows them for the hook.
#[derive(Debug, Clone)]
pub struct TestCert {
    pub issuer: Vec<u8>,
    pub tbs: Vec<u8>,
    pub signature: Vec<u8>,
    pub algorithm: SignatureAlgorithm,
}

impl TestCert {
    pub fn view(&self) -> CertificateView<'_> {
        CertificateView {
            issuer_raw: &self.issuer,
            tbs: &self.tbs,
            signature: &self.signature,
            signature_algorithm: self.algorithm,
        }
    }
}

/// TLS configuration double recording what was installed.
#[derive(Default)]
pub struct MockTlsConfig {
    pub ca_chain: Option<PlaceholderCaChain>,
    pub hook: Option<Arc<dyn AnchorVerifier>>,
}

impl TlsConfig for MockTlsConfig {
    fn set_ca_chain(&mut self, chain: PlaceholderCaChain) {
        self.ca_chain = Some(chain);
    }

    fn set_verify_hook(&mut self, hook: Option<Arc<dyn AnchorVerifier>>) {
        self.hook = hook;
    }
}

impl MockTlsConfig {
    pub fn hook(&self) -> Arc<dyn AnchorVerifier> {
        Arc::clone(self.hook.as_ref().expect("verify hook installed"))
    }
}
