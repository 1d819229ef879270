//! Embedded trust-anchor store for TLS clients.
//!
//! This crate holds a compact, serialized bundle of trusted root issuer names
//! and public keys, and supplies the hook a chain-verification algorithm calls
//! to decide whether a chain ends at a trusted root:
//!
//! - Zero-copy parsing and validation of the bundle format ([`Bundle`])
//! - Binary-search lookup by issuer name ([`Bundle::find`])
//! - Signature check of a certificate against an RSA, ECDSA or Ed25519 anchor
//!   key ([`SignatureVerifier`])
//! - The per-certificate verification hook ([`BundleVerifier`])
//! - Attach/detach/replace against a TLS configuration ([`CrtBundle`])
//!
//! Expiry, revocation, key usage and hostname checks belong to the chain
//! walker; flags carrying those defects pass through the hook untouched.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use assay_crt_bundle::{AnchorVerifier, CrtBundle, PlaceholderCaChain, TlsConfig};
//!
//! struct MyTlsConfig {
//!     hook: Option<Arc<dyn AnchorVerifier>>,
//! }
//!
//! impl TlsConfig for MyTlsConfig {
//!     fn set_ca_chain(&mut self, _chain: PlaceholderCaChain) {}
//!     fn set_verify_hook(&mut self, hook: Option<Arc<dyn AnchorVerifier>>) {
//!         self.hook = hook;
//!     }
//! }
//!
//! # fn example() -> Result<(), assay_crt_bundle::BundleError> {
//! let bundle = CrtBundle::from_env();
//! let mut tls = MyTlsConfig { hook: None };
//!
//! // Loads the embedded default bundle unless one was set already.
//! bundle.attach(&mut tls)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ASSAY_CRT_BUNDLE_MAX_CERTS` | Certificate ceiling (default and maximum: 200) |
//! | `ASSAY_CRT_BUNDLE_PATH` | Bundle file loaded by `attach` instead of the embedded default |

pub mod callback;
pub mod config;
pub mod crypto;
pub mod error;
pub mod lifecycle;
mod lookup;
pub mod store;
pub mod verify;

// Re-export main types
pub use callback::{AnchorOutcome, AnchorVerifier, BundleVerifier, VerifyFlags};
pub use config::BundleConfig;
pub use crypto::{
    AnchorKey, CryptoProvider, DigestAlgorithm, EcdsaKey, PkAlgorithm, RustCryptoProvider,
    SignatureAlgorithm,
};
pub use error::{BundleError, BundleResult, ChainVerifyError, StatusCode, VerifyError};
pub use lifecycle::{CrtBundle, PlaceholderCaChain, TlsConfig};
pub use store::{Bundle, CertRecord, BUNDLE_MAX_CERTS, DEFAULT_BUNDLE};
pub use verify::{CertificateView, SignatureVerifier};
