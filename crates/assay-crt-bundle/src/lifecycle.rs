//! Binding a bundle and its verification hook to a TLS configuration.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use bytes::Bytes;

use crate::callback::{AnchorVerifier, BundleSlot, BundleVerifier};
use crate::config::BundleConfig;
use crate::crypto::{CryptoProvider, RustCryptoProvider};
use crate::error::{BundleError, BundleResult};
use crate::store::{Bundle, DEFAULT_BUNDLE};
use crate::verify::SignatureVerifier;

/// Empty trust-anchor list installed alongside the hook.
///
/// TLS stacks only invoke a custom verification hook when a CA chain is
/// configured; this satisfies that check without adding any anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceholderCaChain;

/// The TLS configuration surface the bundle is attached to.
pub trait TlsConfig {
    fn set_ca_chain(&mut self, chain: PlaceholderCaChain);

    /// Install or, with `None`, remove the chain-verification hook.
    fn set_verify_hook(&mut self, hook: Option<Arc<dyn AnchorVerifier>>);
}

/// Trust-anchor bundle context.
///
/// Owns the single active [`Bundle`] and hands out hooks that read it, so a
/// [`CrtBundle::set`] after [`CrtBundle::attach`] is seen by later handshakes.
///
/// Callers serialize `attach`/`detach`/`set`; replacement is transactional
/// either way, and a hook never observes a half-installed bundle.
///
/// # Example
///
/// ```no_run
/// use assay_crt_bundle::CrtBundle;
///
/// let bundle = CrtBundle::new();
/// let roots = std::fs::read("roots.bin").unwrap();
/// bundle.set(roots).unwrap();
/// assert!(bundle.is_active());
/// ```
pub struct CrtBundle<P = RustCryptoProvider> {
    slot: BundleSlot,
    verifier: SignatureVerifier<P>,
    config: BundleConfig,
}

impl CrtBundle<RustCryptoProvider> {
    pub fn new() -> Self {
        Self::with_config(BundleConfig::default())
    }

    /// Create a context from `ASSAY_CRT_BUNDLE_*` environment variables.
    pub fn from_env() -> Self {
        Self::with_config(BundleConfig::from_env())
    }

    pub fn with_config(config: BundleConfig) -> Self {
        Self::with_provider(RustCryptoProvider, config)
    }
}

impl Default for CrtBundle<RustCryptoProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CryptoProvider + 'static> CrtBundle<P> {
    pub fn with_provider(provider: P, config: BundleConfig) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            verifier: SignatureVerifier::new(provider),
            config,
        }
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    /// Ensure a bundle is active and install the hook into `tls`.
    ///
    /// Loads `config.bundle_path` or the embedded default if no bundle is
    /// active yet. On error `tls` is left untouched.
    pub fn attach(&self, tls: &mut dyn TlsConfig) -> BundleResult<()> {
        self.ensure_loaded()?;

        tls.set_ca_chain(PlaceholderCaChain);
        tls.set_verify_hook(Some(Arc::new(self.verifier())));
        tracing::debug!("certificate bundle attached");
        Ok(())
    }

    /// Release the active bundle and remove the hook from `tls`.
    pub fn detach(&self, tls: &mut dyn TlsConfig) {
        self.clear();
        tls.set_verify_hook(None);
    }

    /// Parse `buf` and make it the active bundle.
    ///
    /// On error the previously active bundle stays in place.
    pub fn set(&self, buf: impl Into<Bytes>) -> BundleResult<()> {
        let bundle = Bundle::parse_with_config(buf, &self.config)?;
        let count = bundle.len();
        let previous = self.write_slot().replace(bundle);
        tracing::info!(count, replaced = previous.is_some(), "certificate bundle installed");
        Ok(())
    }

    /// Read a bundle file and make it the active bundle.
    pub fn set_from_file(&self, path: impl AsRef<Path>) -> BundleResult<()> {
        let path = path.as_ref();
        let buf = std::fs::read(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.set(buf)
    }

    /// Load the configured or embedded bundle unless one is already active.
    pub fn ensure_loaded(&self) -> BundleResult<()> {
        if self.is_active() {
            return Ok(());
        }

        match &self.config.bundle_path {
            Some(path) => self.set_from_file(path),
            None => self.set(Bytes::from_static(DEFAULT_BUNDLE)),
        }
    }

    /// Drop the active bundle.
    pub fn clear(&self) {
        if self.write_slot().take().is_some() {
            tracing::debug!("certificate bundle released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of anchors in the active bundle, `None` when nothing is active.
    pub fn cert_count(&self) -> Option<usize> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Bundle::len)
    }

    /// A hook reading this context's active bundle.
    pub fn verifier(&self) -> BundleVerifier<P> {
        BundleVerifier::new(Arc::clone(&self.slot), self.verifier.clone())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Bundle>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}
