//! Bundle configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::store::BUNDLE_MAX_CERTS;

/// Configuration for bundle parsing and loading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    /// Maximum number of certificates accepted in a bundle.
    ///
    /// Never exceeds [`BUNDLE_MAX_CERTS`].
    #[serde(default = "default_max_certs")]
    pub max_certs: usize,

    /// Bundle file loaded by `attach` instead of the embedded default.
    #[serde(default)]
    pub bundle_path: Option<PathBuf>,
}

fn default_max_certs() -> usize {
    BUNDLE_MAX_CERTS
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            max_certs: default_max_certs(),
            bundle_path: None,
        }
    }
}

impl BundleConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ASSAY_CRT_BUNDLE_MAX_CERTS` | Certificate ceiling (default: 200) |
    /// | `ASSAY_CRT_BUNDLE_PATH` | Bundle file used instead of the embedded default |
    pub fn from_env() -> Self {
        let max_certs = std::env::var("ASSAY_CRT_BUNDLE_MAX_CERTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_certs);

        Self {
            bundle_path: std::env::var_os("ASSAY_CRT_BUNDLE_PATH").map(PathBuf::from),
            ..Self::default()
        }
        .with_max_certs(max_certs)
    }

    /// Set the certificate ceiling, clamped to [`BUNDLE_MAX_CERTS`].
    pub fn with_max_certs(mut self, max_certs: usize) -> Self {
        if max_certs > BUNDLE_MAX_CERTS {
            tracing::warn!(
                requested = max_certs,
                max = BUNDLE_MAX_CERTS,
                "certificate ceiling above implementation limit, clamping"
            );
        }
        self.max_certs = max_certs.min(BUNDLE_MAX_CERTS);
        self
    }

    /// Load bundles from this file instead of the embedded default.
    pub fn with_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle_path = Some(path.into());
        self
    }

    /// Ceiling actually enforced at parse time.
    pub(crate) fn effective_max_certs(&self) -> usize {
        self.max_certs.min(BUNDLE_MAX_CERTS)
    }
}
