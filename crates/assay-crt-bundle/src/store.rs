//! Parsed, validated view over a serialized trust-anchor bundle.
//!
//! # Format
//!
//! All integers are big-endian and unsigned.
//!
//! ```text
//! u16 cert_count
//! cert_count times:
//!     u16 name_len
//!     u16 key_len
//!     [u8; name_len] issuer name (DER subject)
//!     [u8; key_len]  public key (DER SubjectPublicKeyInfo)
//! ```
//!
//! Records are sorted ascending by issuer name. Sortedness is a producer
//! guarantee and is not checked here.

use bytes::Bytes;

use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult};

/// Hard ceiling on certificates per bundle.
pub const BUNDLE_MAX_CERTS: usize = 200;

/// Size of the `cert_count` header.
pub(crate) const BUNDLE_HEADER_LEN: usize = 2;

/// Size of a record's `name_len`/`key_len` header.
pub(crate) const RECORD_HEADER_LEN: usize = 4;

/// Embedded default bundle, used by `attach` when nothing else is installed.
pub static DEFAULT_BUNDLE: &[u8] = include_bytes!("../data/x509_crt_bundle.bin");

/// One trusted anchor: issuer name and public key, borrowed from the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertRecord<'a> {
    pub issuer_name: &'a [u8],
    pub public_key: &'a [u8],
}

/// A validated bundle.
///
/// Holds the backing buffer (shared, never copied) and one start offset per
/// record. Every offset was bounds-checked by [`Bundle::parse`], so record
/// access cannot fail afterwards.
#[derive(Debug, Clone)]
pub struct Bundle {
    buf: Bytes,
    offsets: Vec<usize>,
}

impl Bundle {
    /// Parse and validate a bundle with the default certificate ceiling.
    pub fn parse(buf: impl Into<Bytes>) -> BundleResult<Self> {
        Self::parse_with_config(buf, &BundleConfig::default())
    }

    /// Parse the embedded default bundle.
    pub fn embedded() -> BundleResult<Self> {
        Self::parse(Bytes::from_static(DEFAULT_BUNDLE))
    }

    /// Parse and validate a bundle.
    ///
    /// # Errors
    ///
    /// - [`BundleError::InvalidFormat`] if the buffer is shorter than a header
    ///   plus one record header, or any record runs past the end.
    /// - [`BundleError::TooManyCertificates`] if the declared count exceeds
    ///   the ceiling. Checked before any record is read.
    /// - [`BundleError::AllocationFailure`] if the offset table cannot be
    ///   allocated.
    pub fn parse_with_config(buf: impl Into<Bytes>, config: &BundleConfig) -> BundleResult<Self> {
        let buf = buf.into();

        if buf.len() < BUNDLE_HEADER_LEN + RECORD_HEADER_LEN {
            tracing::error!(len = buf.len(), "certificate bundle too short");
            return Err(BundleError::invalid(format!(
                "bundle is {} bytes, minimum is {}",
                buf.len(),
                BUNDLE_HEADER_LEN + RECORD_HEADER_LEN
            )));
        }

        let count = usize::from(read_u16(&buf, 0));
        let max = config.effective_max_certs();
        if count > max {
            tracing::error!(count, max, "certificate bundle exceeds certificate ceiling");
            return Err(BundleError::TooManyCertificates { count, max });
        }

        let mut offsets = Vec::new();
        offsets
            .try_reserve_exact(count)
            .map_err(|_| BundleError::AllocationFailure { count })?;

        let mut cursor = BUNDLE_HEADER_LEN;
        for index in 0..count {
            if cursor + RECORD_HEADER_LEN > buf.len() {
                tracing::error!(index, cursor, "record header past end of bundle");
                return Err(BundleError::invalid(format!(
                    "record {index} header at offset {cursor} runs past end of bundle"
                )));
            }

            let name_len = usize::from(read_u16(&buf, cursor));
            let key_len = usize::from(read_u16(&buf, cursor + 2));
            let end = cursor + RECORD_HEADER_LEN + name_len + key_len;
            if end > buf.len() {
                tracing::error!(index, cursor, name_len, key_len, "record body past end of bundle");
                return Err(BundleError::invalid(format!(
                    "record {index} ({name_len}+{key_len} bytes) runs past end of bundle"
                )));
            }

            offsets.push(cursor);
            cursor = end;
        }

        tracing::debug!(
            count,
            len = buf.len(),
            trailing = buf.len() - cursor,
            "certificate bundle parsed"
        );

        Ok(Self { buf, offsets })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Record at `index`, in bundle order.
    pub fn get(&self, index: usize) -> Option<CertRecord<'_>> {
        self.offsets.get(index).map(|&offset| self.record_at(offset))
    }

    /// Iterate records in bundle order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = CertRecord<'_>> + '_ {
        self.offsets.iter().map(|&offset| self.record_at(offset))
    }

    /// The backing buffer.
    pub fn as_bytes(&self) -> &Bytes {
        &self.buf
    }

    /// Issuer name of record `index`, which must be in range.
    pub(crate) fn name_at(&self, index: usize) -> &[u8] {
        self.record_at(self.offsets[index]).issuer_name
    }

    fn record_at(&self, offset: usize) -> CertRecord<'_> {
        let name_len = usize::from(read_u16(&self.buf, offset));
        let key_len = usize::from(read_u16(&self.buf, offset + 2));
        let name_start = offset + RECORD_HEADER_LEN;
        let key_start = name_start + name_len;

        CertRecord {
            issuer_name: &self.buf[name_start..key_start],
            public_key: &self.buf[key_start..key_start + key_len],
        }
    }
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}
