//! Binary search over a bundle's sorted issuer names.

use std::cmp::Ordering;

use crate::store::{Bundle, CertRecord};

impl Bundle {
    /// Find the anchor whose issuer name matches `issuer`.
    ///
    /// Assumes records are sorted ascending by issuer name; an unsorted
    /// bundle yields unspecified (but memory-safe) results.
    ///
    /// The comparison covers the candidate record's declared name length.
    /// A query longer than a record name that starts with that name is a
    /// match. A shorter query sorts before any record it is a prefix of.
    pub fn find(&self, issuer: &[u8]) -> Option<CertRecord<'_>> {
        let index = self.position(issuer)?;
        tracing::debug!(index, count = self.len(), "issuer found in bundle");
        self.get(index)
    }

    /// Index of the record [`Bundle::find`] would return.
    pub fn position(&self, issuer: &[u8]) -> Option<usize> {
        let mut lo = 0;
        let mut hi = self.len();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match compare_issuer(issuer, self.name_at(mid)) {
                Ordering::Equal => return Some(mid),
                Ordering::Less => hi = mid,
                Ordering::Greater => lo = mid + 1,
            }
        }

        None
    }
}

fn compare_issuer(query: &[u8], record_name: &[u8]) -> Ordering {
    let probe = &query[..query.len().min(record_name.len())];
    probe.cmp(record_name)
}
