//! Property tests for bundle parsing and issuer lookup.

mod common;

use std::collections::BTreeSet;

use assay_crt_bundle::{Bundle, BundleError, CrtBundle};
use common::encode_bundle;
use proptest::prelude::*;

/// DER-shaped names (tag, length, body) never prefix one another.
fn der_names(max: usize) -> impl Strategy<Value = BTreeSet<Vec<u8>>> {
    prop::collection::btree_set(
        prop::collection::vec(any::<u8>(), 0..40).prop_map(|body| {
            let mut name = vec![0x30, body.len() as u8];
            name.extend(body);
            name
        }),
        0..max,
    )
}

fn records(names: &BTreeSet<Vec<u8>>) -> Vec<(Vec<u8>, Vec<u8>)> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), format!("key-{i}").into_bytes()))
        .collect()
}

proptest! {
    #[test]
    fn test_find_returns_every_stored_record(names in der_names(64)) {
        let bundle = Bundle::parse(encode_bundle(&records(&names))).unwrap();
        prop_assert_eq!(bundle.len(), names.len());

        for (i, name) in names.iter().enumerate() {
            let record = bundle.find(name).unwrap();
            prop_assert_eq!(record.issuer_name, name.as_slice());
            let expected_key = format!("key-{i}");
            prop_assert_eq!(record.public_key, expected_key.as_bytes());
        }
    }

    #[test]
    fn test_find_absent_name_returns_none(
        names in der_names(64),
        query in prop::collection::vec(any::<u8>(), 0..48),
    ) {
        prop_assume!(!names.iter().any(|name| query.starts_with(name)));

        let bundle = Bundle::parse(encode_bundle(&records(&names))).unwrap();
        prop_assert!(bundle.find(&query).is_none());
    }

    #[test]
    fn test_truncated_bundle_rejected_and_previous_kept(
        names in der_names(16).prop_filter("non-empty", |n| !n.is_empty()),
        cut in any::<prop::sample::Index>(),
    ) {
        let full = encode_bundle(&records(&names));
        let truncated = full[..cut.index(full.len())].to_vec();

        let ctx = CrtBundle::new();
        ctx.set(full).unwrap();

        let err = ctx.set(truncated).unwrap_err();
        prop_assert!(matches!(err, BundleError::InvalidFormat { .. }), "{:?}", err);
        prop_assert_eq!(ctx.cert_count(), Some(names.len()));
    }

    #[test]
    fn test_parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        // Arbitrary bytes are unsorted; only memory safety is checked here.
        if let Ok(bundle) = Bundle::parse(bytes) {
            for record in bundle.iter() {
                let _ = bundle.find(record.issuer_name);
                let record_len = record.issuer_name.len() + record.public_key.len();
                prop_assert!(record_len <= bundle.as_bytes().len());
            }
        }
    }
}
