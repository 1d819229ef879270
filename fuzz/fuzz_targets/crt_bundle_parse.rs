#![no_main]

use assay_crt_bundle::Bundle;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(bundle) = Bundle::parse(data.to_vec()) {
        for record in bundle.iter() {
            let _ = bundle.find(record.issuer_name);
        }
        let _ = bundle.find(data);
    }
});
