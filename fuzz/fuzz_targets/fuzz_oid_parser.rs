#![no_main]

use libfuzzer_sys::fuzz_target;

use async_snmp_agent::oid::Oid;
use async_snmp_agent::uint64::Uint64;

fuzz_target!(|data: &[u8]| {
    // BER content octets
    if let Ok(oid) = Oid::from_ber(data) {
        let _ = oid.validate_canonical();
    }

    // Dotted strings must canonicalize idempotently
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(oid) = Oid::canonicalize(s) {
            assert_eq!(Oid::canonicalize(&oid.to_string()).ok(), Some(oid));
        }
        let _ = Uint64::parse(s);
    }
});
