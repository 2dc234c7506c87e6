#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use async_snmp_agent::ber::Decoder;
use async_snmp_agent::uint64::Uint64;
use async_snmp_agent::value::{Data, ValueKind, default_registry};
use async_snmp_agent::varbind::{VarBind, decode_varbind_list};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // BER primitives
    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_sequence();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_ip_address();

    // Typed values, by registry lookup and forced to each kind
    let mut decoder = Decoder::new(bytes.clone());
    let _ = Data::decode(&mut decoder);

    for kind in ValueKind::ALL {
        let mut decoder = Decoder::new(bytes.clone());
        let _ = Data::decode_as(&mut decoder, kind);
    }

    let _ = Uint64::from_be_slice(data);

    // Variable bindings
    let mut decoder = Decoder::new(bytes.clone());
    let _ = VarBind::decode(default_registry(), &mut decoder);

    let mut decoder = Decoder::new(bytes);
    let _ = decode_varbind_list(default_registry(), &mut decoder);
});
