#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use async_snmp_agent::ber::Decoder;
use async_snmp_agent::message::Message;
use async_snmp_agent::pdu::Pdu;
use async_snmp_agent::value::default_registry;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Whole message; anything that decodes must encode again
    if let Ok(msg) = Message::decode(bytes.clone()) {
        let _ = msg.encode();
    }

    // Bare PDU
    let mut decoder = Decoder::new(bytes);
    let _ = Pdu::decode(default_registry(), &mut decoder);
});
