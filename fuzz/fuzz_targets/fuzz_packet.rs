#![no_main]

use libfuzzer_sys::fuzz_target;
use prudp_protocol::Packet;

fuzz_target!(|data: &[u8]| {
    // Arbitrary datagrams must decode or fail cleanly
    if let Ok(packet) = Packet::from_bytes(data) {
        assert!(packet.payload.len() < data.len());
        assert!(!(packet.connection_signature().is_some() && packet.fragment_id().is_some()));
    }
});
