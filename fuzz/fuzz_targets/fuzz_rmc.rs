#![no_main]

use libfuzzer_sys::fuzz_target;
use prudp_protocol::{RmcRequest, RmcResponse};

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = RmcRequest::from_bytes(data) {
        assert!(request.parameters.len() <= data.len());
        assert!(request.protocol_id < 0x80);
    }

    // Anything that parses as a response must survive a serialize and reparse
    if let Ok(response) = RmcResponse::from_bytes(data) {
        let bytes = response.to_bytes();
        assert_eq!(bytes.len(), 4 + response.size() as usize);
        let reparsed = RmcResponse::from_bytes(&bytes).expect("own output must parse");
        assert_eq!(reparsed.is_success(), response.is_success());
        assert_eq!(reparsed.body().call_id(), response.body().call_id());
    }
});
