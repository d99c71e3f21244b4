#![no_main]

use libfuzzer_sys::fuzz_target;
use prudp_protocol::utils::compression::{
    CompressionAlgorithm, DeflateCompression, Lz4Compression,
};

fuzz_target!(|data: &[u8]| {
    let codecs: [&dyn CompressionAlgorithm; 2] = [
        &DeflateCompression::new().with_max_output(1 << 20),
        &Lz4Compression::new().with_max_output(1 << 20),
    ];

    for codec in codecs {
        // Compressed frames always come back intact
        if let Ok(framed) = codec.compress(data) {
            let restored = codec.decompress(&framed).expect("own frame must decompress");
            assert_eq!(restored, data);
        }

        // Malformed frames are rejected without panicking
        let _ = codec.decompress(data);
    }
});
