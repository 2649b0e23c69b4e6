#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use openflow_protocol::core::codec::OfFrameCodec;
use openflow_protocol::protocol::DeserializationFactory;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Frame and decode an arbitrary byte stream - test for panics and infinite loops
    let factory = DeserializationFactory::builtin();
    let mut buf = BytesMut::from(data);
    while let Ok(Some(frame)) = OfFrameCodec.decode(&mut buf) {
        let mut payload = frame.payload;
        let _ = factory.deserialize(&mut payload, frame.version);
    }
});
