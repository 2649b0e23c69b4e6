#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use openflow_protocol::protocol::DeserializationFactory;

fuzz_target!(|data: &[u8]| {
    // First byte selects the version, the rest is handed over as a stripped frame
    let Some((&version, rest)) = data.split_first() else {
        return;
    };
    let mut payload = Bytes::copy_from_slice(rest);
    let _ = DeserializationFactory::builtin().deserialize(&mut payload, version);
});
