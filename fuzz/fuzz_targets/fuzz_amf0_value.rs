#![no_main]
use amf_remoting::amf0::read::AMF0Decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = AMF0Decoder::default().parse_single_element(data);
});
