#![no_main]
use amf_remoting::amf3::read::AMF3Decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = AMF3Decoder::default().parse_single_element(data);
});
