#![no_main]
use libfuzzer_sys::fuzz_target;
use tls_trust::parse_ocsp_response;

fuzz_target!(|data: &[u8]| {
    let Some(response) = parse_ocsp_response(data) else {
        return;
    };

    let encoded = response.to_der().unwrap();
    assert_eq!(parse_ocsp_response(&encoded), Some(response));
});
