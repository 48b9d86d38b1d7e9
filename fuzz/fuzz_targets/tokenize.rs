#![no_main]

use css_syntax::decode_stylesheet_bytes;

libfuzzer_sys::fuzz_target!(|data: &[u8]| {
    // Fatal errors are expected on arbitrary input; panics are not.
    let _ = css_syntax::tokenize(data);

    // Decoding is idempotent: re-decoding the output, re-encoded as UTF-8,
    // reproduces it. A leading U+FEFF in the output would be sniffed as a
    // BOM the second time around, so that one case is skipped.
    if let Ok(decoded) = decode_stylesheet_bytes(data) {
        if decoded.first() != Some(&'\u{FEFF}') {
            let utf8: String = decoded.iter().collect();
            assert_eq!(decode_stylesheet_bytes(utf8.as_bytes()).as_deref(), Ok(&decoded[..]));
        }
    }
});
