/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

// https://www.w3.org/TR/css-syntax-3/#input-byte-stream

use log::debug;

use crate::code_points::{is_surrogate, REPLACEMENT};
use crate::error::ParseError;

/// A character encoding recognized by BOM sniffing.
///
/// Only UTF-8 can actually be decoded; the UTF-16 variants are detected so
/// that they can be rejected instead of being mangled as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8, the assumed encoding when no BOM is present.
    Utf8,
    /// UTF-16, big-endian.
    Utf16Be,
    /// UTF-16, little-endian.
    Utf16Le,
}

impl Encoding {
    /// The WHATWG label of this encoding.
    pub fn name(&self) -> &'static str {
        match *self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf16Le => "utf-16le",
        }
    }
}

// https://encoding.spec.whatwg.org/#bom-sniff
fn bom_sniff(css: &[u8]) -> Option<Encoding> {
    if css.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(Encoding::Utf8)
    } else if css.starts_with(&[0xFE, 0xFF]) {
        Some(Encoding::Utf16Be)
    } else if css.starts_with(&[0xFF, 0xFE]) {
        Some(Encoding::Utf16Le)
    } else {
        None
    }
}

/// Determine the character encoding of a stylesheet and decode it into the
/// canonical code-point stream that the tokenizer consumes.
///
/// This is based on the presence of a BOM (Byte Order Mark): a UTF-8 BOM is
/// stripped, a UTF-16 BOM is rejected, and anything else falls back to
/// UTF-8. Decoding errors are never fatal; each one is materialized as a
/// U+FFFD code point. Preprocessing
/// (<https://www.w3.org/TR/css-syntax-3/#input-preprocessing>) is applied
/// on the fly: U+000D U+000A pairs and lone U+000D and U+000C collapse to
/// U+000A, and U+0000 becomes U+FFFD.
pub fn decode_stylesheet_bytes(css: &[u8]) -> Result<Vec<char>, ParseError> {
    let start = match bom_sniff(css) {
        Some(Encoding::Utf8) => 3,
        Some(encoding) => return Err(ParseError::UnsupportedEncoding(encoding)),
        None => 0,
    };
    let mut output = Vec::with_capacity(css.len() - start);
    utf8_decode(&css[start..], &mut output);
    debug!("decoded {} bytes into {} code points", css.len(), output.len());
    Ok(output)
}

// Applies the input preprocessing as each decoded code point is emitted.
// `previous_carriage_return` collapses CRLF across the two calls it spans.
fn push_code_point(value: u32, previous_carriage_return: &mut bool, output: &mut Vec<char>) {
    match value {
        // U+000C FORM FEED
        0x000C => {
            output.push('\n');
            *previous_carriage_return = false;
        }
        // U+000D CARRIAGE RETURN
        0x000D => {
            output.push('\n');
            *previous_carriage_return = true;
        }
        // U+000A LINE FEED
        0x000A => {
            if !*previous_carriage_return {
                output.push('\n');
            }
            *previous_carriage_return = false;
        }
        // U+0000 NULL
        0x0000 => {
            output.push(REPLACEMENT);
            *previous_carriage_return = false;
        }
        _ => {
            debug_assert!(!is_surrogate(value), "the UTF-8 decoder cannot emit surrogates");
            output.push(char::from_u32(value).unwrap_or(REPLACEMENT));
            *previous_carriage_return = false;
        }
    }
}

// The UTF-8 decoder of https://encoding.spec.whatwg.org/#utf-8-decoder,
// with one deviation inherited from the input contract: an embedded 0x00
// byte terminates decoding at that point.
//
// A continuation byte outside the current [lower, upper] boundaries emits
// U+FFFD without consuming the byte, so it is rescanned as a lead.
fn utf8_decode(input: &[u8], output: &mut Vec<char>) {
    let mut code_point: u32 = 0;
    let mut bytes_seen: u8 = 0;
    let mut bytes_needed: u8 = 0;
    let mut lower_boundary: u8 = 0x80;
    let mut upper_boundary: u8 = 0xBF;
    let mut previous_carriage_return = false;
    let mut position = 0;
    while position < input.len() {
        let byte = input[position];
        if byte == 0x00 {
            if bytes_needed != 0 {
                push_code_point(REPLACEMENT as u32, &mut previous_carriage_return, output);
            }
            return;
        }
        if bytes_needed == 0 {
            match byte {
                0x00..=0x7F => {
                    push_code_point(byte as u32, &mut previous_carriage_return, output)
                }
                0xC2..=0xDF => {
                    bytes_needed = 1;
                    code_point = (byte & 0x1F) as u32;
                }
                0xE0..=0xEF => {
                    if byte == 0xE0 {
                        lower_boundary = 0xA0;
                    } else if byte == 0xED {
                        upper_boundary = 0x9F;
                    }
                    bytes_needed = 2;
                    code_point = (byte & 0xF) as u32;
                }
                0xF0..=0xF4 => {
                    if byte == 0xF0 {
                        lower_boundary = 0x90;
                    } else if byte == 0xF4 {
                        upper_boundary = 0x8F;
                    }
                    bytes_needed = 3;
                    code_point = (byte & 0x7) as u32;
                }
                _ => push_code_point(REPLACEMENT as u32, &mut previous_carriage_return, output),
            }
            position += 1;
            continue;
        }
        if byte < lower_boundary || byte > upper_boundary {
            code_point = 0;
            bytes_needed = 0;
            bytes_seen = 0;
            lower_boundary = 0x80;
            upper_boundary = 0xBF;
            push_code_point(REPLACEMENT as u32, &mut previous_carriage_return, output);
            // The offending byte is not consumed; rescan it as a lead.
            continue;
        }
        lower_boundary = 0x80;
        upper_boundary = 0xBF;
        code_point = code_point << 6 | (byte & 0x3F) as u32;
        position += 1;
        bytes_seen += 1;
        if bytes_seen != bytes_needed {
            continue;
        }
        push_code_point(code_point, &mut previous_carriage_return, output);
        code_point = 0;
        bytes_needed = 0;
        bytes_seen = 0;
    }
    if bytes_needed != 0 {
        push_code_point(REPLACEMENT as u32, &mut previous_carriage_return, output);
    }
}

#[cfg(test)]
mod tests {
    use super::{bom_sniff, decode_stylesheet_bytes, Encoding};
    use crate::error::ParseError;

    fn decode_to_string(css: &[u8]) -> String {
        decode_stylesheet_bytes(css).unwrap().into_iter().collect()
    }

    #[test]
    fn test_preprocess() {
        assert_eq!(decode_to_string(b""), "");
        assert_eq!(
            decode_to_string("Lorem\r\n\n\tipsum\ndolor\u{FFFD}á\r".as_bytes()),
            "Lorem\n\n\tipsum\ndolor\u{FFFD}á\n"
        );
        assert_eq!(decode_to_string(b"a\rb\r\nc\x0Cd"), "a\nb\nc\nd");
    }

    #[test]
    fn test_bom_sniff() {
        assert_eq!(bom_sniff(b"\xEF\xBB\xBFa"), Some(Encoding::Utf8));
        assert_eq!(bom_sniff(b"\xFE\xFF"), Some(Encoding::Utf16Be));
        assert_eq!(bom_sniff(b"\xFF\xFE"), Some(Encoding::Utf16Le));
        assert_eq!(bom_sniff(b"\xEF\xBB"), None);
        assert_eq!(bom_sniff(b"a{}"), None);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        assert_eq!(decode_to_string(b"\xEF\xBB\xBFa"), "a");
    }

    #[test]
    fn utf16_bom_is_rejected() {
        assert_eq!(
            decode_stylesheet_bytes(b"\xFE\xFF\0a"),
            Err(ParseError::UnsupportedEncoding(Encoding::Utf16Be))
        );
        assert_eq!(
            decode_stylesheet_bytes(b"\xFF\xFE"),
            Err(ParseError::UnsupportedEncoding(Encoding::Utf16Le))
        );
    }

    #[test]
    fn malformed_utf8_is_replaced() {
        // Stray continuation byte.
        assert_eq!(decode_to_string(b"a\x80b"), "a\u{FFFD}b");
        // Truncated two-byte sequence at end of input.
        assert_eq!(decode_to_string(b"a\xC3"), "a\u{FFFD}");
        // Overlong encoding of '/': 0xE0 forbids continuation below 0xA0,
        // and the offending bytes are rescanned as leads.
        assert_eq!(decode_to_string(b"\xE0\x80\xAF"), "\u{FFFD}\u{FFFD}\u{FFFD}");
        // An encoded surrogate (U+D800) is rejected at the second byte.
        assert_eq!(decode_to_string(b"\xED\xA0\x80"), "\u{FFFD}\u{FFFD}\u{FFFD}");
        // Lead byte above 0xF4.
        assert_eq!(decode_to_string(b"\xF5\x90"), "\u{FFFD}\u{FFFD}");
        // The offending byte of an interrupted sequence starts a new one.
        assert_eq!(decode_to_string(b"\xC3\xC3\xA9"), "\u{FFFD}é");
    }

    #[test]
    fn four_byte_sequences_decode() {
        assert_eq!(decode_to_string("a🜷b".as_bytes()), "a🜷b");
        assert_eq!(decode_to_string(b"\xF4\x8F\xBF\xBF"), "\u{10FFFF}");
        // 0xF4 caps the continuation range at 0x8F: U+110000 is unreachable.
        assert_eq!(
            decode_to_string(b"\xF4\x90\x80\x80"),
            "\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}"
        );
    }

    #[test]
    fn embedded_nul_byte_terminates() {
        assert_eq!(decode_to_string(b"ab\0cd"), "ab");
        // Mid-sequence, the truncated sequence is replaced first.
        assert_eq!(decode_to_string(b"ab\xC3\0cd"), "ab\u{FFFD}");
    }

    #[test]
    fn preprocess_is_idempotent() {
        let inputs: &[&[u8]] = &[
            b"a\r\nb\rc\nd\x0Ce",
            b"\r\r\n\n\x0C\r",
            b"ab\x80\xC3\xA9",
            "caf\u{FFFD}é\u{10FFFF}".as_bytes(),
        ];
        for input in inputs {
            let once = decode_to_string(input);
            let twice = decode_to_string(once.as_bytes());
            assert_eq!(once, twice);
            assert!(!once.contains(['\0', '\x0C', '\r']));
        }
    }

    #[test]
    fn crlf_collapse_counts_logical_newlines() {
        let decoded = decode_to_string(b"a\r\nb\rc\nd\x0Ce\r\n");
        assert_eq!(decoded.matches('\n').count(), 5);
    }
}
