/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The front-end of a CSS parser: byte decoding and tokenization.
//!
//! Two sequential stages form a pipeline:
//!
//! * [`decode_stylesheet_bytes`] turns a raw byte buffer into the canonical
//!   stream of code points defined by
//!   <https://www.w3.org/TR/css-syntax-3/#input-byte-stream>:
//!   BOM sniffing, UTF-8 decoding with U+FFFD error recovery, and
//!   newline/NUL preprocessing.
//! * [`tokenize_code_points`] runs the
//!   <https://www.w3.org/TR/css-syntax-3/#tokenization> state machine over
//!   that stream and produces [`Token`]s.
//!
//! [`parse`] and [`tokenize`] compose the two stages. Rule and declaration
//! parsing, selectors, and the CSSOM are out of scope; they consume the
//! token stream produced here.

#[macro_use]
mod macros;

pub use crate::error::ParseError;
pub use crate::from_bytes::{decode_stylesheet_bytes, Encoding};
pub use crate::tokenizer::{tokenize_code_points, NumericValue, Token};

pub mod code_points;
mod error;
mod from_bytes;
mod tokenizer;


/// Decode and tokenize a stylesheet, discarding the token stream.
///
/// This is the boolean-level entry point: `Ok(())` means the input decoded
/// (or was repaired with U+FFFD) and tokenized without a fatal error.
/// Recoverable errors (bad strings, bad urls) are absorbed into the token
/// stream and do not fail the parse.
pub fn parse(css: &[u8]) -> Result<(), ParseError> {
    let input = decode_stylesheet_bytes(css)?;
    tokenize_code_points(input)?;
    Ok(())
}

/// Decode and tokenize a stylesheet, returning the token stream.
pub fn tokenize(css: &[u8]) -> Result<Vec<Token>, ParseError> {
    let input = decode_stylesheet_bytes(css)?;
    tokenize_code_points(input)
}
