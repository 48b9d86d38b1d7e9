/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use thiserror::Error;

use crate::from_bytes::Encoding;

/// A fatal decoding or tokenization error.
///
/// Recoverable parse errors (newline in a string, malformed url contents,
/// malformed UTF-8) never surface here; they are materialized in the token
/// stream as `BadString` / `BadURL` tokens or U+FFFD code points. A fatal
/// error aborts the run and discards any partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The byte stream carried a BOM for an encoding other than UTF-8.
    #[error("unsupported encoding {}", .0.name())]
    UnsupportedEncoding(Encoding),

    /// End of input was reached inside a `/* … */` comment.
    #[error("unterminated comment")]
    UnterminatedComment,

    /// End of input was reached while consuming a url token.
    #[error("unexpected end of input in url token")]
    UnexpectedEofInUrl,

    /// End of input was reached immediately after `\` in url context.
    #[error("unexpected end of input after escape")]
    UnexpectedEofInEscape,
}
