/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

// https://www.w3.org/TR/css-syntax-3/#tokenization

use log::{debug, trace};

use crate::code_points::{
    is_digit, is_ident, is_ident_start, is_newline, is_non_printable, is_surrogate,
    is_whitespace, MAX_ALLOWED_CODE_POINT, REPLACEMENT,
};
use crate::error::ParseError;

/// The numeric value of a `Number`, `Percentage` or `Dimension` token.
///
/// The tag is the "integer" type flag of
/// <https://www.w3.org/TR/css-syntax-3/#consume-number>: `Integer` iff the
/// representation contained neither a fractional part nor an
/// explicitly-signed exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    /// A value whose representation had no `.` and no signed exponent.
    Integer(i64),
    /// Any other value. The spec calls this type flag "number".
    Number(f64),
}

impl NumericValue {
    /// Whether the type flag is "integer".
    pub fn is_integer(&self) -> bool {
        matches!(*self, NumericValue::Integer(_))
    }
}

/// One CSS token.
/// <https://www.w3.org/TR/css-syntax-3/#tokenization>
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An identifier.
    Ident(String),
    /// The name of a function, up to and excluding the `(`.
    Function(String),
    /// `@` followed by an identifier.
    AtKeyword(String),
    /// `#` followed by ident code points. `is_id` is the "id"/"unrestricted"
    /// type flag: whether the value would start an ident sequence.
    Hash {
        /// The hash value, without the `#`.
        value: String,
        /// The type flag.
        is_id: bool,
    },
    /// A quoted string. The value excludes the quotes, with escapes decoded.
    String(String),
    /// A string terminated by an unescaped newline. Carries no value.
    BadString,
    /// An unquoted `url(…)` value, with escapes decoded.
    Url(String),
    /// A `url(…)` whose contents were malformed.
    BadUrl,
    /// Any code point the dispatcher has no rule for.
    Delim(char),
    Number(NumericValue),
    /// A number followed by `%`.
    Percentage(NumericValue),
    /// A number followed by a unit ident sequence.
    Dimension(NumericValue, String),
    /// A maximal run of whitespace, emitted as a single token.
    Whitespace,
    CDO, // <!--
    CDC, // -->
    Colon,
    Semicolon,
    Comma,
    LeftSquareBracket,
    RightSquareBracket,
    LeftParenthesis,
    RightParenthesis,
    LeftCurlyBracket,
    RightCurlyBracket,
}

/// Tokenize a preprocessed code-point stream.
///
/// Repeatedly consumes one token until the input is exhausted. Recoverable
/// parse errors appear in the output as [`Token::BadString`] /
/// [`Token::BadUrl`] (or a truncated `String` / `Url` at end of input);
/// fatal errors abort the run and discard the output.
pub fn tokenize_code_points(input: Vec<char>) -> Result<Vec<Token>, ParseError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut output = Vec::new();
    while let Some(token) = next_token(&mut tokenizer)? {
        output.push(token);
    }
    debug!(
        "tokenized {} code points into {} tokens",
        tokenizer.input.len(),
        output.len()
    );
    Ok(output)
}

//  ***********  End of public API  ***********

struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    fn new(input: Vec<char>) -> Tokenizer {
        Tokenizer { input, position: 0 }
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    // Assumes non-EOF
    #[inline]
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    #[inline]
    fn consume_char(&mut self) -> char {
        let c = self.input[self.position];
        self.position += 1;
        c
    }

    // https://www.w3.org/TR/css-syntax-3/#check-if-two-code-points-are-a-valid-escape
    fn is_valid_escape(&self, offset: usize) -> bool {
        self.char_at(offset) == Some('\\')
            && self.char_at(offset + 1).map_or(false, |c| !is_newline(c))
    }

    // https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier
    fn starts_ident_sequence(&self, offset: usize) -> bool {
        match self.char_at(offset) {
            Some('-') => {
                self.char_at(offset + 1)
                    .map_or(false, |c| is_ident_start(c) || c == '-')
                    || self.is_valid_escape(offset + 1)
            }
            Some('\\') => self.is_valid_escape(offset),
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    // https://www.w3.org/TR/css-syntax-3/#starts-with-a-number
    fn starts_number(&self, offset: usize) -> bool {
        match self.char_at(offset) {
            Some('+') | Some('-') => {
                self.char_at(offset + 1).map_or(false, is_digit)
                    || (self.char_at(offset + 1) == Some('.')
                        && self.char_at(offset + 2).map_or(false, is_digit))
            }
            Some('.') => self.char_at(offset + 1).map_or(false, is_digit),
            Some(c) => is_digit(c),
            None => false,
        }
    }
}

// https://www.w3.org/TR/css-syntax-3/#consume-token
fn next_token(tokenizer: &mut Tokenizer) -> Result<Option<Token>, ParseError> {
    consume_comments(tokenizer)?;
    if tokenizer.is_eof() {
        return Ok(None);
    }
    let c = tokenizer.current_char();
    let token = match c {
        '\t' | '\n' | ' ' => {
            while !tokenizer.is_eof() && is_whitespace(tokenizer.current_char()) {
                tokenizer.position += 1;
            }
            Token::Whitespace
        }
        '"' | '\'' => consume_string(tokenizer, c),
        '#' => {
            if tokenizer.char_at(1).map_or(false, is_ident) || tokenizer.is_valid_escape(1) {
                let is_id = tokenizer.starts_ident_sequence(1);
                tokenizer.position += 1;
                Token::Hash {
                    value: consume_name(tokenizer),
                    is_id,
                }
            } else {
                tokenizer.position += 1;
                Token::Delim(c)
            }
        }
        '(' => {
            tokenizer.position += 1;
            Token::LeftParenthesis
        }
        ')' => {
            tokenizer.position += 1;
            Token::RightParenthesis
        }
        '+' => {
            if tokenizer.starts_number(0) {
                consume_numeric(tokenizer)
            } else {
                tokenizer.position += 1;
                Token::Delim(c)
            }
        }
        ',' => {
            tokenizer.position += 1;
            Token::Comma
        }
        '-' => {
            if tokenizer.starts_number(0) {
                consume_numeric(tokenizer)
            } else if tokenizer.char_at(1) == Some('-') && tokenizer.char_at(2) == Some('>') {
                tokenizer.position += 3;
                Token::CDC
            } else if tokenizer.starts_ident_sequence(0) {
                consume_ident_like(tokenizer)?
            } else {
                tokenizer.position += 1;
                Token::Delim(c)
            }
        }
        '.' => {
            if tokenizer.starts_number(0) {
                consume_numeric(tokenizer)
            } else {
                tokenizer.position += 1;
                Token::Delim(c)
            }
        }
        ':' => {
            tokenizer.position += 1;
            Token::Colon
        }
        ';' => {
            tokenizer.position += 1;
            Token::Semicolon
        }
        '<' => {
            if tokenizer.char_at(1) == Some('!')
                && tokenizer.char_at(2) == Some('-')
                && tokenizer.char_at(3) == Some('-')
            {
                tokenizer.position += 4;
                Token::CDO
            } else {
                tokenizer.position += 1;
                Token::Delim(c)
            }
        }
        '@' => {
            if tokenizer.starts_ident_sequence(1) {
                tokenizer.position += 1;
                Token::AtKeyword(consume_name(tokenizer))
            } else {
                tokenizer.position += 1;
                Token::Delim(c)
            }
        }
        '[' => {
            tokenizer.position += 1;
            Token::LeftSquareBracket
        }
        ']' => {
            tokenizer.position += 1;
            Token::RightSquareBracket
        }
        '{' => {
            tokenizer.position += 1;
            Token::LeftCurlyBracket
        }
        '}' => {
            tokenizer.position += 1;
            Token::RightCurlyBracket
        }
        '0'..='9' => consume_numeric(tokenizer),
        _ if is_ident_start(c) => consume_ident_like(tokenizer)?,
        _ => {
            tokenizer.position += 1;
            Token::Delim(c)
        }
    };
    Ok(Some(token))
}

// https://www.w3.org/TR/css-syntax-3/#consume-comment
//
// Comments produce no token; an unterminated comment is fatal.
fn consume_comments(tokenizer: &mut Tokenizer) -> Result<(), ParseError> {
    while tokenizer.char_at(0) == Some('/') && tokenizer.char_at(1) == Some('*') {
        tokenizer.position += 2;
        loop {
            if tokenizer.is_eof() {
                return Err(ParseError::UnterminatedComment);
            }
            if tokenizer.consume_char() == '*' && tokenizer.char_at(0) == Some('/') {
                tokenizer.position += 1;
                break;
            }
        }
    }
    Ok(())
}

// https://www.w3.org/TR/css-syntax-3/#consume-an-escaped-code-point
//
// Assumes that the U+005C REVERSE SOLIDUS (\) has already been consumed.
// At EOF the escape's value is U+FFFD; `Err` reports it so that url
// context can treat it as fatal.
fn consume_escape(tokenizer: &mut Tokenizer) -> Result<char, ParseError> {
    if tokenizer.is_eof() {
        return Err(ParseError::UnexpectedEofInEscape);
    }
    let c = tokenizer.consume_char();
    let mut value = match c.to_digit(16) {
        Some(digit) => digit,
        None => return Ok(c),
    };
    let mut digits = 1;
    while digits < 6 {
        match tokenizer.char_at(0).and_then(|c| c.to_digit(16)) {
            Some(digit) => {
                value = value << 4 | digit;
                digits += 1;
                tokenizer.position += 1;
            }
            None => break,
        }
    }
    if tokenizer.char_at(0).map_or(false, is_whitespace) {
        tokenizer.position += 1;
    }
    if value == 0 || is_surrogate(value) || value > MAX_ALLOWED_CODE_POINT {
        return Ok(REPLACEMENT);
    }
    Ok(char::from_u32(value).unwrap_or(REPLACEMENT))
}

// https://www.w3.org/TR/css-syntax-3/#consume-string-token
//
// A newline rewinds the cursor to just before it and yields BadString; EOF
// yields the accumulated String. Both are recoverable.
fn consume_string(tokenizer: &mut Tokenizer, ending: char) -> Token {
    tokenizer.position += 1; // Skip the initial quote
    let mut value = String::new();
    while !tokenizer.is_eof() {
        let c = tokenizer.consume_char();
        if c == ending {
            return Token::String(value);
        }
        if is_newline(c) {
            tokenizer.position -= 1;
            trace!("unescaped newline in string, emitting bad-string");
            return Token::BadString;
        }
        if c == '\\' {
            if tokenizer.is_eof() {
                // Escaped EOF: drop the backslash.
                continue;
            }
            if is_newline(tokenizer.current_char()) {
                // Escaped newline: line continuation.
                tokenizer.position += 1;
                continue;
            }
            value.push(consume_escape(tokenizer).unwrap_or(REPLACEMENT));
            continue;
        }
        value.push(c);
    }
    Token::String(value)
}

// https://www.w3.org/TR/css-syntax-3/#consume-an-ident-sequence
fn consume_name(tokenizer: &mut Tokenizer) -> String {
    let mut value = String::new();
    loop {
        match tokenizer.char_at(0) {
            Some(c) if is_ident(c) => {
                value.push(c);
                tokenizer.position += 1;
            }
            _ if tokenizer.is_valid_escape(0) => {
                tokenizer.position += 1; // Skip the backslash
                value.push(consume_escape(tokenizer).unwrap_or(REPLACEMENT));
            }
            _ => return value,
        }
    }
}

// https://www.w3.org/TR/css-syntax-3/#consume-number
// Parse [+-]?\d*(\.\d+)?([eE][+-]?\d+)?
// But this is always called so that there is at least one digit in \d*(\.\d+)?
fn consume_number(tokenizer: &mut Tokenizer) -> NumericValue {
    let mut representation = String::new();
    let mut is_integer = true;
    if matches!(tokenizer.char_at(0), Some('+') | Some('-')) {
        representation.push(tokenizer.consume_char());
    }
    while tokenizer.char_at(0).map_or(false, is_digit) {
        representation.push(tokenizer.consume_char());
    }
    if tokenizer.char_at(0) == Some('.') && tokenizer.char_at(1).map_or(false, is_digit) {
        is_integer = false;
        representation.push(tokenizer.consume_char()); // '.'
        representation.push(tokenizer.consume_char()); // digit
        while tokenizer.char_at(0).map_or(false, is_digit) {
            representation.push(tokenizer.consume_char());
        }
    }
    if matches!(tokenizer.char_at(0), Some('e') | Some('E')) {
        let (signed, first_digit) = match tokenizer.char_at(1) {
            Some('+') | Some('-') => (true, 2),
            _ => (false, 1),
        };
        if tokenizer.char_at(first_digit).map_or(false, is_digit) {
            // An explicitly signed exponent makes the value a "number";
            // an unsigned one keeps the "integer" type flag.
            if signed {
                is_integer = false;
            }
            for _ in 0..(first_digit + 1) {
                representation.push(tokenizer.consume_char());
            }
            while tokenizer.char_at(0).map_or(false, is_digit) {
                representation.push(tokenizer.consume_char());
            }
        }
    }
    convert_string_to_number(&representation, is_integer)
}

// https://www.w3.org/TR/css-syntax-3/#convert-string-to-number
//
// The representation is exactly the text just consumed, so the float parse
// cannot fail; integer arithmetic saturates instead of overflowing.
fn convert_string_to_number(representation: &str, is_integer: bool) -> NumericValue {
    if !is_integer {
        return NumericValue::Number(representation.parse().unwrap_or(0.0));
    }
    // [+-]? digits ([eE] digits)?, no '.' and no exponent sign.
    let (negative, rest) = match representation.strip_prefix(|c| c == '+' || c == '-') {
        Some(rest) => (representation.starts_with('-'), rest),
        None => (false, representation),
    };
    let (integer_part, exponent_part) = match rest.split_once(|c| c == 'e' || c == 'E') {
        Some((integer, exponent)) => (integer, exponent),
        None => (rest, ""),
    };
    // Accumulate with the sign already applied so that overflow saturates
    // to i64::MIN for negative values, not to -i64::MAX.
    let mut value: i64 = 0;
    for digit in integer_part.bytes() {
        let digit = (digit - b'0') as i64;
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    let exponent: u32 = exponent_part.parse().unwrap_or(u32::MAX);
    for _ in 0..exponent {
        if value == 0 || value == i64::MAX || value == i64::MIN {
            break;
        }
        value = value.saturating_mul(10);
    }
    NumericValue::Integer(value)
}

// https://www.w3.org/TR/css-syntax-3/#consume-numeric-token
fn consume_numeric(tokenizer: &mut Tokenizer) -> Token {
    let value = consume_number(tokenizer);
    if tokenizer.starts_ident_sequence(0) {
        Token::Dimension(value, consume_name(tokenizer))
    } else if tokenizer.char_at(0) == Some('%') {
        tokenizer.position += 1;
        Token::Percentage(value)
    } else {
        Token::Number(value)
    }
}

// https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token
fn consume_ident_like(tokenizer: &mut Tokenizer) -> Result<Token, ParseError> {
    let value = consume_name(tokenizer);
    if tokenizer.char_at(0) != Some('(') {
        return Ok(Token::Ident(value));
    }
    tokenizer.position += 1; // Skip the (
    let is_url = match_ignore_ascii_case! { value.as_str(),
        "url" => true,
        _ => false,
    };
    if !is_url {
        return Ok(Token::Function(value));
    }
    // Collapse the whitespace run after `url(` to at most one code point.
    while tokenizer.char_at(0).map_or(false, is_whitespace)
        && tokenizer.char_at(1).map_or(false, is_whitespace)
    {
        tokenizer.position += 1;
    }
    let quote_next = matches!(tokenizer.char_at(0), Some('"') | Some('\''));
    let quote_after_whitespace = tokenizer.char_at(0).map_or(false, is_whitespace)
        && matches!(tokenizer.char_at(1), Some('"') | Some('\''));
    if quote_next || quote_after_whitespace {
        // The contents are a quoted string: `url(` is an ordinary function.
        return Ok(Token::Function(value));
    }
    consume_url(tokenizer)
}

// https://www.w3.org/TR/css-syntax-3/#consume-url-token
//
// Entered from consume_ident_like with `url(` already consumed, so the
// value is unquoted. EOF while reading the value is fatal (as a bad
// escape when it falls immediately after a backslash), but EOF after
// trailing whitespace still produces the (truncated) Url token.
fn consume_url(tokenizer: &mut Tokenizer) -> Result<Token, ParseError> {
    let mut value = String::new();
    while !tokenizer.is_eof() && is_whitespace(tokenizer.current_char()) {
        tokenizer.position += 1;
    }
    loop {
        if tokenizer.is_eof() {
            return Err(ParseError::UnexpectedEofInUrl);
        }
        let c = tokenizer.consume_char();
        match c {
            ')' => return Ok(Token::Url(value)),
            c if is_whitespace(c) => {
                while !tokenizer.is_eof() && is_whitespace(tokenizer.current_char()) {
                    tokenizer.position += 1;
                }
                if tokenizer.is_eof() {
                    return Ok(Token::Url(value));
                }
                if tokenizer.current_char() == ')' {
                    tokenizer.position += 1;
                    return Ok(Token::Url(value));
                }
                return consume_bad_url(tokenizer);
            }
            '"' | '\'' | '(' => return consume_bad_url(tokenizer),
            c if is_non_printable(c) => return consume_bad_url(tokenizer),
            '\\' => {
                if tokenizer.is_eof() {
                    // A bad escape at EOF in url context is fatal; a
                    // newline after the backslash is only a bad url.
                    return Err(ParseError::UnexpectedEofInEscape);
                }
                if is_newline(tokenizer.current_char()) {
                    return consume_bad_url(tokenizer);
                }
                value.push(consume_escape(tokenizer)?);
            }
            c => value.push(c),
        }
    }
}

// https://www.w3.org/TR/css-syntax-3/#consume-the-remnants-of-a-bad-url
//
// Advance until the closing ) or EOF, consuming valid escapes so that an
// escaped ) does not end the remnants.
fn consume_bad_url(tokenizer: &mut Tokenizer) -> Result<Token, ParseError> {
    trace!("malformed url contents, emitting bad-url");
    while !tokenizer.is_eof() {
        if tokenizer.current_char() == ')' {
            tokenizer.position += 1;
            break;
        }
        if tokenizer.is_valid_escape(0) {
            tokenizer.position += 1; // Skip the backslash
            consume_escape(tokenizer)?;
        } else {
            tokenizer.position += 1;
        }
    }
    Ok(Token::BadUrl)
}
