/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

/// Expands to an expression equivalent to a `match` with string patterns,
/// but matching is case-insensitive in the ASCII range.
///
/// # Example
///
/// ```
/// # use css_syntax::match_ignore_ascii_case;
/// # let function_name = "uRl";
/// let is_url = match_ignore_ascii_case! { function_name,
///     "url" => true,
///     _ => false,
/// };
/// assert!(is_url);
/// ```
#[macro_export]
macro_rules! match_ignore_ascii_case {
    ( $value: expr, $( $string: expr => $result: expr, )+ _ => $fallback: expr $(,)? ) => {
        match $value {
            $(
                s if s.eq_ignore_ascii_case($string) => $result,
            )+
            _ => $fallback,
        }
    };
}
