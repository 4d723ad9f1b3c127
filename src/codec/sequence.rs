//! Escaped, delimited token sequences.
//!
//! The canonical piece encoding nests sequences inside sequences: fields
//! are joined with one delimiter, segments with another, and lists inside
//! fields with a third. Escaping keeps every level lossless:
//!
//! - `\` is written as `\\`
//! - the delimiter is written as `\<delim>`
//!
//! Any other character is written verbatim, so text that already contains
//! escapes from an inner level survives an outer level unchanged.
//!
//! ```
//! use rust_tabletop::codec::{SequenceDecoder, SequenceEncoder};
//!
//! let mut se = SequenceEncoder::new(';');
//! se.append("label").append("a;b").append_int(3);
//! let text = se.finish();
//! assert_eq!(text, "label;a\\;b;3");
//!
//! let tokens: Vec<String> = SequenceDecoder::new(&text, ';').collect();
//! assert_eq!(tokens, vec!["label", "a;b", "3"]);
//! ```

use std::iter::Peekable;
use std::str::Chars;

const ESCAPE: char = '\\';

/// Builds a delimited sequence of escaped tokens.
#[derive(Clone, Debug)]
pub struct SequenceEncoder {
    buffer: String,
    delimiter: char,
    count: usize,
}

impl SequenceEncoder {
    /// Create an encoder using `delimiter` between tokens.
    ///
    /// Panics if `delimiter` is the escape character.
    #[must_use]
    pub fn new(delimiter: char) -> Self {
        assert!(delimiter != ESCAPE, "Delimiter cannot be the escape character");
        Self {
            buffer: String::new(),
            delimiter,
            count: 0,
        }
    }

    /// Append a text token.
    pub fn append(&mut self, token: &str) -> &mut Self {
        if self.count > 0 {
            self.buffer.push(self.delimiter);
        }
        for c in token.chars() {
            if c == ESCAPE || c == self.delimiter {
                self.buffer.push(ESCAPE);
            }
            self.buffer.push(c);
        }
        self.count += 1;
        self
    }

    /// Append a token that is already escaped for this delimiter.
    ///
    /// Used to write back text exactly as [`split_verbatim`] read it.
    pub fn append_verbatim(&mut self, token: &str) -> &mut Self {
        if self.count > 0 {
            self.buffer.push(self.delimiter);
        }
        self.buffer.push_str(token);
        self.count += 1;
        self
    }

    /// Append an integer token.
    pub fn append_int(&mut self, value: i64) -> &mut Self {
        self.append(&value.to_string())
    }

    /// Append a boolean token.
    pub fn append_bool(&mut self, value: bool) -> &mut Self {
        self.append(if value { "true" } else { "false" })
    }

    /// Number of tokens appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Finish and return the encoded text.
    #[must_use]
    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Split `text` on unescaped delimiters, leaving escapes in place.
///
/// Each slice unescapes (via [`unescape`]) to the token
/// [`SequenceDecoder`] would return at the same position.
#[must_use]
pub fn split_verbatim(text: &str, delimiter: char) -> Vec<&str> {
    let mut slices = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == delimiter {
            slices.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    slices.push(&text[start..]);
    slices
}

/// Resolve the escapes in one slice from [`split_verbatim`].
#[must_use]
pub fn unescape(slice: &str, delimiter: char) -> String {
    SequenceDecoder::new(slice, delimiter).next().unwrap_or_default()
}

/// Splits an encoded sequence back into tokens.
///
/// Any input yields at least one token: the empty string decodes to a
/// single empty token. Use [`encode_list`]/[`decode_list`] when a sequence
/// may legitimately be empty.
pub struct SequenceDecoder<'a> {
    chars: Peekable<Chars<'a>>,
    delimiter: char,
    done: bool,
}

impl<'a> SequenceDecoder<'a> {
    /// Create a decoder over `text`.
    #[must_use]
    pub fn new(text: &'a str, delimiter: char) -> Self {
        Self {
            chars: text.chars().peekable(),
            delimiter,
            done: false,
        }
    }

    /// Are there tokens left?
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.done
    }
}

impl Iterator for SequenceDecoder<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let mut token = String::new();
        loop {
            match self.chars.next() {
                None => {
                    self.done = true;
                    return Some(token);
                }
                Some(ESCAPE) => match self.chars.next() {
                    Some(escaped) => token.push(escaped),
                    // Dangling escape at end of input: keep it literally.
                    None => token.push(ESCAPE),
                },
                Some(c) if c == self.delimiter => return Some(token),
                Some(c) => token.push(c),
            }
        }
    }
}

/// Encode a possibly-empty list as a count-prefixed sequence.
///
/// ```
/// use rust_tabletop::codec::{decode_list, encode_list};
///
/// let empty: Vec<String> = Vec::new();
/// assert_eq!(decode_list(&encode_list(&empty, ','), ','), Some(empty));
///
/// let one_blank = vec![String::new()];
/// assert_eq!(decode_list(&encode_list(&one_blank, ','), ','), Some(one_blank));
/// ```
#[must_use]
pub fn encode_list<S: AsRef<str>>(items: &[S], delimiter: char) -> String {
    let mut se = SequenceEncoder::new(delimiter);
    se.append_int(items.len() as i64);
    for item in items {
        se.append(item.as_ref());
    }
    se.finish()
}

/// Decode a list written by [`encode_list`].
///
/// Returns `None` if the count is missing or doesn't match.
#[must_use]
pub fn decode_list(text: &str, delimiter: char) -> Option<Vec<String>> {
    let mut sd = SequenceDecoder::new(text, delimiter);
    let count: usize = sd.next()?.parse().ok()?;
    let items: Vec<String> = sd.collect();
    (items.len() == count).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(tokens: &[&str], delimiter: char) -> Vec<String> {
        let mut se = SequenceEncoder::new(delimiter);
        for t in tokens {
            se.append(t);
        }
        SequenceDecoder::new(&se.finish(), delimiter).collect()
    }

    #[test]
    fn test_plain_tokens() {
        assert_eq!(round_trip(&["a", "b", "c"], ';'), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delimiter_and_escape_in_tokens() {
        let tokens = ["a;b", "c\\d", "\\;", ";", "\\", "end\\"];
        assert_eq!(round_trip(&tokens, ';'), tokens.to_vec());
    }

    #[test]
    fn test_empty_tokens() {
        assert_eq!(round_trip(&["", "", ""], ';'), vec!["", "", ""]);
        assert_eq!(round_trip(&[""], ';'), vec![""]);
    }

    #[test]
    fn test_nested_levels() {
        let mut inner = SequenceEncoder::new(';');
        inner.append("x;y").append("\\");
        let inner = inner.finish();

        let mut outer = SequenceEncoder::new('\t');
        outer.append(&inner).append("tab\there");
        let outer = outer.finish();

        let segments: Vec<String> = SequenceDecoder::new(&outer, '\t').collect();
        assert_eq!(segments[1], "tab\there");
        let fields: Vec<String> = SequenceDecoder::new(&segments[0], ';').collect();
        assert_eq!(fields, vec!["x;y", "\\"]);
    }

    #[test]
    fn test_int_and_bool() {
        let mut se = SequenceEncoder::new(',');
        se.append_int(-7).append_bool(true).append_bool(false);
        assert_eq!(se.len(), 3);
        assert_eq!(se.finish(), "-7,true,false");
    }

    #[test]
    fn test_dangling_escape() {
        let tokens: Vec<String> = SequenceDecoder::new("ab\\", ';').collect();
        assert_eq!(tokens, vec!["ab\\"]);
    }

    #[test]
    fn test_verbatim_split_matches_decoder() {
        let text = "a\\;b;\\x;;end\\\\";
        let slices = split_verbatim(text, ';');
        assert_eq!(slices, vec!["a\\;b", "\\x", "", "end\\\\"]);

        let unescaped: Vec<String> = slices.iter().map(|s| unescape(s, ';')).collect();
        let decoded: Vec<String> = SequenceDecoder::new(text, ';').collect();
        assert_eq!(unescaped, decoded);

        let mut se = SequenceEncoder::new(';');
        for slice in &slices {
            se.append_verbatim(slice);
        }
        assert_eq!(se.finish(), text);
    }

    #[test]
    fn test_list_helpers() {
        let items = vec!["a,b".to_string(), String::new(), "c".to_string()];
        let text = encode_list(&items, ',');
        assert_eq!(decode_list(&text, ','), Some(items));

        assert_eq!(decode_list("3,a", ','), None);
        assert_eq!(decode_list("x,a", ','), None);
    }

    #[test]
    #[should_panic(expected = "Delimiter cannot be the escape character")]
    fn test_escape_delimiter_panics() {
        let _ = SequenceEncoder::new('\\');
    }
}
