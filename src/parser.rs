//! Single-pass JSON to binary parser.
//!
//! [`JsonParser`] walks the input once, character by character, and writes
//! binary values as soon as each one is complete. Two explicit stacks carry
//! the state: the kinds of the containers that are open, and the finished
//! fragments (keys, values and a break marker per open container) waiting
//! for their container to close. Nothing is shared between calls.
//!
//! The accepted text differs from RFC 8259 in a few documented ways:
//!
//! - Strings are captured verbatim. Backslash escapes are not interpreted, and
//!   a `"` preceded by `\` does not close the string. Raw line breaks inside a
//!   string are rejected.
//! - Numbers may start with `+`. Integers take the narrowest of BYTE, SHORT,
//!   INTEGER and LONG, then BIG_INTEGER. Reals take FLOAT when it is finite and
//!   nonzero, else DOUBLE under the same test, else BIG_DECIMAL; an exact
//!   zero is FLOAT 0.0.
//! - U+FEFF counts as whitespace next to space, tab, CR and LF.
//! - Empty input parses to NULL.
//!
//! Errors carry the offending character and its 1-based character position.
//!
//! ```rust
//! use sprig_bson::{JsonParser, Number, Value};
//!
//! let parser = JsonParser::new();
//! let doc = parser.parse(r#"{"n": [127, -129, 0.0]}"#).unwrap();
//! let n = doc.to_value().unwrap();
//! assert_eq!(
//!     n.as_object().unwrap().get("n"),
//!     Some(&Value::Array(vec![
//!         Value::Number(Number::Byte(127)),
//!         Value::Number(Number::Short(-129)),
//!         Value::Number(Number::Float(0.0)),
//!     ]))
//! );
//!
//! let err = parser.parse(r#"{"a":}"#).unwrap_err();
//! assert_eq!(err.to_string(), "Unknown symbol '}' at position : 6");
//! ```

use crate::bson::Bson;
use crate::encoder::{self, Encoder};
use crate::error::{Error, Result};
use crate::key::{DefaultKeySubstitutor, KeySubstitutor};
use crate::options::ParserOptions;
use crate::tag::Tag;
use crate::value::{Number, Value};
use bigdecimal::{BigDecimal, Zero};
use bytes::{BufMut, BytesMut};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::str::FromStr;

/// Streaming JSON parser producing [`Bson`] values.
#[derive(Debug, Clone, Default)]
pub struct JsonParser<K = DefaultKeySubstitutor> {
    key_codec: K,
    options: ParserOptions,
}

impl JsonParser {
    /// A parser writing keys as STRING values, with default options.
    #[must_use]
    pub fn new() -> Self {
        JsonParser {
            key_codec: DefaultKeySubstitutor,
            options: ParserOptions::default(),
        }
    }
}

impl<K: KeySubstitutor> JsonParser<K> {
    pub fn with_key_substitutor(key_codec: K) -> Self {
        JsonParser {
            key_codec,
            options: ParserOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn key_substitutor(&self) -> &K {
        &self.key_codec
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses one JSON document.
    ///
    /// # Errors
    ///
    /// [`Error::Syntax`] for malformed text. Errors from the key substitutor
    /// are passed through unchanged.
    pub fn parse(&self, text: &str) -> Result<Bson> {
        Scan::new(text, &self.key_codec, self.options.max_depth).run()
    }

    /// Parses `text`, treating an absent document as NULL.
    pub fn parse_optional(&self, text: Option<&str>) -> Result<Bson> {
        match text {
            Some(text) => self.parse(text),
            None => Ok(Bson::null()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Object,
}

#[derive(Debug)]
enum Frame {
    /// Bottom of an open container's fragments.
    Break,
    Key(Bson),
    Value(Bson),
}

/// What the next significant character has to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Start of input.
    Begin,
    /// Right after `[`.
    FirstValue,
    /// After a `,` inside an array.
    NextValue,
    /// After a `:`.
    MemberValue,
    /// Right after `{`.
    FirstKey,
    /// After a `,` inside an object.
    NextKey,
    Colon,
    CommaOrClose,
    /// The top-level value is complete.
    End,
}

const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{FEFF}')
}

const fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')
}

struct Scan<'a, K: ?Sized> {
    chars: Vec<char>,
    pos: usize,
    containers: Vec<Container>,
    frames: Vec<Frame>,
    expect: Expect,
    key_codec: &'a K,
    max_depth: Option<usize>,
}

impl<'a, K: KeySubstitutor + ?Sized> Scan<'a, K> {
    fn new(text: &str, key_codec: &'a K, max_depth: Option<usize>) -> Self {
        Scan {
            chars: text.chars().collect(),
            pos: 0,
            containers: Vec::new(),
            frames: Vec::new(),
            expect: Expect::Begin,
            key_codec,
            max_depth,
        }
    }

    fn run(mut self) -> Result<Bson> {
        while let Some(&c) = self.chars.get(self.pos) {
            if is_whitespace(c) {
                self.pos += 1;
                continue;
            }
            match self.expect {
                Expect::Begin | Expect::FirstValue | Expect::NextValue | Expect::MemberValue => {
                    self.value(c)?
                }
                Expect::FirstKey | Expect::NextKey => self.key(c)?,
                Expect::Colon => {
                    if c != ':' {
                        return Err(Error::syntax("Expected ':'", Some(c), self.pos + 1));
                    }
                    self.pos += 1;
                    self.expect = Expect::MemberValue;
                }
                Expect::CommaOrClose => self.separator(c)?,
                Expect::End => return Err(Error::unknown_symbol(c, self.pos + 1)),
            }
        }

        match self.containers.last() {
            Some(Container::Array) => Err(Error::syntax_message("Array not terminated")),
            Some(Container::Object) => Err(Error::syntax_message("Object is not closed in the end")),
            None => match self.frames.pop() {
                Some(Frame::Value(b)) => Ok(b),
                None if self.expect == Expect::Begin => Ok(Bson::null()),
                _ => Err(stack_error()),
            },
        }
    }

    fn position(&self) -> usize {
        self.pos + 1
    }

    fn value(&mut self, c: char) -> Result<()> {
        match c {
            '{' => self.open(Container::Object, c),
            '[' => self.open(Container::Array, c),
            ']' if self.expect == Expect::FirstValue => self.close_array(),
            ']' if self.expect == Expect::NextValue => {
                Err(Error::syntax("No value found", Some(c), self.position()))
            }
            '"' => {
                let text = self.string()?;
                self.complete(Encoder::encode_str(&text)?);
                Ok(())
            }
            't' => self.literal(c, "true", Value::Bool(true)),
            'f' => self.literal(c, "false", Value::Bool(false)),
            'n' => self.literal(c, "null", Value::Null),
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                let number = self.number()?;
                self.complete(Encoder::new().encode(&Value::Number(number))?);
                Ok(())
            }
            _ => match self.expect {
                Expect::FirstValue | Expect::NextValue => Err(Error::syntax(
                    "Unknown/No value found",
                    Some(c),
                    self.position(),
                )),
                _ => Err(Error::unknown_symbol(c, self.position())),
            },
        }
    }

    fn key(&mut self, c: char) -> Result<()> {
        match c {
            '"' => {
                let text = self.string()?;
                let key = self.key_codec.encode_key(&text)?;
                self.frames.push(Frame::Key(key));
                self.expect = Expect::Colon;
                Ok(())
            }
            '}' if self.expect == Expect::FirstKey => self.close_object(),
            _ if self.expect == Expect::FirstKey => {
                Err(Error::syntax("Expected a String", Some(c), self.position()))
            }
            _ => Err(Error::syntax("Expecting a string", Some(c), self.position())),
        }
    }

    fn separator(&mut self, c: char) -> Result<()> {
        match (self.containers.last(), c) {
            (Some(Container::Array), ',') => {
                self.pos += 1;
                self.expect = Expect::NextValue;
                Ok(())
            }
            (Some(Container::Array), ']') => self.close_array(),
            (Some(Container::Array), _) => Err(Error::syntax(
                "Expecting a ',' or ']'",
                Some(c),
                self.position(),
            )),
            (Some(Container::Object), ',') => {
                self.pos += 1;
                self.expect = Expect::NextKey;
                Ok(())
            }
            (Some(Container::Object), '}') => self.close_object(),
            (Some(Container::Object), _) => Err(Error::syntax(
                "Expecting a ',' or '}'",
                Some(c),
                self.position(),
            )),
            (None, _) => Err(Error::unknown_symbol(c, self.position())),
        }
    }

    /// Records a finished value and works out what may follow it.
    fn complete(&mut self, value: Bson) {
        self.frames.push(Frame::Value(value));
        self.expect = if self.containers.is_empty() {
            Expect::End
        } else {
            Expect::CommaOrClose
        };
    }

    fn open(&mut self, kind: Container, c: char) -> Result<()> {
        if let Some(max) = self.max_depth {
            if self.containers.len() >= max {
                return Err(Error::syntax(
                    &format!("Maximum nesting depth of {} exceeded", max),
                    Some(c),
                    self.position(),
                ));
            }
        }
        self.containers.push(kind);
        self.frames.push(Frame::Break);
        self.expect = match kind {
            Container::Array => Expect::FirstValue,
            Container::Object => Expect::FirstKey,
        };
        self.pos += 1;
        Ok(())
    }

    fn close_array(&mut self) -> Result<()> {
        let mut items = Vec::new();
        loop {
            match self.frames.pop() {
                Some(Frame::Value(v)) => items.push(v),
                Some(Frame::Break) => break,
                _ => return Err(stack_error()),
            }
        }
        items.reverse();
        let array = build(Tag::Array, items.iter())?;
        self.finish_container(array)
    }

    /// Repeated keys keep their first position and their last value.
    fn close_object(&mut self) -> Result<()> {
        let mut members = Vec::new();
        loop {
            match self.frames.pop() {
                Some(Frame::Value(v)) => match self.frames.pop() {
                    Some(Frame::Key(k)) => members.push((k, v)),
                    _ => return Err(stack_error()),
                },
                Some(Frame::Break) => break,
                _ => return Err(stack_error()),
            }
        }
        members.reverse();
        let members: IndexMap<Bson, Bson> = members.into_iter().collect();
        let object = build(Tag::Object, members.iter().flat_map(|(k, v)| [k, v]))?;
        self.finish_container(object)
    }

    fn finish_container(&mut self, value: Bson) -> Result<()> {
        self.containers.pop().ok_or_else(stack_error)?;
        self.pos += 1;
        self.complete(value);
        Ok(())
    }

    /// Reads a `true`/`false`/`null` literal starting at the current position.
    fn literal(&mut self, c: char, expected: &str, value: Value) -> Result<()> {
        let start = self.pos;
        let end = self.chars[start..]
            .iter()
            .position(|ch| !ch.is_ascii_alphanumeric())
            .map_or(self.chars.len(), |n| start + n);
        if !self.chars[start..end].iter().copied().eq(expected.chars()) {
            return Err(Error::syntax(
                &format!("Expected value '{}'", expected),
                Some(c),
                start + 1,
            ));
        }
        self.pos = end;
        self.complete(Encoder::new().encode(&value)?);
        Ok(())
    }

    /// Reads the body of a string whose opening quote is at the current
    /// position, leaving the position after the closing quote.
    fn string(&mut self) -> Result<String> {
        let start = self.pos + 1;
        let mut i = start;
        loop {
            let Some(&c) = self.chars.get(i) else {
                return Err(Error::syntax(
                    "String not terminated with '\"'",
                    None,
                    self.chars.len(),
                ));
            };
            match c {
                '\n' | '\r' => {
                    return Err(Error::syntax(
                        "String cannot have line breaks",
                        Some(c),
                        i + 1,
                    ))
                }
                '"' if self.chars[i - 1] != '\\' => break,
                _ => i += 1,
            }
        }
        self.pos = i + 1;
        Ok(self.chars[start..i].iter().collect())
    }

    fn ends_number(&self, c: char) -> bool {
        is_whitespace(c)
            || match c {
                ',' => !self.containers.is_empty(),
                ']' => self.containers.last() == Some(&Container::Array),
                '}' => self.containers.last() == Some(&Container::Object),
                _ => false,
            }
    }

    /// Scans a number up to (not including) its terminator and picks its tag.
    fn number(&mut self) -> Result<Number> {
        let start = self.pos;
        let mut real = false;
        let mut i = start;
        while let Some(&c) = self.chars.get(i) {
            if !is_number_char(c) {
                if self.ends_number(c) {
                    break;
                }
                return Err(Error::syntax(
                    &format!("Unknown symbol while parsing number : '{}'", c),
                    Some(c),
                    i + 1,
                ));
            }
            if (c == 'e' || c == 'E') && self.chars[i - 1] == '.' {
                return Err(Error::syntax(
                    "Exponent marker cannot follow '.'",
                    Some(c),
                    i + 1,
                ));
            }
            real |= matches!(c, '.' | 'e' | 'E');
            i += 1;
        }
        if self.chars[i - 1] == '.' {
            return Err(Error::syntax(
                "Number cannot be terminated with '.'",
                self.chars.get(i).copied(),
                i + 1,
            ));
        }
        self.pos = i;
        let text: String = self.chars[start..i].iter().collect();
        if real {
            parse_real(&text, start + 1)
        } else {
            BigInt::from_str(&text)
                .map(Number::from_bigint)
                .map_err(|_| unparsable(&text, start + 1))
        }
    }
}

/// FLOAT, else DOUBLE, else BIG_DECIMAL, with an exact zero as FLOAT 0.0.
fn parse_real(text: &str, position: usize) -> Result<Number> {
    let double: f64 = text.parse().map_err(|_| unparsable(text, position))?;
    if let Ok(single) = text.parse::<f32>() {
        if single.is_finite() && single != 0.0 {
            return Ok(Number::Float(single));
        }
    }
    if double.is_finite() && double != 0.0 {
        return Ok(Number::Double(double));
    }
    let decimal = BigDecimal::from_str(text).map_err(|_| unparsable(text, position))?;
    if decimal.is_zero() {
        Ok(Number::Float(0.0))
    } else {
        Ok(Number::BigDecimal(decimal))
    }
}

/// Reported at the number's first character.
fn unparsable(text: &str, position: usize) -> Error {
    Error::syntax(
        &format!("Unable to parse to a number : '{}'", text),
        text.chars().next(),
        position,
    )
}

fn stack_error() -> Error {
    Error::structure("Parser fragment stack is out of balance")
}

fn build<'b>(tag: Tag, parts: impl Iterator<Item = &'b Bson>) -> Result<Bson> {
    let mut out = BytesMut::new();
    let at = encoder::open_container(tag, &mut out);
    for part in parts {
        out.put_slice(part.as_bytes());
    }
    encoder::close_container(at, &mut out)?;
    Bson::from_bytes(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Bson> {
        JsonParser::new().parse(text)
    }

    fn number(text: &str) -> Number {
        match parse(text).unwrap().to_value().unwrap() {
            Value::Number(n) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    fn message(text: &str) -> String {
        parse(text).unwrap_err().to_string()
    }

    #[test]
    fn test_empty_and_blank_input_is_null() {
        assert!(parse("").unwrap().is_null());
        assert!(parse(" \t\u{FEFF}\n").unwrap().is_null());
        assert!(JsonParser::new().parse_optional(None).unwrap().is_null());
    }

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(number("127"), Number::Byte(127));
        assert_eq!(number("128"), Number::Short(128));
        assert_eq!(number("-129"), Number::Short(-129));
        assert_eq!(number("32768"), Number::Integer(32768));
        assert_eq!(number("2147483648"), Number::Long(2147483648));
        assert_eq!(number("+5"), Number::Byte(5));
        assert!(matches!(
            number("9223372036854775808"),
            Number::BigInteger(_)
        ));
    }

    #[test]
    fn test_real_promotion() {
        assert_eq!(number("2.5"), Number::Float(2.5));
        assert_eq!(number("0.0"), Number::Float(0.0));
        assert_eq!(number("1e39"), Number::Double(1e39));
        assert_eq!(
            number("1e400"),
            Number::BigDecimal(BigDecimal::from_str("1e400").unwrap())
        );
    }

    #[test]
    fn test_number_errors() {
        assert_eq!(
            message("[1.e5]"),
            "Exponent marker cannot follow '.' at position : 4"
        );
        assert_eq!(
            message("[1.]"),
            "Number cannot be terminated with '.' at position : 4"
        );
        assert_eq!(
            message("[12a]"),
            "Unknown symbol while parsing number : 'a' at position : 4"
        );
        assert_eq!(
            message("[1-2]"),
            "Unable to parse to a number : '1-2' at position : 2"
        );
    }

    #[test]
    fn test_number_terminators_follow_container() {
        assert_eq!(
            message("1,"),
            "Unknown symbol while parsing number : ',' at position : 2"
        );
        assert_eq!(
            message("[1}"),
            "Unknown symbol while parsing number : '}' at position : 3"
        );
    }

    #[test]
    fn test_strings_are_verbatim() {
        let b = parse(r#"["a\"b", "c\nd"]"#).unwrap();
        let list = b.as_list(&DefaultKeySubstitutor).unwrap();
        assert_eq!(list[0], Value::from(r#"a\"b"#));
        assert_eq!(list[1], Value::from(r"c\nd"));
        assert_eq!(
            message("[\"a\nb\"]"),
            "String cannot have line breaks at position : 4"
        );
        assert_eq!(
            message("\"abc"),
            "String not terminated with '\"' at position : 4"
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("true").unwrap().to_value().unwrap(), Value::Bool(true));
        assert_eq!(message("[tru]"), "Expected value 'true' at position : 2");
        assert_eq!(message("[nulll]"), "Expected value 'null' at position : 2");
        assert_eq!(message("falsey"), "Expected value 'false' at position : 1");
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(message("[1,2,"), "Array not terminated");
        assert_eq!(message("{\"a\":[1"), "Array not terminated");
        assert_eq!(message("[{\"a\":1"), "Object is not closed in the end");
        assert_eq!(message("{\"a\":}"), "Unknown symbol '}' at position : 6");
        assert_eq!(message("[1,]"), "No value found at position : 4");
        assert_eq!(message("[,1]"), "Unknown/No value found at position : 2");
        assert_eq!(message("{1:2}"), "Expected a String at position : 2");
        assert_eq!(message("{\"a\":1,}"), "Expecting a string at position : 8");
        assert_eq!(message("{\"a\" 1}"), "Expected ':' at position : 6");
        assert_eq!(message("[1 2]"), "Expecting a ',' or ']' at position : 4");
        assert_eq!(
            message("{\"a\":1 \"b\":2}"),
            "Expecting a ',' or '}' at position : 8"
        );
        assert_eq!(message("[] x"), "Unknown symbol 'x' at position : 4");
        assert_eq!(message("x"), "Unknown symbol 'x' at position : 1");
    }

    #[test]
    fn test_error_carries_symbol_and_position() {
        let err = parse("[1 2]").unwrap_err();
        assert_eq!(err.symbol(), Some('2'));
        assert_eq!(err.position(), Some(4));
    }

    #[test]
    fn test_duplicate_keys_last_wins_first_position() {
        let b = parse(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        let json = b.to_json_string(&DefaultKeySubstitutor).unwrap();
        assert_eq!(json, r#"{"a":3,"b":2}"#);
    }

    #[test]
    fn test_max_depth() {
        let parser = JsonParser::new().with_options(ParserOptions::new().with_max_depth(1));
        assert!(parser.parse("[1]").is_ok());
        let err = parser.parse("[[1]]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Maximum nesting depth of 1 exceeded at position : 2"
        );
    }

    #[test]
    fn test_positions_count_characters() {
        assert_eq!(message("[\"é\" x]"), "Expecting a ',' or ']' at position : 6");
    }
}
