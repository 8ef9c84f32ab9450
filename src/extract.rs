//! Per-tag decode functions.
//!
//! Each [`Tag`] maps to one [`Extractor`]. Scalars decode straight into a
//! [`Value`]; ARRAY yields a lazy [`Elements`] walk over its payload and
//! OBJECT yields the view itself, so that the caller picks the key codec.
//!
//! Every read is checked against the value's own region, never the whole
//! backing buffer, so a truncated child can not read into its siblings.

use crate::bson::Bson;
use crate::error::{Error, Result};
use crate::tag::{self, Tag, HEADER_LEN};
use crate::value::{Number, Value};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use std::str::FromStr;

/// Decodes the value starting at byte `at` of the view's region.
pub type Extractor = fn(&Bson, usize) -> Result<Element>;

/// The decoded form of a single binary value.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Scalar(Value),
    Array(Elements),
    Object(Bson),
}

impl Element {
    /// Returns the scalar, if this element is one.
    #[must_use]
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Element::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

/// Lazy iterator over the consecutive values of an ARRAY or OBJECT payload.
///
/// Children share the parent's buffer. A segment that overruns the payload
/// yields one [`Error::Bounds`] and ends the iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Elements {
    buf: Bytes,
    pos: usize,
    end: usize,
}

impl Elements {
    /// `start..end` are absolute offsets into `buf`, already bounds checked.
    pub(crate) fn new(buf: Bytes, start: usize, end: usize) -> Self {
        Elements {
            buf,
            pos: start,
            end,
        }
    }

    fn step(&mut self) -> Result<Bson> {
        let payload = &self.buf[..self.end];
        let span = tag::value_span(payload, self.pos)?;
        match self.pos.checked_add(span) {
            Some(next) if next <= self.end => {
                let child = Bson::from_parts(self.buf.clone(), self.pos, span);
                self.pos = next;
                Ok(child)
            }
            _ => Err(Error::bounds(self.pos, span, self.end)),
        }
    }
}

impl Iterator for Elements {
    type Item = Result<Bson>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let item = self.step();
        if item.is_err() {
            self.pos = self.end;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for Elements {}

/// Returns the decode function registered for `tag`.
#[must_use]
pub const fn extractor(tag: Tag) -> Extractor {
    match tag {
        Tag::Integer => integer,
        Tag::Long => long,
        Tag::Float => float,
        Tag::Double => double,
        Tag::Null => null,
        Tag::True => boolean_true,
        Tag::False => boolean_false,
        Tag::String => string,
        Tag::Object => object,
        Tag::Array => array,
        Tag::Byte => byte,
        Tag::Short => short,
        Tag::BigInteger => big_integer,
        Tag::BigDecimal => big_decimal,
    }
}

/// Decodes `bson` through the extractor of its own tag.
pub fn extract(bson: &Bson) -> Result<Element> {
    extractor(bson.tag()?)(bson, 0)
}

fn scalar(n: Number) -> Result<Element> {
    Ok(Element::Scalar(Value::Number(n)))
}

fn integer(b: &Bson, at: usize) -> Result<Element> {
    let region = b.as_bytes();
    scalar(Number::Integer(tag::read_i32_le(region, past(region, at, 1)?)?))
}

fn long(b: &Bson, at: usize) -> Result<Element> {
    let region = b.as_bytes();
    scalar(Number::Long(tag::read_i64_le(region, past(region, at, 1)?)?))
}

fn float(b: &Bson, at: usize) -> Result<Element> {
    let region = b.as_bytes();
    let bits = tag::read_u32_le(region, past(region, at, 1)?)?;
    scalar(Number::Float(f32::from_bits(bits)))
}

fn double(b: &Bson, at: usize) -> Result<Element> {
    let region = b.as_bytes();
    let bits = tag::read_i64_le(region, past(region, at, 1)?)? as u64;
    scalar(Number::Double(f64::from_bits(bits)))
}

fn null(_: &Bson, _: usize) -> Result<Element> {
    Ok(Element::Scalar(Value::Null))
}

fn boolean_true(_: &Bson, _: usize) -> Result<Element> {
    Ok(Element::Scalar(Value::Bool(true)))
}

fn boolean_false(_: &Bson, _: usize) -> Result<Element> {
    Ok(Element::Scalar(Value::Bool(false)))
}

fn byte(b: &Bson, at: usize) -> Result<Element> {
    let region = b.as_bytes();
    scalar(Number::Byte(tag::read_u8(region, past(region, at, 1)?)? as i8))
}

fn short(b: &Bson, at: usize) -> Result<Element> {
    let region = b.as_bytes();
    scalar(Number::Short(tag::read_i16_le(region, past(region, at, 1)?)?))
}

/// `at + n`, or a bounds error when the sum overflows.
fn past(region: &[u8], at: usize, n: usize) -> Result<usize> {
    at.checked_add(n)
        .ok_or_else(|| Error::bounds(at, n, region.len()))
}

/// The length-prefixed payload of the value at `at`.
fn payload(region: &[u8], at: usize) -> Result<&[u8]> {
    let length = tag::read_length(region, at)?;
    tag::window(region, past(region, at, HEADER_LEN)?, length)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::structure(format!("Invalid UTF-8 payload: {}", e)))
}

fn string(b: &Bson, at: usize) -> Result<Element> {
    let text = utf8(payload(b.as_bytes(), at)?)?;
    Ok(Element::Scalar(Value::String(text.to_string())))
}

fn big_integer(b: &Bson, at: usize) -> Result<Element> {
    let v = BigInt::from_signed_bytes_be(payload(b.as_bytes(), at)?);
    scalar(Number::BigInteger(v))
}

fn big_decimal(b: &Bson, at: usize) -> Result<Element> {
    let text = utf8(payload(b.as_bytes(), at)?)?;
    let v = BigDecimal::from_str(text)
        .map_err(|_| Error::structure(format!("Invalid BIG_DECIMAL payload '{}'", text)))?;
    scalar(Number::BigDecimal(v))
}

fn array(b: &Bson, at: usize) -> Result<Element> {
    let len = payload(b.as_bytes(), at)?.len();
    // the payload check above keeps these sums inside the region
    let start = b.offset() + past(b.as_bytes(), at, HEADER_LEN)?;
    Ok(Element::Array(Elements::new(b.buffer().clone(), start, start + len)))
}

fn object(b: &Bson, at: usize) -> Result<Element> {
    payload(b.as_bytes(), at)?;
    Ok(Element::Object(b.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(bytes: &'static [u8]) -> Bson {
        Bson::from_bytes(Bytes::from_static(bytes)).unwrap()
    }

    #[test]
    fn test_fixed_width_scalars() {
        let cases: Vec<(&'static [u8], Value)> = vec![
            (&[11, 0xFF], Value::from(-1i8)),
            (&[12, 0x00, 0x80], Value::from(i16::MIN)),
            (&[1, 0x78, 0x56, 0x34, 0x12], Value::from(0x12345678i32)),
            (&[2, 1, 0, 0, 0, 0, 0, 0, 0], Value::from(1i64)),
            (&[5], Value::Null),
            (&[6], Value::Bool(true)),
            (&[7], Value::Bool(false)),
        ];
        for (bytes, expected) in cases {
            assert_eq!(extract(&view(bytes)).unwrap(), Element::Scalar(expected));
        }
    }

    #[test]
    fn test_float_raw_bits() {
        let bits = 1.5f32.to_bits().to_le_bytes();
        let bytes = Bytes::from(vec![3, bits[0], bits[1], bits[2], bits[3]]);
        let b = Bson::from_bytes(bytes).unwrap();
        assert_eq!(
            extract(&b).unwrap(),
            Element::Scalar(Value::Number(Number::Float(1.5)))
        );
    }

    #[test]
    fn test_big_integer_is_big_endian() {
        // 0x0100 = 256
        let b = view(&[13, 2, 0, 0, 0, 0x01, 0x00]);
        assert_eq!(
            extract(&b).unwrap(),
            Element::Scalar(Value::Number(Number::BigInteger(BigInt::from(256))))
        );
    }

    #[test]
    fn test_big_decimal_text() {
        let b = view(&[14, 4, 0, 0, 0, b'1', b'.', b'2', b'5']);
        let expected = BigDecimal::from_str("1.25").unwrap();
        assert_eq!(
            extract(&b).unwrap(),
            Element::Scalar(Value::Number(Number::BigDecimal(expected)))
        );
    }

    #[test]
    fn test_offsets_past_usize_max_are_bounds_errors() {
        let b = view(&[1, 0, 0, 0, 0]);
        for byte in 1u8..=14 {
            let tag = Tag::from_u8(byte).unwrap();
            let result = extractor(tag)(&b, usize::MAX);
            match tag {
                Tag::Null | Tag::True | Tag::False => assert!(result.is_ok()),
                _ => assert!(
                    matches!(result, Err(Error::Bounds { .. })),
                    "{} gave {:?}",
                    tag,
                    result
                ),
            }
        }
    }

    #[test]
    fn test_truncated_payload_is_bounds_error() {
        let b = view(&[8, 9, 0, 0, 0, b'a']);
        assert!(matches!(extract(&b), Err(Error::Bounds { .. })));
        let b = view(&[1, 0, 0]);
        assert!(matches!(extract(&b), Err(Error::Bounds { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_structure_error() {
        let b = view(&[8, 1, 0, 0, 0, 0xFF]);
        assert!(matches!(extract(&b), Err(Error::Structure(_))));
    }

    #[test]
    fn test_array_elements_are_lazy_views() {
        let b = view(&[10, 7, 0, 0, 0, 11, 1, 5, 12, 2, 0, 6]);
        let Element::Array(elements) = extract(&b).unwrap() else {
            panic!("expected an array");
        };
        let children: Vec<Bson> = elements.collect::<Result<_>>().unwrap();
        assert_eq!(children.len(), 4);
        assert_eq!(children[0].as_bytes(), &[11, 1]);
        assert_eq!(children[1].as_bytes(), &[5]);
        assert_eq!(children[2].offset(), 8);
        assert_eq!(children[3].as_bytes(), &[6]);
    }

    #[test]
    fn test_overrunning_child_stops_iteration() {
        // The inner STRING claims 9 bytes inside a 6-byte payload.
        let b = view(&[10, 6, 0, 0, 0, 8, 9, 0, 0, 0, b'x']);
        let Element::Array(mut elements) = extract(&b).unwrap() else {
            panic!("expected an array");
        };
        assert!(matches!(elements.next(), Some(Err(Error::Bounds { .. }))));
        assert!(elements.next().is_none());
    }
}
