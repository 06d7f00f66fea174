//! Wire encoding for peer cache responses.
//!
//! Peer lookups travel as `GET {base}/{group}/{key}` with both path
//! segments query-escaped. A successful response body is a protobuf-style
//! envelope with a single length-delimited `value` field (field 1), served
//! as `application/octet-stream`. This implements just enough of the
//! protobuf wire format to encode and decode that envelope without pulling
//! in a code generator; unknown fields are skipped so the envelope can grow
//! without breaking older peers.

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;

/// Field number of the value payload in the response envelope.
const VALUE_FIELD: u32 = 1;

/// Wire type for varint fields.
const WIRE_TYPE_VARINT: u8 = 0;
/// Wire type for length-delimited fields.
const WIRE_TYPE_LEN: u8 = 2;

/// Bytes escaped in URL path segments; query-escaping semantics, so only
/// unreserved characters pass through unchanged.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Content type of every peer response body.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Decode failures for the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("response body is truncated")]
    Truncated,
    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),
    #[error("response envelope has no value field")]
    MissingValue,
}

/// Escape a group name or key for use as a URL path segment.
pub fn escape_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Encode a value payload into the response envelope.
pub fn encode_value(value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(value.len() + 6);
    encode_tag(VALUE_FIELD, WIRE_TYPE_LEN, &mut buf);
    encode_varint(value.len() as u64, &mut buf);
    buf.extend_from_slice(value);
    buf
}

/// Decode a response envelope, returning the value payload.
///
/// Unknown fields are skipped. Fails on truncated input or when no value
/// field is present.
pub fn decode_value(mut buf: &[u8]) -> Result<Bytes, WireError> {
    let mut value = None;
    while !buf.is_empty() {
        let (field, wire_type) = decode_tag(&mut buf).ok_or(WireError::Truncated)?;
        if field == VALUE_FIELD && wire_type == WIRE_TYPE_LEN {
            let data = decode_length_delimited(&mut buf).ok_or(WireError::Truncated)?;
            value = Some(Bytes::copy_from_slice(data));
        } else {
            skip_field(wire_type, &mut buf)?;
        }
    }
    value.ok_or(WireError::MissingValue)
}

fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn decode_varint(buf: &mut &[u8]) -> Option<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        let (&byte, rest) = buf.split_first()?;
        *buf = rest;

        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some(result);
        }
        shift += 7;
        if shift >= 64 {
            return None;
        }
    }
}

fn encode_tag(field: u32, wire_type: u8, buf: &mut Vec<u8>) {
    encode_varint(((field as u64) << 3) | (wire_type as u64), buf);
}

fn decode_tag(buf: &mut &[u8]) -> Option<(u32, u8)> {
    let tag = decode_varint(buf)?;
    Some(((tag >> 3) as u32, (tag & 0x07) as u8))
}

fn decode_length_delimited<'a>(buf: &mut &'a [u8]) -> Option<&'a [u8]> {
    let len = decode_varint(buf)? as usize;
    if buf.len() < len {
        return None;
    }
    let (data, rest) = buf.split_at(len);
    *buf = rest;
    Some(data)
}

fn skip_field(wire_type: u8, buf: &mut &[u8]) -> Result<(), WireError> {
    match wire_type {
        WIRE_TYPE_VARINT => {
            decode_varint(buf).ok_or(WireError::Truncated)?;
        }
        WIRE_TYPE_LEN => {
            decode_length_delimited(buf).ok_or(WireError::Truncated)?;
        }
        // 64-bit fixed
        1 => {
            if buf.len() < 8 {
                return Err(WireError::Truncated);
            }
            *buf = &buf[8..];
        }
        // 32-bit fixed
        5 => {
            if buf.len() < 4 {
                return Err(WireError::Truncated);
            }
            *buf = &buf[4..];
        }
        other => return Err(WireError::UnsupportedWireType(other)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for payload in [&b""[..], b"630", b"a longer value with spaces"] {
            let encoded = encode_value(payload);
            assert_eq!(decode_value(&encoded).unwrap(), Bytes::copy_from_slice(payload));
        }
    }

    #[test]
    fn test_encoding_layout() {
        // Field 1, length-delimited: tag 0x0A, then the length, then bytes.
        let encoded = encode_value(b"630");
        assert_eq!(encoded, vec![0x0A, 0x03, b'6', b'3', b'0']);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // A varint field 2 before the value field.
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0x10, 0x2A]); // field 2, varint 42
        buf.extend_from_slice(&encode_value(b"value"));
        assert_eq!(decode_value(&buf).unwrap(), Bytes::from_static(b"value"));
    }

    #[test]
    fn test_truncated_payload() {
        let mut encoded = encode_value(b"longer-than-it-claims");
        encoded.truncate(4);
        assert_eq!(decode_value(&encoded), Err(WireError::Truncated));
    }

    #[test]
    fn test_missing_value_field() {
        assert_eq!(decode_value(&[]), Err(WireError::MissingValue));
        // Only an unknown field present.
        assert_eq!(decode_value(&[0x10, 0x01]), Err(WireError::MissingValue));
    }

    #[test]
    fn test_large_length_prefix() {
        // Claims a 1GB payload with a 1-byte body.
        let buf = [0x0A, 0x80, 0x80, 0x80, 0x80, 0x04, b'x'];
        assert_eq!(decode_value(&buf), Err(WireError::Truncated));
    }

    #[test]
    fn test_escape_segment() {
        assert_eq!(escape_segment("Tom"), "Tom");
        assert_eq!(escape_segment("a/b"), "a%2Fb");
        assert_eq!(escape_segment("a b&c"), "a%20b%26c");
        assert_eq!(escape_segment("score_1.v2~x-y"), "score_1.v2~x-y");
    }
}
