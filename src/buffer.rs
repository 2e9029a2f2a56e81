//! Bounds-checked byte buffer helpers and hex conversions.
//!
//! Every copy out of a received buffer goes through [`copy_range`], which refuses to step past
//! the end of the source under any circumstance; the message codec builds on this to keep
//! attacker-controlled offsets and lengths from turning into out-of-bounds reads.


use std::fmt;


/// An error that may occur while copying a range out of a byte buffer.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RangeError {
    /// The source buffer contains no bytes at all.
    EmptyData,

    /// The start index lies at or beyond the end of the source buffer.
    StartOutOfRange { start: usize, length: usize },

    /// The end of the requested range lies beyond the end of the source buffer.
    EndOutOfRange { end: usize, length: usize },
}
impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyData
                => write!(f, "data is empty"),
            Self::StartOutOfRange { start, length }
                => write!(f, "start ({}) out of range (buffer has {} bytes)", start, length),
            Self::EndOutOfRange { end, length }
                => write!(f, "end ({}) out of range (buffer has {} bytes)", end, length),
        }
    }
}
impl std::error::Error for RangeError {
}

/// An error that may occur while decoding a hex string.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HexError {
    /// The string contains an odd number of hex digits.
    OddLength { length: usize },

    /// The string contains a character that is not a hex digit.
    InvalidDigit { position: usize, byte: u8 },
}
impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OddLength { length }
                => write!(f, "hex string has odd length ({} digits)", length),
            Self::InvalidDigit { position, byte }
                => write!(f, "invalid hex digit 0x{:02x} at position {}", byte, position),
        }
    }
}
impl std::error::Error for HexError {
}


/// Copies a range of bytes out of `data` into a new owned buffer.
///
/// A `length` of `None` means "up to the end of `data`". The copy is always a fresh allocation;
/// callers may overwrite their source buffer afterwards without invalidating the result.
pub fn copy_range(data: &[u8], start: usize, length: Option<usize>) -> Result<Vec<u8>, RangeError> {
    if data.is_empty() {
        return Err(RangeError::EmptyData);
    }
    if start >= data.len() {
        return Err(RangeError::StartOutOfRange { start, length: data.len() });
    }
    let end = match length {
        Some(len) => start.saturating_add(len),
        None => data.len(),
    };
    if end > data.len() {
        return Err(RangeError::EndOutOfRange { end, length: data.len() });
    }
    Ok(Vec::from(&data[start..end]))
}

/// Pads `data` on the right up to `width` bytes with `pad`.
///
/// Content longer than or exactly `width` bytes is returned unchanged.
pub fn pad_right(data: &[u8], width: usize, pad: u8) -> Vec<u8> {
    let mut ret = Vec::from(data);
    while ret.len() < width {
        ret.push(pad);
    }
    ret
}

/// Pads `data` on the left up to `width` bytes with `pad`.
///
/// Content longer than or exactly `width` bytes is returned unchanged.
pub fn pad_left(data: &[u8], width: usize, pad: u8) -> Vec<u8> {
    if data.len() >= width {
        return Vec::from(data);
    }
    let mut ret = vec![pad; width - data.len()];
    ret.extend_from_slice(data);
    ret
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Converts bytes into their canonical uppercase hex representation.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut ret = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        ret.push(char::from(HEX_DIGITS[usize::from(b >> 4)]));
        ret.push(char::from(HEX_DIGITS[usize::from(b & 0x0F)]));
    }
    ret
}

/// Converts a hex string (either case) back into bytes.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, HexError> {
    let digits = hex.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength { length: digits.len() });
    }
    let mut ret = Vec::with_capacity(digits.len() / 2);
    for (i, pair) in digits.chunks_exact(2).enumerate() {
        let high = hex_digit_value(pair[0])
            .ok_or(HexError::InvalidDigit { position: 2*i, byte: pair[0] })?;
        let low = hex_digit_value(pair[1])
            .ok_or(HexError::InvalidDigit { position: 2*i + 1, byte: pair[1] })?;
        ret.push((high << 4) | low);
    }
    Ok(ret)
}

fn hex_digit_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_range_explicit_length() {
        let data = [1, 2, 3, 4, 5];
        assert_eq!(copy_range(&data, 0, Some(5)).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(copy_range(&data, 1, Some(3)).unwrap(), vec![2, 3, 4]);
        assert_eq!(copy_range(&data, 4, Some(1)).unwrap(), vec![5]);
        assert_eq!(copy_range(&data, 2, Some(0)).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn copy_range_to_end() {
        let data = [1, 2, 3, 4, 5];
        assert_eq!(copy_range(&data, 0, None).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(copy_range(&data, 3, None).unwrap(), vec![4, 5]);
    }

    #[test]
    fn copy_range_rejects_bad_ranges() {
        let data = [1, 2, 3];
        assert_eq!(copy_range(&[], 0, None), Err(RangeError::EmptyData));
        assert_eq!(
            copy_range(&data, 3, None),
            Err(RangeError::StartOutOfRange { start: 3, length: 3 }),
        );
        assert_eq!(
            copy_range(&data, 1, Some(3)),
            Err(RangeError::EndOutOfRange { end: 4, length: 3 }),
        );
    }

    #[test]
    fn pad_right_fills_with_pad_byte() {
        assert_eq!(pad_right(&[1, 2], 4, 0), vec![1, 2, 0, 0]);
        assert_eq!(pad_right(&[1, 2, 3, 4], 4, 0), vec![1, 2, 3, 4]);
        assert_eq!(pad_right(&[1, 2, 3, 4, 5], 4, 0), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn pad_left_aligns_content_right() {
        assert_eq!(pad_left(&[1, 2], 4, 0), vec![0, 0, 1, 2]);
        assert_eq!(pad_left(&[1, 2, 3, 4], 4, 0), vec![1, 2, 3, 4]);
        assert_eq!(pad_left(&[1, 2, 3, 4, 5], 4, 0), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn bytes_to_hex_is_uppercase() {
        assert_eq!(bytes_to_hex(&[0x01, 0x02, 0x03, 0xFF]), "010203FF");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn hex_to_bytes_accepts_either_case() {
        assert_eq!(hex_to_bytes("010203FF").unwrap(), vec![0x01, 0x02, 0x03, 0xFF]);
        assert_eq!(hex_to_bytes("010203ff").unwrap(), vec![0x01, 0x02, 0x03, 0xFF]);
        assert_eq!(hex_to_bytes("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn hex_to_bytes_rejects_malformed_input() {
        assert_eq!(hex_to_bytes("abc"), Err(HexError::OddLength { length: 3 }));
        assert_eq!(
            hex_to_bytes("0g"),
            Err(HexError::InvalidDigit { position: 1, byte: b'g' }),
        );
        assert_eq!(
            hex_to_bytes("zz"),
            Err(HexError::InvalidDigit { position: 0, byte: b'z' }),
        );
    }

    #[test]
    fn hex_round_trip() {
        let data = [0x00, 0x7F, 0x80, 0xFF, 0x12, 0xAB];
        assert_eq!(hex_to_bytes(&bytes_to_hex(&data)).unwrap(), data.to_vec());
    }
}
