//! Hexadecimal credential codec
//!
//! Identifiers and keys are provisioned as text: 16 hex digits for an EUI,
//! 32 for a key, 8 for a device address. Pairs of digits map to bytes, most
//! significant first.

use heapless::String;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Credential decoding error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexError {
    /// The text does not have exactly two digits per output byte
    InvalidLength {
        /// Expected number of characters
        expected: usize,
        /// Actual number of characters
        actual: usize,
    },
    /// A character is not a hexadecimal digit
    InvalidDigit {
        /// Byte offset of the offending character
        index: usize,
    },
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode exactly `2 * N` hex digits into `N` bytes
pub fn decode<const N: usize>(text: &str) -> Result<[u8; N], HexError> {
    let digits = text.as_bytes();
    if digits.len() != N * 2 {
        return Err(HexError::InvalidLength {
            expected: N * 2,
            actual: digits.len(),
        });
    }

    let mut out = [0u8; N];
    for (i, pair) in digits.chunks_exact(2).enumerate() {
        let hi = nibble(pair[0]).ok_or(HexError::InvalidDigit { index: i * 2 })?;
        let lo = nibble(pair[1]).ok_or(HexError::InvalidDigit { index: i * 2 + 1 })?;
        out[i] = (hi << 4) | lo;
    }
    Ok(out)
}

/// Decode 8 hex digits into a 32-bit value, most significant byte first
pub fn decode_u32(text: &str) -> Result<u32, HexError> {
    decode::<4>(text).map(u32::from_be_bytes)
}

/// Encode bytes as upper-case hex digits
///
/// Output stops at the last byte that fits whole if `N` is too small to hold
/// every digit.
pub fn encode_upper<const N: usize>(bytes: &[u8]) -> String<N> {
    let mut out = String::new();
    for byte in bytes {
        if out.capacity() - out.len() < 2 {
            break;
        }
        for digit in [byte >> 4, byte & 0x0F] {
            // Capacity checked above
            let _ = out.push(HEX_UPPER[usize::from(digit)] as char);
        }
    }
    out
}
