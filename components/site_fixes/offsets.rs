/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fixed-width encoding of record byte ranges.
//!
//! Every record occupies a 7 character slot: 4 base-36 digits of start
//! offset followed by 3 base-36 digits of length, zero padded, with no
//! separators.

use crate::index::IndexError;

const OFFSET_DIGITS: usize = 4;
const LENGTH_DIGITS: usize = 3;
pub const RECORD_WIDTH: usize = OFFSET_DIGITS + LENGTH_DIGITS;

/// Largest start offset that fits in a slot (`36^4 - 1`).
pub const MAX_OFFSET: usize = 36 * 36 * 36 * 36 - 1;
/// Largest record length that fits in a slot (`36^3 - 1`).
pub const MAX_LENGTH: usize = 36 * 36 * 36 - 1;

fn push_base36(out: &mut String, mut value: usize, width: usize) {
    let mut digits = [b'0'; OFFSET_DIGITS];
    for slot in digits[..width].iter_mut().rev() {
        let digit = (value % 36) as u32;
        // `from_digit` only fails for digit >= radix.
        *slot = char::from_digit(digit, 36).map_or(b'0', |c| c as u8);
        value /= 36;
    }
    out.extend(digits[..width].iter().map(|&b| b as char));
}

/// Encode `(start, length)` pairs into the compact offsets string.
pub fn encode_offsets(offsets: &[(usize, usize)]) -> Result<String, IndexError> {
    let mut encoded = String::with_capacity(offsets.len() * RECORD_WIDTH);
    for &(start, length) in offsets {
        if start > MAX_OFFSET || length > MAX_LENGTH {
            return Err(IndexError::RecordOutOfRange { start, length });
        }
        push_base36(&mut encoded, start, OFFSET_DIGITS);
        push_base36(&mut encoded, length, LENGTH_DIGITS);
    }
    Ok(encoded)
}

/// Number of records stored in an offsets string.
pub fn record_count(offsets: &str) -> usize {
    debug_assert_eq!(offsets.len() % RECORD_WIDTH, 0, "corrupted offsets table");
    offsets.len() / RECORD_WIDTH
}

/// Decode slot `index` into a `(start, end)` byte range.
pub fn decode_offset(offsets: &str, index: usize) -> Option<(usize, usize)> {
    debug_assert_eq!(offsets.len() % RECORD_WIDTH, 0, "corrupted offsets table");
    let base = RECORD_WIDTH * index;
    let slot = offsets.get(base..base + RECORD_WIDTH)?;
    let start = usize::from_str_radix(&slot[..OFFSET_DIGITS], 36).ok()?;
    let length = usize::from_str_radix(&slot[OFFSET_DIGITS..], 36).ok()?;
    Some((start, start + length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_zero_padded() {
        let encoded = encode_offsets(&[(0, 5), (36, 36)]).unwrap();
        assert_eq!(encoded, "00000050010010");
        assert_eq!(record_count(&encoded), 2);
    }

    #[test]
    fn round_trip_at_the_limits() {
        for &(start, length) in &[(0, 0), (1, 1), (MAX_OFFSET, MAX_LENGTH), (12345, 678)] {
            let encoded = encode_offsets(&[(start, length)]).unwrap();
            assert_eq!(encoded.len(), RECORD_WIDTH);
            assert_eq!(decode_offset(&encoded, 0), Some((start, start + length)));
        }
    }

    #[test]
    fn out_of_range_records_are_rejected() {
        assert!(encode_offsets(&[(MAX_OFFSET + 1, 0)]).is_err());
        assert!(encode_offsets(&[(0, MAX_LENGTH + 1)]).is_err());
    }

    #[test]
    fn decoding_past_the_end_is_none() {
        let encoded = encode_offsets(&[(3, 4)]).unwrap();
        assert_eq!(decode_offset(&encoded, 1), None);
    }
}
