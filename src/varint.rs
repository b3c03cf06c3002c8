//! Self-delimiting byte-length prefix.
//!
//! Lengths below 250 are a single literal byte. Larger lengths are written as
//! an escape byte `249 + k` followed by the length in `k` big-endian bytes,
//! `1 <= k <= 6`, so the largest encodable length is `2^48 - 1`.
//!
//! ```text
//! 0..=249       -> [len]
//! 250..=2^48-1  -> [249 + k, be(len; k bytes)]
//! ```

use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// First escape byte; anything below it is a literal length.
pub const ESCAPE_BASE: u8 = 250;

/// Maximum number of big-endian bytes following an escape byte.
pub const MAX_LENGTH_BYTES: usize = 6;

/// Largest length the prefix can describe.
pub const MAX_LENGTH: u64 = (1 << (8 * MAX_LENGTH_BYTES)) - 1;

fn byte_width(n: u64) -> usize {
    let bits = 64 - n.leading_zeros() as usize;
    ((bits + 7) / 8).max(1)
}

/// Append the encoded form of `len` to `w`.
pub fn write_length(w: &mut Vec<u8>, len: u64) -> Result<(), EncodeError> {
    if len < ESCAPE_BASE as u64 {
        w.push(len as u8);
        return Ok(());
    }
    let k = byte_width(len);
    if k > MAX_LENGTH_BYTES {
        return Err(EncodeError::LengthTooLarge(len));
    }
    w.push(ESCAPE_BASE - 1 + k as u8);
    // Vec<u8> writes are infallible.
    let _ = w.write_uint::<BigEndian>(len, k);
    Ok(())
}

/// Encode `len` as a standalone byte string.
pub fn encode_length(len: u64) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(1 + MAX_LENGTH_BYTES);
    write_length(&mut out, len)?;
    Ok(out)
}

/// Decode a length starting at `offset`. Returns `(length, bytes consumed)`.
///
/// The length is not checked against the rest of the buffer; callers slicing
/// a payload must do that.
pub fn decode_length(bytes: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let rest = bytes.get(offset..).unwrap_or(&[]);
    let b = *rest.first().ok_or_else(|| DecodeError::truncated(1, 0))?;
    if b < ESCAPE_BASE {
        return Ok((b as u64, 1));
    }
    let k = (b - (ESCAPE_BASE - 1)) as usize;
    let tail = &rest[1..];
    if tail.len() < k {
        return Err(DecodeError::truncated(k, tail.len()));
    }
    Ok((BigEndian::read_uint(&tail[..k], k), 1 + k))
}

/// Like [`decode_length`] but converts to `usize` for slicing.
pub(crate) fn decode_usize(bytes: &[u8], offset: usize) -> Result<(usize, usize), DecodeError> {
    let (len, consumed) = decode_length(bytes, offset)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::new(DecodeErrorKind::LengthOverflow(len)))?;
    Ok((len, consumed))
}
