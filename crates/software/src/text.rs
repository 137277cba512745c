//! Bounded, length-checked text.
//!
//! Every string the hub keeps (device names, notifications, menu labels) has a fixed capacity. Text that doesn't fit is
//! truncated rather than rejected, always on a UTF-8 character boundary, so a name read back from storage or a message
//! assembled from several parts is never split mid-character.

use core::fmt::{self, Write};
use heapless::String;

/// Copies as much of `s` as fits into a `String<N>`, cutting at a character boundary.
pub fn truncate<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    push_truncated(&mut out, s);
    out
}

/// Appends as much of `s` as fits to `out`. Returns `true` if all of `s` was appended.
pub fn push_truncated<const N: usize>(out: &mut String<N>, s: &str) -> bool {
    let room = N - out.len();
    if s.len() <= room {
        // cannot fail: length was checked above
        let _ = out.push_str(s);
        return true;
    }

    let mut end = room;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let _ = out.push_str(&s[..end]);
    false
}

/// Formats `args` into a `String<N>`, silently dropping whatever overflows the capacity.
///
/// The `heapless` [`Write`] impl rejects an entire fragment which doesn't fit; this keeps the prefix instead, which is
/// what a fixed-width display wants.
pub fn format<const N: usize>(args: fmt::Arguments<'_>) -> String<N> {
    let mut writer = Truncating(String::new());
    // Truncating never reports an error
    let _ = writer.write_fmt(args);
    writer.0
}

struct Truncating<const N: usize>(String<N>);

impl<const N: usize> Write for Truncating<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        push_truncated(&mut self.0, s);
        Ok(())
    }
}

/// Writes `text` into `field`, NUL-padding the remainder.
///
/// At most `field.len() - 1` bytes of text are written so the field always ends in a terminator.
pub fn encode_fixed(text: &str, field: &mut [u8]) {
    field.fill(0);
    let Some(limit) = field.len().checked_sub(1) else {
        return;
    };
    let mut end = text.len().min(limit);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    field[..end].copy_from_slice(&text.as_bytes()[..end]);
}

/// Reads a NUL-terminated name out of a fixed-size field.
///
/// The last byte of the field is treated as a terminator whatever it holds. Bytes that aren't valid UTF-8 end the
/// name early; a corrupt name is shortened, never rejected.
pub fn decode_fixed<const N: usize>(field: &[u8]) -> String<N> {
    let limit = field.len().saturating_sub(1);
    let bytes = &field[..limit];
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let valid = match core::str::from_utf8(&bytes[..len]) {
        Ok(s) => s,
        // valid_up_to() is always a char boundary, so this cannot fail
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    truncate(valid)
}
