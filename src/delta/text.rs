//! UTF-16 aware string helpers.
//!
//! Editor positions count UTF-16 code units, so every length and offset in a
//! delta is measured that way rather than in bytes or chars.

/// Returns the length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Returns the slice of `text` covering `len` UTF-16 units from `start`.
///
/// An offset that falls inside a surrogate pair is rounded up to the next
/// char boundary, so adjacent slices still partition the string exactly.
pub fn utf16_slice(text: &str, start: usize, len: usize) -> &str {
    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, start.saturating_add(len));
    &text[start_byte..end_byte]
}

fn byte_offset(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (byte, ch) in text.char_indices() {
        if seen >= units {
            return byte;
        }
        seen += ch.len_utf16();
    }
    text.len()
}
