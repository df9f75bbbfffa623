//! Plain-text decoding.

/// Decode bytes as UTF-8, dropping any invalid sequences, and trim.
///
/// Never fails: undecodable input yields whatever valid text surrounds it,
/// possibly the empty string.
pub(super) fn extract_text(bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        decoded.push_str(chunk.valid());
    }
    decoded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8() {
        assert_eq!(extract_text("  héllo wörld\n".as_bytes()), "héllo wörld");
    }

    #[test]
    fn test_invalid_sequences_are_dropped() {
        let bytes = [b'a', 0xff, 0xfe, b'b', 0xc3, b'c'];
        assert_eq!(extract_text(&bytes), "abc");
    }

    #[test]
    fn test_never_fails() {
        for bytes in [&[][..], &[0x80][..], &[0xf0, 0x9f][..], &[0u8; 64][..]] {
            let text = extract_text(bytes);
            assert!(text.len() <= bytes.len());
        }
        assert_eq!(extract_text(&[0xc0, 0xc1, 0xf5]), "");
    }
}
