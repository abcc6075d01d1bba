//! Tag content validation.

/// Returns true iff `marker` occurs as a contiguous substring of `payload`.
///
/// An empty payload, a payload shorter than the marker, or an empty marker
/// all fail the check.
pub fn contains_marker(payload: &[u8], marker: &[u8]) -> bool {
    if marker.is_empty() || payload.len() < marker.len() {
        return false;
    }
    payload.windows(marker.len()).any(|window| window == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &[u8] = b"scp:";

    #[test]
    fn accepts_marker_anywhere_in_payload() {
        assert!(contains_marker(b"scp:42", MARKER));
        assert!(contains_marker(b"hello scp:42 world", MARKER));
        assert!(contains_marker(b"trailing scp:", MARKER));
    }

    #[test]
    fn rejects_payload_without_marker() {
        assert!(!contains_marker(b"no marker here", MARKER));
        assert!(!contains_marker(b"scp but no colon", MARKER));
    }

    #[test]
    fn rejects_empty_and_short_payloads() {
        assert!(!contains_marker(b"", MARKER));
        assert!(!contains_marker(b"scp", MARKER));
    }

    #[test]
    fn rejects_empty_marker() {
        assert!(!contains_marker(b"anything", b""));
    }
}
