//! Chunk codec: splits an encoded file payload into size-bounded fragments
//! on write and reassembles them in index order on read.
//!
//! Fragments carry no delimiter or length prefix — boundaries are implicit
//! and are reconstructed only by replaying the fragments in order. The
//! chunk size is chosen by the caller to stay under the key-value backend's
//! per-value payload ceiling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing chunk at index {index}")]
    MissingChunk { index: u32 },
}

/// Split `payload` into fragments of at most `max_chunk_bytes` bytes,
/// preserving order. The final fragment may be shorter. An empty payload
/// yields no fragments.
///
/// Splits only on character boundaries, so multi-byte content survives a
/// round trip even though typical payloads (base64 / data URLs) are ASCII.
pub fn split(payload: &str, max_chunk_bytes: usize) -> Vec<String> {
    assert!(max_chunk_bytes > 0, "chunk size must be positive");

    let mut fragments = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let mut end = max_chunk_bytes.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        fragments.push(head.to_string());
        rest = tail;
    }
    fragments
}

/// Reassemble fragments in index order. Strict inverse of [`split`] given
/// the same fragment sequence; any absent fragment aborts with
/// [`CodecError::MissingChunk`] rather than returning partial data.
pub fn join(fragments: Vec<Option<String>>) -> Result<String, CodecError> {
    let mut payload = String::new();
    for (index, fragment) in fragments.into_iter().enumerate() {
        match fragment {
            Some(part) => payload.push_str(&part),
            None => {
                return Err(CodecError::MissingChunk {
                    index: index as u32,
                });
            }
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(payload: &str, chunk_size: usize) -> String {
        let fragments = split(payload, chunk_size)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        join(fragments).unwrap()
    }

    #[test]
    fn split_then_join_restores_payload() {
        let payload = "data:text/plain;base64,SGVsbG8gd29ybGQh";
        for chunk_size in [1, 2, 3, 7, 16, 1024] {
            assert_eq!(roundtrip(payload, chunk_size), payload);
        }
    }

    #[test]
    fn fragments_respect_size_bound() {
        let payload = "A".repeat(1000);
        let fragments = split(&payload, 64);
        for fragment in &fragments {
            assert!(fragment.len() <= 64);
        }
        // all but the last are exactly full
        for fragment in &fragments[..fragments.len() - 1] {
            assert_eq!(fragment.len(), 64);
        }
    }

    #[test]
    fn uneven_payload_leaves_short_tail() {
        let fragments = split("abcdefgh", 3);
        assert_eq!(fragments, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn empty_payload_yields_no_fragments() {
        assert!(split("", 750 * 1024).is_empty());
        assert_eq!(join(Vec::new()).unwrap(), "");
    }

    #[test]
    fn multibyte_characters_survive_splitting() {
        let payload = "héllo wörld ☃ çödé".repeat(20);
        assert_eq!(roundtrip(&payload, 5), payload);
    }

    #[test]
    fn missing_fragment_fails_with_its_index() {
        let mut fragments = split("abcdefghij", 2)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        fragments[3] = None;
        match join(fragments) {
            Err(CodecError::MissingChunk { index }) => assert_eq!(index, 3),
            other => panic!("expected MissingChunk, got {:?}", other),
        }
    }
}
