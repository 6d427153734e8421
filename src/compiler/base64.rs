//! Base64 rotation generation for the `base64` string modifier (spec.md §4.4).
//!
//! A literal embedded inside an arbitrary base64 stream can fall at one of
//! three byte alignments relative to the stream's 3-byte encoding groups.
//! Generating all three rotations up front means at least one is guaranteed
//! to appear verbatim in the encoded stream regardless of where the literal
//! actually sits (spec.md §8, property 7).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Generate the three base64 rotations of `raw`.
pub fn rotations(raw: &[u8]) -> [Vec<u8>; 3] {
    std::array::from_fn(|k| rotation(raw, k))
}

fn rotation(raw: &[u8], k: usize) -> Vec<u8> {
    let mut padded = vec![0u8; k];
    padded.extend_from_slice(raw);

    let encoded = STANDARD.encode(&padded);
    let dropped = encoded.chars().skip(2 * k).collect::<String>();
    dropped.trim_end_matches('=').into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_zero_is_the_plain_encoding() {
        let rotations = rotations(b"secret");
        assert_eq!(rotations[0], b"c2VjcmV0".to_vec());
    }

    #[test]
    fn some_rotation_occurs_regardless_of_stream_alignment() {
        let literal = b"secret";
        let rotations = rotations(literal);

        for phase in 0..3 {
            let mut stream = vec![b'x'; phase];
            stream.extend_from_slice(literal);
            stream.extend_from_slice(b"yy");

            let encoded = STANDARD.encode(&stream);
            let encoded_bytes = encoded.trim_end_matches('=').as_bytes();

            let found = rotations.iter().any(|r| {
                !r.is_empty()
                    && encoded_bytes
                        .windows(r.len())
                        .any(|w| w == r.as_slice())
            });
            assert!(found, "no rotation matched at phase {phase}");
        }
    }
}
