//! Repeating-key XOR stream.
//!
//! The key stream is the key repeated forever; `offset` is the position in
//! that stream where `buf[0]` lands. Applying the same call twice restores
//! the input.

/// XOR `buf` in place against `key` starting at key-stream position `offset`.
///
/// Returns the key-stream position for the byte following `buf`, i.e.
/// `(offset + buf.len()) % key.len()`. An empty key leaves `buf` untouched
/// and returns 0.
pub fn apply_keystream(buf: &mut [u8], key: &[u8], offset: usize) -> usize {
    if key.is_empty() {
        return 0;
    }

    let start = offset % key.len();
    for (byte, k) in buf.iter_mut().zip(key.iter().cycle().skip(start)) {
        *byte ^= k;
    }

    (start + buf.len() % key.len()) % key.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_is_self_inverse() {
        let key = b"secret";
        let original = b"The quick brown fox jumps over the lazy dog".to_vec();

        for offset in 0..key.len() * 2 {
            let mut buf = original.clone();
            apply_keystream(&mut buf, key, offset);
            assert_ne!(buf, original);
            apply_keystream(&mut buf, key, offset);
            assert_eq!(buf, original, "offset {offset}");
        }
    }

    #[test]
    fn split_chunks_match_single_pass() {
        let key = b"k3y!x";
        let data: Vec<u8> = (0u8..=200).collect();

        for split in [0, 1, 4, 5, 17, 100, data.len()] {
            for start in 0..key.len() {
                let mut whole = data.clone();
                apply_keystream(&mut whole, key, start);

                let (left, right) = data.split_at(split);
                let mut left = left.to_vec();
                let mut right = right.to_vec();
                let next = apply_keystream(&mut left, key, start);
                assert_eq!(next, (start + split) % key.len());
                apply_keystream(&mut right, key, next);

                left.extend_from_slice(&right);
                assert_eq!(left, whole, "split {split} start {start}");
            }
        }
    }

    #[test]
    fn known_vector() {
        let mut buf = b"AAAA".to_vec();
        let next = apply_keystream(&mut buf, b"key", 0);
        assert_eq!(buf, vec![b'A' ^ b'k', b'A' ^ b'e', b'A' ^ b'y', b'A' ^ b'k']);
        assert_eq!(next, 1);

        let mut buf = b"BB".to_vec();
        let next = apply_keystream(&mut buf, b"key", next);
        assert_eq!(buf, vec![b'B' ^ b'e', b'B' ^ b'y']);
        assert_eq!(next, 0);
    }

    #[test]
    fn empty_inputs() {
        let mut buf = Vec::new();
        assert_eq!(apply_keystream(&mut buf, b"key", 2), 2);

        let mut buf = b"abc".to_vec();
        assert_eq!(apply_keystream(&mut buf, b"", 5), 0);
        assert_eq!(buf, b"abc");
    }
}
