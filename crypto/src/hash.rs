//! Blake2b hashing and lecture fingerprint derivation.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use poap_types::{Fingerprint, Timestamp};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Derive the fingerprint identifying a lecture.
///
/// Input is `name ‖ deadline ‖ metadata_uri`, with the deadline as 8
/// big-endian bytes. The start time is not part of the input.
/// Changing the field set or order changes which lectures collide.
///
/// Fields are concatenated without length prefixes, so two lectures with the
/// same deadline collide when their `name`/`metadata_uri` split the same byte
/// string differently around a copy of the deadline bytes. This is only
/// reachable when those 8 bytes are themselves valid UTF-8.
pub fn lecture_fingerprint(name: &str, deadline: Timestamp, metadata_uri: &str) -> Fingerprint {
    let deadline_be = deadline.as_secs().to_be_bytes();
    Fingerprint::new(blake2b_256_multi(&[
        name.as_bytes(),
        &deadline_be,
        metadata_uri.as_bytes(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        let h1 = blake2b_256(b"hello poap");
        let h2 = blake2b_256(b"hello poap");
        assert_eq!(h1, h2);
    }

    #[test]
    fn blake2b_different_inputs() {
        let h1 = blake2b_256(b"hello");
        let h2 = blake2b_256(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn fingerprint_matches_manual_concatenation() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"Intro");
        buf.extend_from_slice(&200u64.to_be_bytes());
        buf.extend_from_slice(b"ipfs://x");
        let expected = Fingerprint::new(blake2b_256(&buf));
        assert_eq!(lecture_fingerprint("Intro", Timestamp::new(200), "ipfs://x"), expected);
    }

    #[test]
    fn fingerprint_depends_on_every_field() {
        let base = lecture_fingerprint("Intro", Timestamp::new(200), "ipfs://x");
        assert_ne!(base, lecture_fingerprint("Intro2", Timestamp::new(200), "ipfs://x"));
        assert_ne!(base, lecture_fingerprint("Intro", Timestamp::new(201), "ipfs://x"));
        assert_ne!(base, lecture_fingerprint("Intro", Timestamp::new(200), "ipfs://y"));
        assert!(!base.is_zero());
    }

    #[test]
    fn unprefixed_fields_can_collide() {
        // 65 as 8 big-endian bytes is seven NULs then 'A'.
        let deadline = Timestamp::new(65);
        let left = lecture_fingerprint("x", deadline, "\0\0\0\0\0\0\0Ay");
        let right = lecture_fingerprint("x\0\0\0\0\0\0\0A", deadline, "y");
        assert_eq!(left, right);
    }
}
