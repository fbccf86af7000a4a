//! Bob Jenkins' lookup3 `hashlittle2`, used for root path name hashes
//!
//! Root entries are keyed by a 64-bit hash of the normalized file path. The
//! two 32-bit outputs of `hashlittle2` are combined as `(pc << 32) | pb`.

/// Compute `hashlittle2` over `key`, returning `(pc, pb)`.
///
/// Both seeds are zero for path hashing.
pub fn hashlittle2(key: &[u8], pc_seed: u32, pb_seed: u32) -> (u32, u32) {
    let mut a = 0xdead_beef_u32
        .wrapping_add(u32::try_from(key.len()).unwrap_or(u32::MAX))
        .wrapping_add(pc_seed);
    let mut b = a;
    let mut c = a.wrapping_add(pb_seed);

    if key.is_empty() {
        return (c, b);
    }

    let mut k = key;
    while k.len() > 12 {
        a = a.wrapping_add(word(&k[0..4]));
        b = b.wrapping_add(word(&k[4..8]));
        c = c.wrapping_add(word(&k[8..12]));
        mix(&mut a, &mut b, &mut c);
        k = &k[12..];
    }

    // Missing tail bytes contribute nothing, so zero padding matches the
    // byte-wise switch in lookup3.c.
    let mut tail = [0u8; 12];
    tail[..k.len()].copy_from_slice(k);
    a = a.wrapping_add(word(&tail[0..4]));
    b = b.wrapping_add(word(&tail[4..8]));
    c = c.wrapping_add(word(&tail[8..12]));

    final_mix(&mut a, &mut b, &mut c);
    (c, b)
}

/// 64-bit path hash: `(pc << 32) | pb` of `hashlittle2` with zero seeds.
pub fn hash64(key: &[u8]) -> u64 {
    let (pc, pb) = hashlittle2(key, 0, 0);
    (u64::from(pc) << 32) | u64::from(pb)
}

fn word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);

    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);

    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);

    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);

    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);

    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn final_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));

    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));

    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));

    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));

    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));

    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));

    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_skips_final_mix() {
        assert_eq!(hashlittle2(b"", 0, 0), (0xdead_beef, 0xdead_beef));
    }

    #[test]
    fn test_lookup3_reference_vectors() {
        assert_eq!(
            hashlittle2(b"Four score and seven years ago", 0, 0),
            (0x1777_0551, 0xce72_26e6)
        );
        assert_eq!(
            hashlittle2(b"Four score and seven years ago", 1, 0),
            (0xcd62_8161, 0x6cbe_a4b3)
        );
    }

    #[test]
    fn test_tail_lengths_match_hashlittle() {
        // pc of hashlittle2 equals hashlittle() for the same seed
        let cases: [(&[u8], u32); 6] = [
            (b"a", 0x58d6_8708),
            (b"abcd", 0xb5f4_889c),
            (b"abcdefgh", 0x2995_c3be),
            (b"abcdefghijk", 0x5f61_edf8),
            (b"abcdefghijkl", 0x4012_f87b),
            (b"abcdefghijklm", 0x9281_28f9),
        ];

        for (data, expected) in cases {
            let (pc, _) = hashlittle2(data, 0, 0);
            assert_eq!(pc, expected, "len {}", data.len());
        }
    }

    #[test]
    fn test_hash64_layout() {
        let (pc, pb) = hashlittle2(b"Four score and seven years ago", 0, 0);
        assert_eq!(
            hash64(b"Four score and seven years ago"),
            (u64::from(pc) << 32) | u64::from(pb)
        );
    }
}
