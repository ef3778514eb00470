// Path: crates/types/src/codec/tests.rs

use super::*;
use proptest::prelude::*;

fn compact_roundtrip(n: u64) -> u64 {
    let mut buf = Vec::new();
    encode_compact(n, &mut buf);
    let mut cursor = buf.as_slice();
    let decoded = decode_compact(&mut cursor).unwrap();
    assert!(cursor.is_empty(), "remainder after decoding {}", n);
    decoded
}

#[test]
fn compact_boundary_vectors() {
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (63, &[0x3F]),
        (64, &[0x80, 0x40]),
        (16383, &[0xBF, 0xFF]),
        (16384, &[0xC0, 0x40, 0x00]),
        (u32::MAX as u64, &[0xF0, 0xFF, 0xFF, 0xFF, 0xFF]),
    ];
    for (value, expected) in cases {
        let mut buf = Vec::new();
        encode_compact(*value, &mut buf);
        assert_eq!(buf.as_slice(), *expected, "encoding of {}", value);
        assert_eq!(compact_roundtrip(*value), *value);
    }
}

#[test]
fn compact_mode_edges_roundtrip() {
    for shift in [6u32, 14, 21, 28, 35, 42, 49, 56] {
        let edge = 1u64 << shift;
        for n in [edge - 1, edge, edge + 1] {
            assert_eq!(compact_roundtrip(n), n);
        }
    }
    assert_eq!(compact_roundtrip(u64::MAX), u64::MAX);
}

#[test]
fn compact_rejects_non_minimal_forms() {
    // 64 encoded as a bare single octet belongs to mode 1, not mode 0.
    assert_eq!(
        decode_compact(&mut &[0x40u8][..]),
        Err(CodecError::Overlong)
    );
    // 63 padded out to the two-octet mode.
    assert_eq!(
        decode_compact(&mut &[0x80u8, 0x3F][..]),
        Err(CodecError::Overlong)
    );
    // 16383 padded out to the three-octet mode.
    assert_eq!(
        decode_compact(&mut &[0xC0u8, 0x3F, 0xFF][..]),
        Err(CodecError::Overlong)
    );
}

#[test]
fn compact_rejects_truncation() {
    assert_eq!(decode_compact(&mut &[][..]), Err(CodecError::Truncated));
    assert_eq!(
        decode_compact(&mut &[0xC0u8, 0x40][..]),
        Err(CodecError::Truncated)
    );
}

#[test]
fn fixed_integers_are_little_endian() {
    let mut buf = Vec::new();
    encode_fixed(0x0102_0304, 4, &mut buf).unwrap();
    assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01]);
    assert_eq!(decode_fixed(&mut buf.as_slice(), 4).unwrap(), 0x0102_0304);
}

#[test]
fn fixed_integer_overflow_is_rejected() {
    let mut buf = Vec::new();
    assert_eq!(
        encode_fixed(256, 1, &mut buf),
        Err(CodecError::Overflow)
    );
}

#[test]
fn boolean_rejects_out_of_range_octets() {
    assert_eq!(bool::decode(&mut &[0x00u8][..]), Ok(false));
    assert_eq!(bool::decode(&mut &[0x01u8][..]), Ok(true));
    assert_eq!(
        bool::decode(&mut &[0x02u8][..]),
        Err(CodecError::BadBoolean(0x02))
    );
}

#[test]
fn option_roundtrip_and_rejection() {
    let absent: Option<u32> = None;
    let present: Option<u32> = Some(7);
    assert_eq!(
        from_bytes_canonical::<Option<u32>>(&to_bytes_canonical(&absent)).unwrap(),
        absent
    );
    assert_eq!(
        from_bytes_canonical::<Option<u32>>(&to_bytes_canonical(&present)).unwrap(),
        present
    );
    assert_eq!(
        Option::<u32>::decode(&mut &[0x05u8][..]),
        Err(CodecError::BadBoolean(0x05))
    );
}

#[test]
fn dictionary_orders_keys_by_encoded_bytes() {
    // Little-endian u32 keys: numeric order differs from lexicographic
    // order of the encodings (256 encodes as 00 01 00 00, before 01 00 00 00).
    let mut dict = BTreeMap::new();
    dict.insert(1u32, 10u32);
    dict.insert(256u32, 20u32);
    let encoded = to_bytes_canonical(&dict);
    let decoded: BTreeMap<u32, u32> = from_bytes_canonical(&encoded).unwrap();
    assert_eq!(decoded, dict);

    // The 256 entry must appear first in the body.
    let mut cursor = encoded.as_slice();
    let body_len = decode_compact(&mut cursor).unwrap() as usize;
    assert_eq!(cursor.len(), body_len);
    assert_eq!(u32::decode(&mut cursor).unwrap(), 256);
}

#[test]
fn dictionary_rejects_key_disorder() {
    let mut body = Vec::new();
    2u32.encode_to(&mut body);
    0u32.encode_to(&mut body);
    1u32.encode_to(&mut body);
    0u32.encode_to(&mut body);
    let mut encoded = Vec::new();
    encode_blob(&body, &mut encoded);
    assert_eq!(
        from_bytes_canonical::<BTreeMap<u32, u32>>(&encoded),
        Err(CodecError::DictKeyDisorder)
    );
}

#[test]
fn dictionary_rejects_truncated_body() {
    // Body length claims more than the pairs provide: the final pair is cut
    // mid-value and must raise Truncated, never a silent partial decode.
    let mut body = Vec::new();
    1u32.encode_to(&mut body);
    body.extend_from_slice(&[0xAA, 0xBB]); // half a u32 value
    let mut encoded = Vec::new();
    encode_blob(&body, &mut encoded);
    assert_eq!(
        from_bytes_canonical::<BTreeMap<u32, u32>>(&encoded),
        Err(CodecError::Truncated)
    );
}

#[test]
fn set_encodes_ascending_and_rejects_disorder() {
    let mut set = std::collections::BTreeSet::new();
    set.insert([3u8; 32]);
    set.insert([1u8; 32]);
    set.insert([2u8; 32]);
    let encoded = to_bytes_canonical(&set);
    assert_eq!(encoded[0], 3); // compact count
    assert_eq!(&encoded[1..33], &[1u8; 32]);
    let decoded: std::collections::BTreeSet<[u8; 32]> = from_bytes_canonical(&encoded).unwrap();
    assert_eq!(decoded, set);

    // Swap the first two elements on the wire: decode must reject.
    let mut disordered = encoded.clone();
    disordered[1..33].copy_from_slice(&[2u8; 32]);
    disordered[33..65].copy_from_slice(&[1u8; 32]);
    assert_eq!(
        from_bytes_canonical::<std::collections::BTreeSet<[u8; 32]>>(&disordered),
        Err(CodecError::DictKeyDisorder)
    );
}

#[test]
fn canonical_decode_rejects_trailing_bytes() {
    let mut encoded = to_bytes_canonical(&42u32);
    encoded.push(0x00);
    assert!(matches!(
        from_bytes_canonical::<u32>(&encoded),
        Err(CodecError::LengthMismatch { .. })
    ));
}

#[test]
fn bounded_vec_enforces_context_limit() {
    let values = vec![1u8, 2, 3, 4];
    let encoded = to_bytes_canonical(&values);
    let mut cursor = encoded.as_slice();
    assert!(matches!(
        decode_bounded_vec::<u8>(&mut cursor, 3),
        Err(CodecError::LengthMismatch { expected: 3, got: 4 })
    ));
}

#[test]
fn vec_of_bytes_matches_blob_encoding() {
    let bytes = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
    let mut blob = Vec::new();
    encode_blob(&bytes, &mut blob);
    assert_eq!(to_bytes_canonical(&bytes), blob);
}

proptest! {
    #[test]
    fn compact_roundtrips(n in any::<u64>()) {
        prop_assert_eq!(compact_roundtrip(n), n);
    }

    #[test]
    fn compact_encodings_order_preserving_in_length(a in any::<u64>(), b in any::<u64>()) {
        // A larger value never has a shorter encoding.
        let (mut ea, mut eb) = (Vec::new(), Vec::new());
        encode_compact(a, &mut ea);
        encode_compact(b, &mut eb);
        if a <= b {
            prop_assert!(ea.len() <= eb.len());
        }
    }

    #[test]
    fn blob_roundtrips(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut encoded = Vec::new();
        encode_blob(&bytes, &mut encoded);
        let mut cursor = encoded.as_slice();
        let decoded = decode_blob(&mut cursor).unwrap();
        prop_assert!(cursor.is_empty());
        prop_assert_eq!(decoded, bytes);
    }

    #[test]
    fn dict_roundtrips(entries in proptest::collection::btree_map(any::<u32>(), any::<u64>(), 0..64)) {
        let encoded = to_bytes_canonical(&entries);
        let decoded: BTreeMap<u32, u64> = from_bytes_canonical(&encoded).unwrap();
        prop_assert_eq!(decoded, entries);
    }

    #[test]
    fn well_formed_bytes_reencode_identically(n in any::<u64>()) {
        let mut buf = Vec::new();
        encode_compact(n, &mut buf);
        let mut cursor = buf.as_slice();
        let decoded = decode_compact(&mut cursor).unwrap();
        let mut rebuf = Vec::new();
        encode_compact(decoded, &mut rebuf);
        prop_assert_eq!(buf, rebuf);
    }
}
