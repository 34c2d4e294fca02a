//! Property tests for the canonical key codec
//!
//! - Injectivity: distinct keys never share an encoding
//! - Order consistency: segment-wise order equals byte-wise encoded order
//! - Round trip: decode(encode(k)) == k

use std::cmp::Ordering;

use actorhost_core::codec::{compare, decode, encode};
use actorhost_core::{Key, ListQuery, Limits};
use proptest::prelude::*;

/// Segments biased towards the bytes the escaping scheme cares about
fn segment() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(0x00u8), Just(0x01u8), Just(0xFFu8), any::<u8>()],
        0..8,
    )
}

fn key() -> impl Strategy<Value = Key> {
    prop::collection::vec(segment(), 0..5).prop_map(|segments| Key::new(segments))
}

proptest! {
    #[test]
    fn encoding_is_injective(a in key(), b in key()) {
        let (ea, eb) = (encode(&a).unwrap(), encode(&b).unwrap());
        prop_assert_eq!(a == b, ea == eb);
    }

    #[test]
    fn encoding_preserves_order(a in key(), b in key()) {
        let (ea, eb) = (encode(&a).unwrap(), encode(&b).unwrap());
        prop_assert_eq!(a.cmp(&b), compare(&ea, &eb));
    }

    #[test]
    fn decode_inverts_encode(k in key()) {
        let encoded = encode(&k).unwrap();
        prop_assert_eq!(decode(encoded.as_bytes()).unwrap(), k);
    }

    #[test]
    fn prefix_range_matches_starts_with(prefix in key(), k in key()) {
        let range = ListQuery::Prefix(prefix.clone()).compile(&Limits::default()).unwrap();
        prop_assert_eq!(range.contains(&encode(&k).unwrap()), k.starts_with(&prefix));
    }
}

#[test]
fn less_than_is_strict_for_extended_keys() {
    let parent = encode(&Key::new(["a"])).unwrap();
    let child = encode(&Key::new(["a", ""])).unwrap();
    assert_eq!(compare(&parent, &child), Ordering::Less);
}
