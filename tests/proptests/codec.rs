//! Property tests for split/combine workflows

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use sharevault::VaultError;
use sharevault::codec::ShareCodec;
use sharevault::domain::{EncodedShare, NodeCount, NodeIndex, RecordId, Share};
use sharevault::key::SharingKey;

/// Node group size, kept small so each case stays fast
#[derive(Clone, Copy, Debug)]
struct GroupSize(u8);

impl Arbitrary for GroupSize {
    fn arbitrary(g: &mut Gen) -> Self {
        GroupSize((u8::arbitrary(g) % 9) + 2) // 2..=10
    }
}

fn codec(size: GroupSize) -> ShareCodec {
    let node_count = NodeCount::new(size.0).unwrap_or_else(|_| unreachable!("2..=10 is valid"));
    ShareCodec::new(SharingKey::generate(1), node_count)
}

fn tag(encoded: Vec<EncodedShare>, record_id: RecordId) -> Vec<Share> {
    encoded
        .into_iter()
        .enumerate()
        .map(|(idx, value)| Share {
            record_id,
            node_index: NodeIndex::new(u8::try_from(idx).unwrap()).unwrap(),
            value,
        })
        .collect()
}

/// Every string, including the empty one, survives a split/combine cycle
#[quickcheck]
fn prop_split_combine_round_trip(secret: String, size: GroupSize) -> bool {
    let codec = codec(size);
    let Ok(encoded) = codec.split(&secret, usize::from(size.0)) else {
        return false;
    };
    let shares = tag(encoded, RecordId::generate());

    codec
        .combine(&shares)
        .is_ok_and(|recovered| recovered.as_str() == secret)
}

/// Share order does not matter
#[quickcheck]
fn prop_combine_order_independent(secret: String, size: GroupSize, rotate: usize) -> bool {
    let codec = codec(size);
    let Ok(encoded) = codec.split(&secret, usize::from(size.0)) else {
        return false;
    };
    let mut shares = tag(encoded, RecordId::generate());
    let len = shares.len();
    shares.rotate_left(rotate % len);
    shares.reverse();

    codec
        .combine(&shares)
        .is_ok_and(|recovered| recovered.as_str() == secret)
}

/// Dropping any share leaves the set incomplete
#[quickcheck]
fn prop_missing_share_is_incomplete(secret: String, size: GroupSize, drop_at: usize) -> bool {
    let codec = codec(size);
    let Ok(encoded) = codec.split(&secret, usize::from(size.0)) else {
        return false;
    };
    let mut shares = tag(encoded, RecordId::generate());
    let n = shares.len();
    shares.remove(drop_at % n);

    matches!(
        codec.combine(&shares),
        Err(VaultError::IncompleteShareSet { expected, got }) if expected == n && got == n - 1
    )
}

/// A repeated node index is a mismatch, never a successful combine
#[quickcheck]
fn prop_duplicate_index_rejected(secret: String, size: GroupSize, dup: usize) -> bool {
    duplicate_index_rejected(&secret, size, dup)
}

#[test]
fn test_duplicate_index_rejected_at_position_extremes() {
    for dup in [0, 1, usize::MAX - 1, usize::MAX] {
        assert!(duplicate_index_rejected("", GroupSize(2), dup));
        assert!(duplicate_index_rejected("hunter2", GroupSize(5), dup));
    }
}

fn duplicate_index_rejected(secret: &str, size: GroupSize, dup: usize) -> bool {
    let codec = codec(size);
    let Ok(encoded) = codec.split(secret, usize::from(size.0)) else {
        return false;
    };
    let mut shares = tag(encoded, RecordId::generate());
    let n = shares.len();
    let copy = shares[dup % n].clone();
    shares[(dup % n + 1) % n] = copy;

    matches!(codec.combine(&shares), Err(VaultError::ShareMismatch(_)))
}

/// Shares produced under one key never combine under another
#[quickcheck]
fn prop_foreign_key_rejected(secret: String, size: GroupSize) -> bool {
    let writer = codec(size);
    let reader = codec(size);
    let Ok(encoded) = writer.split(&secret, usize::from(size.0)) else {
        return false;
    };
    let shares = tag(encoded, RecordId::generate());

    matches!(reader.combine(&shares), Err(VaultError::ShareMismatch(_)))
}
