//! Property tests for share envelope integrity

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quickcheck_macros::quickcheck;
use sharevault::VaultError;
use sharevault::codec::ShareCodec;
use sharevault::domain::{EncodedShare, NodeCount, NodeIndex, RecordId, Share};
use sharevault::key::SharingKey;

fn split_three(secret: &str) -> (ShareCodec, Vec<Share>) {
    let codec = ShareCodec::new(SharingKey::generate(1), NodeCount::new(3).unwrap());
    let record_id = RecordId::generate();
    let shares = codec
        .split(secret, 3)
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(idx, value)| Share {
            record_id,
            node_index: NodeIndex::new(u8::try_from(idx).unwrap()).unwrap(),
            value,
        })
        .collect();
    (codec, shares)
}

/// Flipping any bit of any share is detected
#[quickcheck]
fn prop_bit_flip_detected(secret: String, which: usize, position: usize, bit: u8) -> bool {
    let (codec, mut shares) = split_three(&secret);
    let target = which % shares.len();

    let mut raw = STANDARD.decode(shares[target].value.as_str()).unwrap();
    let position = position % raw.len();
    raw[position] ^= 1 << (bit % 8);
    shares[target].value = EncodedShare::new(STANDARD.encode(raw));

    matches!(
        codec.combine(&shares),
        Err(VaultError::ShareMismatch(_) | VaultError::Combine(_))
    )
}

/// Truncated envelopes are rejected as malformed
#[quickcheck]
fn prop_truncation_detected(secret: String, which: usize, keep: usize) -> bool {
    let (codec, mut shares) = split_three(&secret);
    let target = which % shares.len();

    let raw = STANDARD.decode(shares[target].value.as_str()).unwrap();
    let keep = keep % raw.len();
    shares[target].value = EncodedShare::new(STANDARD.encode(&raw[..keep]));

    matches!(codec.combine(&shares), Err(VaultError::Combine(_)))
}

/// A share presented as coming from another node is rejected
#[quickcheck]
fn prop_swapped_node_index_rejected(secret: String) -> bool {
    let (codec, mut shares) = split_three(&secret);
    let first = shares[0].value.clone();
    shares[0].value = shares[1].value.clone();
    shares[1].value = first;

    matches!(codec.combine(&shares), Err(VaultError::ShareMismatch(_)))
}
