//! Reward selection from a delivered random word.
//!
//! Everything here is a pure function of `(word, request_id, draw_index, tag)`
//! so that anyone holding the oracle answer can reproduce the outcome (the
//! oracle relies on this to pass the right ledger accounts to
//! `fulfill_randomness`).

use solana_sha256_hasher::hashv;

use crate::state::AmountRange;

pub const DRAW_TAG: &[u8] = b"lootbox-protocol:draw_v1";
pub const AMOUNT_TAG: &[u8] = b"lootbox-protocol:amount_v1";

/// `u64_le(sha256(tag || word || request_id_le || index_le)[0..8])`
pub fn derive_u64(tag: &[u8], word: &[u8; 32], request_id: u64, index: u32) -> u64 {
    let h = hashv(&[
        tag,
        word.as_ref(),
        request_id.to_le_bytes().as_ref(),
        index.to_le_bytes().as_ref(),
    ])
    .to_bytes();

    u64::from_le_bytes([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7]])
}

/// Picks `count` distinct indices out of `0..pool_len` (partial Fisher-Yates,
/// swap-removal from a shrinking pool). `count` is clamped to `pool_len`.
pub fn draw_indices(word: &[u8; 32], request_id: u64, pool_len: usize, count: usize) -> Vec<usize> {
    let count = count.min(pool_len);
    let mut pool: Vec<usize> = (0..pool_len).collect();
    let mut picked = Vec::with_capacity(count);

    for i in 0..count {
        let remaining = pool.len() as u64;
        let j = (derive_u64(DRAW_TAG, word, request_id, i as u32) % remaining) as usize;
        picked.push(pool.swap_remove(j));
    }

    picked
}

/// Amount for draw `index`, uniform-ish over the inclusive range.
pub fn derive_amount(word: &[u8; 32], request_id: u64, index: u32, range: AmountRange) -> u64 {
    debug_assert!(range.max >= range.min);
    let width = (range.max as u128) - (range.min as u128) + 1;
    let r = derive_u64(AMOUNT_TAG, word, request_id, index) as u128;
    (range.min as u128 + r % width) as u64
}
