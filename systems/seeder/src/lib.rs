#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic seeding of cache existence and cache richness.
//!
//! Every decision is derived from the raw coordinate string of a candidate
//! position, so the world regenerates identically from position alone and
//! only mutated caches need to be persisted.

use geocoin_core::{CellKey, Coin, CoinStack, LatLng};
use sha2::{Digest, Sha256};

/// Scale applied to a seed value to obtain the initial coin count.
pub const COIN_COUNT_SCALE: f64 = 100.0;

/// Maps `key` to a reproducible pseudo-random value in `[0, 1)`.
#[must_use]
pub fn luck(key: &str) -> f64 {
    const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let value = u64::from_le_bytes(bytes) >> 11;
    (value as f64) * SCALE
}

/// Decides whether the candidate tile at `position` hosts a cache.
#[must_use]
pub fn spawns_cache(position: LatLng, cache_chance: f64) -> bool {
    luck(&position.seed_key()) <= cache_chance
}

/// Number of coins a freshly seeded cache at `position` starts with.
#[must_use]
pub fn initial_coin_count(position: LatLng) -> u32 {
    (luck(&position.seed_key()) * COIN_COUNT_SCALE).floor() as u32
}

/// Mints the initial coins of the cache at `position`, keyed by `cell`.
#[must_use]
pub fn seed_coins(cell: &CellKey, position: LatLng) -> CoinStack {
    (0..initial_coin_count(position))
        .map(|ordinal| Coin::mint(cell, ordinal))
        .collect()
}
