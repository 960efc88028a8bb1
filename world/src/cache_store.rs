//! Table of in-memory caches keyed by cell.

use std::collections::{BTreeMap, BTreeSet};

use geocoin_core::{transfer, CellKey, Coin, CoinStack, LatLng};
use geocoin_system_seeder::seed_coins;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{momento, storage::Storage, WorldError};

/// Coin population of a single cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    coins: CoinStack,
}

impl Cache {
    /// Creates a cache holding the provided coins.
    #[must_use]
    pub fn from_coins(coins: CoinStack) -> Self {
        Self { coins }
    }

    /// Coins held by the cache in order.
    #[must_use]
    pub fn coins(&self) -> &CoinStack {
        &self.coins
    }

    /// Number of coins held by the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coins.len()
    }

    /// Reports whether the cache holds no coins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

/// Owns every cache resident in memory and tracks which ones changed since
/// they were last persisted.
#[derive(Debug, Default)]
pub struct CacheStore {
    caches: BTreeMap<CellKey, Cache>,
    modified: BTreeSet<CellKey>,
}

impl CacheStore {
    /// Creates an empty cache table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cache hosted at `position`, bringing it into memory first.
    ///
    /// A resident entry is returned as is. Otherwise the persisted momento is
    /// restored, and only when none exists (or it is unreadable) are fresh
    /// coins seeded from the position.
    pub fn get_or_create<S>(&mut self, storage: &S, position: LatLng, quantization: f64) -> &Cache
    where
        S: Storage + ?Sized,
    {
        let key = CellKey::from_position(position, quantization);
        if !self.caches.contains_key(&key) {
            let cache = match load_momento(storage, &key) {
                Some(cache) => cache,
                None => {
                    let coins = seed_coins(&key, position);
                    debug!("seeded cache {key} with {} coins", coins.len());
                    Cache::from_coins(coins)
                }
            };
            let _ = self.caches.insert(key.clone(), cache);
        }
        self.caches.entry(key).or_default()
    }

    /// Replaces the resident entry for `key` with its persisted momento.
    ///
    /// Returns `false`, leaving the table untouched, when no readable momento
    /// exists.
    pub fn restore<S>(&mut self, storage: &S, key: &CellKey) -> bool
    where
        S: Storage + ?Sized,
    {
        let Some(cache) = load_momento(storage, key) else {
            return false;
        };
        let _ = self.caches.insert(key.clone(), cache);
        let _ = self.modified.remove(key);
        true
    }

    /// Moves the last coin of the cache at `key` into `inventory`.
    ///
    /// Empty or non-resident caches leave both sides untouched.
    pub fn collect(&mut self, key: &CellKey, inventory: &mut CoinStack) -> Option<Coin> {
        let cache = self.caches.get_mut(key)?;
        let coin = transfer(&mut cache.coins, inventory)?;
        let _ = self.modified.insert(key.clone());
        Some(coin)
    }

    /// Moves the last coin of `inventory` into the cache at `key`.
    ///
    /// An empty inventory or a non-resident cache leaves both sides untouched.
    /// Caches have no upper bound on their size.
    pub fn deposit(&mut self, key: &CellKey, inventory: &mut CoinStack) -> Option<Coin> {
        let cache = self.caches.get_mut(key)?;
        let coin = transfer(inventory, &mut cache.coins)?;
        let _ = self.modified.insert(key.clone());
        Some(coin)
    }

    /// Writes the momento of the cache at `key` if it changed since its last
    /// write.
    pub fn persist<S>(&mut self, storage: &mut S, key: &CellKey) -> Result<bool, WorldError>
    where
        S: Storage + ?Sized,
    {
        if !self.modified.contains(key) {
            return Ok(false);
        }
        if let Some(cache) = self.caches.get(key) {
            storage.save(key.as_str(), &momento::encode(cache)?)?;
        }
        let _ = self.modified.remove(key);
        Ok(true)
    }

    /// Writes the momento of every modified cache and returns how many were
    /// written.
    pub fn persist_all<S>(&mut self, storage: &mut S) -> Result<usize, WorldError>
    where
        S: Storage + ?Sized,
    {
        let pending: Vec<CellKey> = self.modified.iter().cloned().collect();
        let mut written = 0;
        for key in &pending {
            if self.persist(storage, key)? {
                written += 1;
            }
        }
        if written > 0 {
            debug!("persisted {written} cache momentos");
        }
        Ok(written)
    }

    /// Drops every resident cache so the next neighborhood starts cold.
    ///
    /// Modifications that were not persisted beforehand are lost.
    pub fn evict(&mut self) {
        if !self.modified.is_empty() {
            warn!(
                "evicting {} caches with unpersisted changes",
                self.modified.len()
            );
        }
        self.clear();
    }

    /// Empties the table and forgets pending modifications.
    pub fn clear(&mut self) {
        self.caches.clear();
        self.modified.clear();
    }

    /// Resident cache stored under `key`.
    #[must_use]
    pub fn get(&self, key: &CellKey) -> Option<&Cache> {
        self.caches.get(key)
    }

    /// Reports whether a cache is resident under `key`.
    #[must_use]
    pub fn contains(&self, key: &CellKey) -> bool {
        self.caches.contains_key(key)
    }

    /// Number of resident caches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Reports whether no cache is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Total number of coins held by resident caches.
    #[must_use]
    pub fn coin_count(&self) -> usize {
        self.caches.values().map(Cache::len).sum()
    }
}

fn load_momento<S>(storage: &S, key: &CellKey) -> Option<Cache>
where
    S: Storage + ?Sized,
{
    let raw = match storage.load(key.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(error) => {
            warn!("could not read momento for {key}: {error}");
            return None;
        }
    };
    match momento::decode(&raw) {
        Ok(cache) => {
            debug!("restored cache {key} with {} coins", cache.len());
            Some(cache)
        }
        Err(error) => {
            warn!("discarding unreadable momento for {key}: {error}");
            None
        }
    }
}
