//! Player state persisted independently of any cache.

use geocoin_core::{CoinStack, LatLng};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    storage::{Storage, INVENTORY_KEY, PATH_KEY, POSITION_KEY},
    WorldError,
};

/// Position, inventory and travelled path of the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    position: LatLng,
    inventory: CoinStack,
    path: Vec<LatLng>,
}

impl Player {
    /// Creates a player standing at `origin` with nothing in hand.
    #[must_use]
    pub(crate) fn new(origin: LatLng) -> Self {
        Self {
            position: origin,
            inventory: CoinStack::new(),
            path: Vec::new(),
        }
    }

    /// Restores the player from storage.
    ///
    /// Every entry is read on its own; a missing or unreadable entry falls
    /// back to its default without affecting the others.
    pub(crate) fn load<S>(storage: &S, origin: LatLng) -> Self
    where
        S: Storage + ?Sized,
    {
        Self {
            position: load_entry(storage, POSITION_KEY).unwrap_or(origin),
            inventory: load_entry(storage, INVENTORY_KEY).unwrap_or_default(),
            path: load_entry(storage, PATH_KEY).unwrap_or_default(),
        }
    }

    pub(crate) fn save<S>(&self, storage: &mut S) -> Result<(), WorldError>
    where
        S: Storage + ?Sized,
    {
        save_entry(storage, POSITION_KEY, &self.position)?;
        save_entry(storage, PATH_KEY, &self.path)?;
        self.save_inventory(storage)
    }

    pub(crate) fn save_inventory<S>(&self, storage: &mut S) -> Result<(), WorldError>
    where
        S: Storage + ?Sized,
    {
        save_entry(storage, INVENTORY_KEY, &self.inventory)
    }

    /// Moves the player, recording the departure point first when the path is
    /// still empty.
    pub(crate) fn move_to(&mut self, to: LatLng) {
        if self.path.is_empty() {
            self.path.push(self.position);
        }
        self.path.push(to);
        self.position = to;
    }

    pub(crate) fn inventory_mut(&mut self) -> &mut CoinStack {
        &mut self.inventory
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> LatLng {
        self.position
    }

    /// Coins carried by the player.
    #[must_use]
    pub fn inventory(&self) -> &CoinStack {
        &self.inventory
    }

    /// Positions visited, in order.
    #[must_use]
    pub fn path(&self) -> &[LatLng] {
        &self.path
    }
}

fn load_entry<T, S>(storage: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: Storage + ?Sized,
{
    let raw = match storage.load(key) {
        Ok(raw) => raw?,
        Err(error) => {
            warn!("could not read {key}; using default: {error}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!("discarding malformed {key}; using default: {error}");
            None
        }
    }
}

fn save_entry<T, S>(storage: &mut S, key: &str, value: &T) -> Result<(), WorldError>
where
    T: Serialize,
    S: Storage + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(WorldError::Encode)?;
    storage.save(key, &encoded)?;
    Ok(())
}
