#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state for GeoCoin.
//!
//! The [`World`] owns the cache table and the player. It is mutated only by
//! [`apply`], which runs each [`Command`] to completion, storage writes
//! included, before returning. Read access goes through [`query`].

mod cache_store;
pub mod momento;
mod player;
pub mod storage;

pub use cache_store::{Cache, CacheStore};
pub use player::Player;

use geocoin_core::{CellKey, Command, Event, GridConfig, LatLng};
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    momento::MomentoError,
    storage::{Storage, StorageError},
};

/// Errors surfaced while applying a command.
///
/// A collect or deposit whose writes fail is undone in memory and its momento
/// rewritten, so no coin is lost or duplicated across a reload.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The storage boundary rejected a read or write.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A cache could not be encoded into its momento.
    #[error(transparent)]
    Momento(#[from] MomentoError),
    /// Player state could not be encoded.
    #[error("could not encode player state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Represents the authoritative GeoCoin session state.
#[derive(Debug)]
pub struct World {
    config: GridConfig,
    caches: CacheStore,
    player: Player,
}

impl World {
    /// Creates a fresh world with the player standing at the configured
    /// origin.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            caches: CacheStore::new(),
            player: Player::new(config.origin()),
        }
    }

    /// Creates a world whose player state is restored from `storage`.
    ///
    /// Caches are not loaded eagerly; their momentos are read when each cache
    /// is first opened.
    #[must_use]
    pub fn load<S>(config: GridConfig, storage: &S) -> Self
    where
        S: Storage + ?Sized,
    {
        let player = Player::load(storage, config.origin());
        debug!(
            "loaded player at {} carrying {} coins",
            player.position(),
            player.inventory().len()
        );
        Self {
            config,
            caches: CacheStore::new(),
            player,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply<S>(
    world: &mut World,
    storage: &mut S,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError>
where
    S: Storage + ?Sized,
{
    match command {
        Command::MovePlayer { direction } => {
            let (rows, columns) = direction.tile_delta();
            let step = world.config.tile_degrees();
            let to = world
                .player
                .position()
                .offset(rows as f64 * step, columns as f64 * step);
            relocate(world, storage, to, out_events)?;
        }
        Command::Relocate { position } => {
            relocate(world, storage, position, out_events)?;
        }
        Command::OpenCache { position } => {
            let cell = world.config.cell_key(position);
            let cache =
                world
                    .caches
                    .get_or_create(&*storage, position, world.config.quantization());
            out_events.push(Event::CacheOpened {
                cell,
                coins: cache.len(),
            });
        }
        Command::Collect { cell } => {
            if !ensure_resident(world, &*storage, &cell) {
                return Ok(());
            }
            let Some(coin) = world.caches.collect(&cell, world.player.inventory_mut()) else {
                return Ok(());
            };
            if let Err(error) = write_transfer(world, storage, &cell) {
                let _ = world.caches.deposit(&cell, world.player.inventory_mut());
                rewrite_reverted(world, storage, &cell);
                return Err(error);
            }
            out_events.push(Event::CoinCollected { cell, coin });
            out_events.push(Event::InventoryChanged {
                coins: world.player.inventory().len(),
            });
        }
        Command::Deposit { cell } => {
            if !ensure_resident(world, &*storage, &cell) {
                return Ok(());
            }
            let Some(coin) = world.caches.deposit(&cell, world.player.inventory_mut()) else {
                return Ok(());
            };
            if let Err(error) = write_transfer(world, storage, &cell) {
                let _ = world.caches.collect(&cell, world.player.inventory_mut());
                rewrite_reverted(world, storage, &cell);
                return Err(error);
            }
            out_events.push(Event::CoinDeposited { cell, coin });
            out_events.push(Event::InventoryChanged {
                coins: world.player.inventory().len(),
            });
        }
        Command::PersistCaches => {
            let count = world.caches.persist_all(storage)?;
            out_events.push(Event::CachesPersisted { count });
        }
        Command::ResetGame => {
            storage.clear()?;
            world.caches.clear();
            world.player = Player::new(world.config.origin());
            info!("game reset; player returned to {}", world.player.position());
            out_events.push(Event::GameReset);
            out_events.push(Event::InventoryChanged { coins: 0 });
        }
    }

    Ok(())
}

fn relocate<S>(
    world: &mut World,
    storage: &mut S,
    to: LatLng,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError>
where
    S: Storage + ?Sized,
{
    let count = world.caches.persist_all(storage)?;
    out_events.push(Event::CachesPersisted { count });
    world.caches.evict();

    let from = world.player.position();
    world.player.move_to(to);
    world.player.save(storage)?;
    debug!("player moved from {from} to {to}");
    out_events.push(Event::PlayerMoved { from, to });
    Ok(())
}

/// Writes both sides of a transfer: the cache momento, then the inventory.
fn write_transfer<S>(world: &mut World, storage: &mut S, cell: &CellKey) -> Result<(), WorldError>
where
    S: Storage + ?Sized,
{
    let _ = world.caches.persist(storage, cell)?;
    world.player.save_inventory(storage)
}

/// Puts the momento of `cell` back in line with a transfer that was undone in
/// memory. The inventory entry was either never written or still holds the
/// pre-transfer coins.
fn rewrite_reverted<S>(world: &mut World, storage: &mut S, cell: &CellKey)
where
    S: Storage + ?Sized,
{
    if let Err(error) = world.caches.persist(storage, cell) {
        warn!("momento for {cell} stays pending after a failed transfer: {error}");
    }
}

fn ensure_resident<S>(world: &mut World, storage: &S, cell: &CellKey) -> bool
where
    S: Storage + ?Sized,
{
    world.caches.contains(cell) || world.caches.restore(storage, cell)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use geocoin_core::{CellKey, CoinStack, LatLng};

    use super::{Cache, CacheStore, World};

    /// Current player position.
    #[must_use]
    pub fn position(world: &World) -> LatLng {
        world.player.position()
    }

    /// Coins carried by the player.
    #[must_use]
    pub fn inventory(world: &World) -> &CoinStack {
        world.player.inventory()
    }

    /// Positions the player has visited, in order.
    #[must_use]
    pub fn path(world: &World) -> &[LatLng] {
        world.player.path()
    }

    /// Resident cache stored under `cell`.
    #[must_use]
    pub fn cache<'world>(world: &'world World, cell: &CellKey) -> Option<&'world Cache> {
        world.caches.get(cell)
    }

    /// Read-only view of the resident cache table.
    #[must_use]
    pub fn caches(world: &World) -> &CacheStore {
        &world.caches
    }

    /// Coins held by the player plus every resident cache.
    #[must_use]
    pub fn coins_in_play(world: &World) -> usize {
        world.player.inventory().len() + world.caches.coin_count()
    }
}
