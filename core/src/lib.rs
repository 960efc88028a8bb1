#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the GeoCoin engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! changed. Systems consume event streams and immutable views and never
//! mutate the world directly.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Player location used when nothing has been persisted yet.
pub const DEFAULT_ORIGIN: LatLng = LatLng::new(36.989498, -122.062777);

/// Multiplier applied to each coordinate before flooring it into a cell key.
pub const CELL_QUANTIZATION: f64 = 100_000.0;

/// Edge length of a discovery tile measured in degrees.
pub const TILE_DEGREES: f64 = 1e-4;

/// Number of tiles scanned in each direction around the player.
pub const NEIGHBORHOOD_RADIUS: u32 = 8;

/// Probability that a candidate tile hosts a cache.
pub const CACHE_CHANCE: f64 = 0.1;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves the player a single tile in the provided direction.
    MovePlayer {
        /// Direction of travel.
        direction: Direction,
    },
    /// Teleports the player to a reported geolocation fix.
    Relocate {
        /// Position supplied by the geolocation provider.
        position: LatLng,
    },
    /// Opens the cache hosted at the provided candidate position, restoring or
    /// seeding its coins on first access.
    OpenCache {
        /// Position of the candidate tile hosting the cache.
        position: LatLng,
    },
    /// Moves one coin from the cache into the player's inventory.
    Collect {
        /// Cell hosting the cache.
        cell: CellKey,
    },
    /// Moves one coin from the player's inventory into the cache.
    Deposit {
        /// Cell hosting the cache.
        cell: CellKey,
    },
    /// Writes the momento of every modified cache to storage.
    PersistCaches,
    /// Wipes storage and returns the player to the origin.
    ResetGame,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the player changed position.
    PlayerMoved {
        /// Position before the move.
        from: LatLng,
        /// Position after the move.
        to: LatLng,
    },
    /// Reports how many cache momentos were written to storage.
    CachesPersisted {
        /// Number of momentos written.
        count: usize,
    },
    /// Confirms that a cache is resident in the cache table.
    CacheOpened {
        /// Cell hosting the cache.
        cell: CellKey,
        /// Number of coins the cache currently holds.
        coins: usize,
    },
    /// Confirms that a coin moved from a cache into the inventory.
    CoinCollected {
        /// Cell the coin was taken from.
        cell: CellKey,
        /// Coin that changed hands.
        coin: Coin,
    },
    /// Confirms that a coin moved from the inventory into a cache.
    CoinDeposited {
        /// Cell the coin was placed into.
        cell: CellKey,
        /// Coin that changed hands.
        coin: Coin,
    },
    /// Announces the new size of the player's inventory.
    InventoryChanged {
        /// Number of coins the player now holds.
        coins: usize,
    },
    /// Announces that all persisted and in-memory state was wiped.
    GameReset,
}

/// Geographic position expressed in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    /// Creates a new position from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Returns the position shifted by the provided deltas.
    #[must_use]
    pub fn offset(self, lat_delta: f64, lng_delta: f64) -> Self {
        Self::new(self.lat + lat_delta, self.lng + lng_delta)
    }

    /// Raw coordinate string fed to the seeder, formatted as `"{lat},{lng}"`.
    #[must_use]
    pub fn seed_key(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Quantized identifier of a map cell, formatted as `"{i}:{j}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(String);

impl CellKey {
    /// Derives the key of the cell containing `position`.
    ///
    /// Each coordinate is multiplied by `quantization` and floored, so every
    /// position inside the same cell produces the same key.
    #[must_use]
    pub fn from_position(position: LatLng, quantization: f64) -> Self {
        let i = (position.lat() * quantization).floor() as i64;
        let j = (position.lng() * quantization).floor() as i64;
        Self::from_indices(i, j)
    }

    /// Builds a key from already quantized indices.
    #[must_use]
    pub fn from_indices(i: i64, j: i64) -> Self {
        Self(format!("{i}:{j}"))
    }

    /// Borrowed string form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for CellKey {
    type Err = CellKeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (i, j) = trimmed
            .split_once(':')
            .ok_or_else(|| CellKeyParseError(trimmed.to_owned()))?;
        let i = i
            .parse::<i64>()
            .map_err(|_| CellKeyParseError(trimmed.to_owned()))?;
        let j = j
            .parse::<i64>()
            .map_err(|_| CellKeyParseError(trimmed.to_owned()))?;
        Ok(Self::from_indices(i, j))
    }
}

/// Error returned when a string is not a well-formed `"{i}:{j}"` cell key.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("could not parse cell key '{0}'")]
pub struct CellKeyParseError(String);

/// Index of a discovery tile on the `tile_degrees` grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    row: i64,
    column: i64,
}

impl TileIndex {
    /// Creates a new tile index.
    #[must_use]
    pub const fn new(row: i64, column: i64) -> Self {
        Self { row, column }
    }

    /// Tile that contains `position`.
    #[must_use]
    pub fn containing(position: LatLng, tile_degrees: f64) -> Self {
        Self::new(
            (position.lat() / tile_degrees).floor() as i64,
            (position.lng() / tile_degrees).floor() as i64,
        )
    }

    /// Latitude index of the tile.
    #[must_use]
    pub const fn row(&self) -> i64 {
        self.row
    }

    /// Longitude index of the tile.
    #[must_use]
    pub const fn column(&self) -> i64 {
        self.column
    }

    /// Returns the tile shifted by the provided row and column deltas.
    #[must_use]
    pub const fn offset(self, rows: i64, columns: i64) -> Self {
        Self::new(self.row + rows, self.column + columns)
    }

    /// Geographic center of the tile.
    ///
    /// Always derived from the integer index, so the same tile yields
    /// bit-identical coordinates no matter where the player stands.
    #[must_use]
    pub fn center(&self, tile_degrees: f64) -> LatLng {
        LatLng::new(
            (self.row as f64 + 0.5) * tile_degrees,
            (self.column as f64 + 0.5) * tile_degrees,
        )
    }
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Increasing latitude.
    North,
    /// Increasing longitude.
    East,
    /// Decreasing latitude.
    South,
    /// Decreasing longitude.
    West,
}

impl Direction {
    /// Latitude and longitude deltas, in tiles, of a single step.
    #[must_use]
    pub const fn tile_delta(self) -> (i64, i64) {
        match self {
            Self::North => (1, 0),
            Self::East => (0, 1),
            Self::South => (-1, 0),
            Self::West => (0, -1),
        }
    }
}

/// Identity-bearing unit of value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    serial: String,
}

impl Coin {
    /// Mints the `ordinal`-th coin originating from `cell`.
    #[must_use]
    pub fn mint(cell: &CellKey, ordinal: u32) -> Self {
        Self {
            serial: format!("{cell}#{ordinal}"),
        }
    }

    /// Creates a coin from an existing serial.
    #[must_use]
    pub fn from_serial(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
        }
    }

    /// Serial uniquely identifying the coin.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.serial)
    }
}

/// Ordered container of coins.
///
/// Both caches and the player's inventory hold their coins in a stack; the
/// most recently added coin is the first to leave.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinStack {
    coins: Vec<Coin>,
}

impl CoinStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { coins: Vec::new() }
    }

    /// Number of coins held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coins.len()
    }

    /// Reports whether the stack holds no coins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Iterator over the coins in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    /// Serials of the held coins in insertion order.
    #[must_use]
    pub fn serials(&self) -> Vec<&str> {
        self.coins.iter().map(Coin::serial).collect()
    }

    fn push(&mut self, coin: Coin) {
        self.coins.push(coin);
    }

    fn pop(&mut self) -> Option<Coin> {
        self.coins.pop()
    }
}

impl FromIterator<Coin> for CoinStack {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        Self {
            coins: iter.into_iter().collect(),
        }
    }
}

/// Moves the most recently added coin of `source` onto `destination`.
///
/// Returns the coin that changed hands, or `None` when `source` is empty, in
/// which case neither container is touched.
pub fn transfer(source: &mut CoinStack, destination: &mut CoinStack) -> Option<Coin> {
    let coin = source.pop()?;
    destination.push(coin.clone());
    Some(coin)
}

/// Grid constants supplied by the shell to generation and discovery.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    origin: LatLng,
    tile_degrees: f64,
    neighborhood_radius: u32,
    cache_chance: f64,
    quantization: f64,
}

impl GridConfig {
    /// Creates a new configuration from explicit values.
    #[must_use]
    pub const fn new(
        origin: LatLng,
        tile_degrees: f64,
        neighborhood_radius: u32,
        cache_chance: f64,
        quantization: f64,
    ) -> Self {
        Self {
            origin,
            tile_degrees,
            neighborhood_radius,
            cache_chance,
            quantization,
        }
    }

    /// Position the player starts from.
    #[must_use]
    pub const fn origin(&self) -> LatLng {
        self.origin
    }

    /// Edge length of a discovery tile in degrees.
    #[must_use]
    pub const fn tile_degrees(&self) -> f64 {
        self.tile_degrees
    }

    /// Number of tiles scanned in each direction around the player.
    #[must_use]
    pub const fn neighborhood_radius(&self) -> u32 {
        self.neighborhood_radius
    }

    /// Probability that a candidate tile hosts a cache.
    #[must_use]
    pub const fn cache_chance(&self) -> f64 {
        self.cache_chance
    }

    /// Multiplier used when quantizing positions into cell keys.
    #[must_use]
    pub const fn quantization(&self) -> f64 {
        self.quantization
    }

    /// Key of the cell containing `position` under this configuration.
    #[must_use]
    pub fn cell_key(&self, position: LatLng) -> CellKey {
        CellKey::from_position(position, self.quantization)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_ORIGIN,
            TILE_DEGREES,
            NEIGHBORHOOD_RADIUS,
            CACHE_CHANCE,
            CELL_QUANTIZATION,
        )
    }
}
