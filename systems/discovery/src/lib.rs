#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure discovery system that locates the caches surrounding the player.

use geocoin_core::{CellKey, Event, GridConfig, LatLng, TileIndex};
use geocoin_system_seeder::spawns_cache;
use log::debug;

/// Candidate tile that hosts a cache.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheSite {
    tile: TileIndex,
    position: LatLng,
    cell: CellKey,
}

impl CacheSite {
    /// Tile hosting the cache.
    #[must_use]
    pub const fn tile(&self) -> TileIndex {
        self.tile
    }

    /// Center of the tile; this is the position used to seed the cache.
    #[must_use]
    pub const fn position(&self) -> LatLng {
        self.position
    }

    /// Cell key under which the cache is stored.
    #[must_use]
    pub fn cell(&self) -> &CellKey {
        &self.cell
    }
}

/// Scans the `2r x 2r` tile square centered on `center` and returns every tile
/// that hosts a cache, ordered by row then column.
#[must_use]
pub fn scan(center: LatLng, config: &GridConfig) -> Vec<CacheSite> {
    let origin = TileIndex::containing(center, config.tile_degrees());
    let radius = i64::from(config.neighborhood_radius());
    let mut sites = Vec::new();

    for rows in -radius..radius {
        for columns in -radius..radius {
            let tile = origin.offset(rows, columns);
            let position = tile.center(config.tile_degrees());
            if spawns_cache(position, config.cache_chance()) {
                sites.push(CacheSite {
                    tile,
                    position,
                    cell: config.cell_key(position),
                });
            }
        }
    }

    sites
}

/// Tracks the cache sites of the player's current neighborhood.
#[derive(Debug)]
pub struct Discovery {
    config: GridConfig,
    center: TileIndex,
    sites: Vec<CacheSite>,
}

impl Discovery {
    /// Creates a discovery system and scans the neighborhood of `position`.
    #[must_use]
    pub fn new(config: GridConfig, position: LatLng) -> Self {
        Self {
            config,
            center: TileIndex::containing(position, config.tile_degrees()),
            sites: scan(position, &config),
        }
    }

    /// Consumes world events and rescans when the player enters a new tile.
    pub fn handle(&mut self, events: &[Event]) {
        let mut latest = None;
        for event in events {
            match event {
                Event::PlayerMoved { to, .. } => latest = Some(*to),
                Event::GameReset => latest = Some(self.config.origin()),
                _ => {}
            }
        }

        let Some(position) = latest else {
            return;
        };

        let center = TileIndex::containing(position, self.config.tile_degrees());
        if center == self.center {
            return;
        }

        self.center = center;
        self.sites = scan(position, &self.config);
        debug!(
            "discovered {} caches around tile {:?}",
            self.sites.len(),
            center
        );
    }

    /// Cache sites of the current neighborhood.
    #[must_use]
    pub fn sites(&self) -> &[CacheSite] {
        &self.sites
    }

    /// Finds the site stored under `cell`, if it lies in the neighborhood.
    #[must_use]
    pub fn site(&self, cell: &CellKey) -> Option<&CacheSite> {
        self.sites.iter().find(|site| site.cell() == cell)
    }
}
