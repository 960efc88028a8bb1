#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the GeoCoin game from a terminal.
//!
//! Each invocation is one session: the save is loaded, a single action is
//! dispatched as world commands, and every change is written back before the
//! process exits.

mod config;
mod file_storage;
mod save_transfer;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use geocoin_core::{CellKey, Command, Direction, Event, LatLng};
use geocoin_system_discovery::Discovery;
use geocoin_world::{apply, query, World};
use log::info;

use crate::{
    config::load_grid_config, file_storage::FileStorage, save_transfer::SaveSnapshot,
};

#[derive(Debug, Parser)]
#[command(name = "geocoin", about = "Collect and deposit coins in caches around you.")]
struct Cli {
    /// Save file holding the player and every modified cache.
    #[arg(long, default_value = "geocoin-save.json")]
    save: PathBuf,
    /// Optional TOML file overriding grid constants.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Shows the player's position, inventory and path length.
    Status,
    /// Walks the given number of tiles in one direction.
    Move {
        /// Direction to walk in.
        direction: Heading,
        /// Number of tiles to walk.
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Jumps to a position reported by a geolocation provider.
    Goto {
        /// Latitude in decimal degrees.
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees.
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Lists the caches in the player's neighborhood.
    Caches,
    /// Takes one coin from the cache stored under the given cell.
    Collect {
        /// Cell key of the cache, as printed by `caches`.
        #[arg(allow_hyphen_values = true)]
        cell: CellKey,
    },
    /// Puts one coin from the inventory into the cache stored under the given cell.
    Deposit {
        /// Cell key of the cache, as printed by `caches`.
        #[arg(allow_hyphen_values = true)]
        cell: CellKey,
    },
    /// Wipes the save and returns the player to the origin.
    Reset,
    /// Prints the whole save as a single transferable line.
    Export,
    /// Replaces the save with one produced by `export`.
    Import {
        /// Line printed by `export`.
        payload: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Heading {
    North,
    East,
    South,
    West,
}

impl From<Heading> for Direction {
    fn from(heading: Heading) -> Self {
        match heading {
            Heading::North => Self::North,
            Heading::East => Self::East,
            Heading::South => Self::South,
            Heading::West => Self::West,
        }
    }
}

/// Entry point for the GeoCoin command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_grid_config(cli.config.as_deref())?;
    let mut storage = FileStorage::open(&cli.save)
        .with_context(|| format!("failed to open save at {}", cli.save.display()))?;

    match cli.action {
        Action::Export => {
            let snapshot = SaveSnapshot {
                entries: storage.entries().clone(),
            };
            println!("{}", snapshot.encode()?);
            return Ok(());
        }
        Action::Import { payload } => {
            let snapshot = SaveSnapshot::decode(&payload)?;
            let count = snapshot.entries.len();
            storage
                .replace_all(snapshot.entries)
                .context("failed to write imported save")?;
            println!("Imported {count} save entries.");
            return Ok(());
        }
        _ => {}
    }

    let world = World::load(config, &storage);
    let discovery = Discovery::new(config, query::position(&world));
    let mut session = Session {
        world,
        discovery,
        storage,
    };
    session.run(cli.action)?;
    let _ = session.dispatch(Command::PersistCaches)?;
    Ok(())
}

struct Session {
    world: World,
    discovery: Discovery,
    storage: FileStorage,
}

impl Session {
    fn run(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Status => self.print_status(),
            Action::Move { direction, steps } => {
                for _ in 0..steps {
                    let events = self.dispatch(Command::MovePlayer {
                        direction: direction.into(),
                    })?;
                    report(&events);
                }
                self.print_status();
            }
            Action::Goto { lat, lng } => {
                let position = LatLng::new(lat, lng);
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    bail!("{position} is not a valid coordinate");
                }
                let events = self.dispatch(Command::Relocate { position })?;
                report(&events);
                self.print_status();
            }
            Action::Caches => self.list_caches()?,
            Action::Collect { cell } => self.exchange(cell, |cell| Command::Collect { cell })?,
            Action::Deposit { cell } => self.exchange(cell, |cell| Command::Deposit { cell })?,
            Action::Reset => {
                let events = self.dispatch(Command::ResetGame)?;
                report(&events);
            }
            Action::Export | Action::Import { .. } => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        apply(&mut self.world, &mut self.storage, command, &mut events)
            .context("failed to apply command")?;
        self.discovery.handle(&events);
        Ok(events)
    }

    fn list_caches(&mut self) -> Result<()> {
        let sites: Vec<_> = self.discovery.sites().to_vec();
        if sites.is_empty() {
            println!("No caches nearby.");
            return Ok(());
        }
        for site in sites {
            let events = self.dispatch(Command::OpenCache {
                position: site.position(),
            })?;
            for event in events {
                if let Event::CacheOpened { cell, coins } = event {
                    println!("{cell:>20}  {coins:>3} coins  at {}", site.position());
                }
            }
        }
        Ok(())
    }

    fn exchange<F>(&mut self, cell: CellKey, command: F) -> Result<()>
    where
        F: FnOnce(CellKey) -> Command,
    {
        let Some(site) = self.discovery.site(&cell) else {
            bail!("no cache at {cell} near the player; run `caches` to list them");
        };
        let position = site.position();
        let _ = self.dispatch(Command::OpenCache { position })?;

        let events = self.dispatch(command(cell))?;
        if events.is_empty() {
            println!("Nothing to move.");
        }
        report(&events);
        Ok(())
    }

    fn print_status(&self) {
        println!("Position:  {}", query::position(&self.world));
        println!("Inventory: {} coins", query::inventory(&self.world).len());
        println!("Path:      {} points", query::path(&self.world).len());
    }
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::PlayerMoved { to, .. } => info!("moved to {to}"),
            Event::CachesPersisted { count } if *count > 0 => {
                info!("saved {count} caches");
            }
            Event::CoinCollected { cell, coin } => println!("Collected {coin} from {cell}."),
            Event::CoinDeposited { cell, coin } => println!("Deposited {coin} into {cell}."),
            Event::InventoryChanged { coins } => println!("Inventory: {coins} coins"),
            Event::GameReset => println!("Game reset."),
            _ => {}
        }
    }
}
