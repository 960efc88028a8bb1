use geocoin_core::{CellKey, Command, Direction, Event, GridConfig, LatLng, TileIndex};
use geocoin_system_seeder::{initial_coin_count, spawns_cache};
use geocoin_world::{
    apply, momento, query,
    storage::{MemoryStorage, Storage, INVENTORY_KEY, PATH_KEY, POSITION_KEY},
    World,
};

fn run(world: &mut World, storage: &mut MemoryStorage, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, storage, command, &mut events).expect("command applies");
    events
}

/// Finds tile centers around the origin that host caches with at least
/// `min_coins` coins.
fn rich_sites(config: &GridConfig, min_coins: u32, wanted: usize) -> Vec<LatLng> {
    let origin = TileIndex::containing(config.origin(), config.tile_degrees());
    let mut sites = Vec::new();
    for rows in -40..40 {
        for columns in -40..40 {
            let position = origin.offset(rows, columns).center(config.tile_degrees());
            if spawns_cache(position, config.cache_chance())
                && initial_coin_count(position) >= min_coins
            {
                sites.push(position);
                if sites.len() == wanted {
                    return sites;
                }
            }
        }
    }
    panic!("not enough rich cache sites near the origin");
}

fn seeded_cache_with(storage: &mut MemoryStorage, cell: &CellKey, serials: &[&str]) {
    let coins = serials
        .iter()
        .map(|serial| format!(r#"{{"serial":"{serial}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    storage
        .save(cell.as_str(), &format!(r#"{{"coins":[{coins}]}}"#))
        .expect("save momento");
}

#[test]
fn basic_exchange_round_trips_through_momento() {
    let cell = CellKey::from_indices(10, 20);
    let mut storage = MemoryStorage::new();
    seeded_cache_with(&mut storage, &cell, &["10:20#0", "10:20#1"]);
    let mut world = World::default();

    let events = run(&mut world, &mut storage, Command::Collect { cell: cell.clone() });

    assert_eq!(
        events,
        vec![
            Event::CoinCollected {
                cell: cell.clone(),
                coin: geocoin_core::Coin::from_serial("10:20#1"),
            },
            Event::InventoryChanged { coins: 1 },
        ]
    );
    assert_eq!(query::inventory(&world).serials(), vec!["10:20#1"]);
    let resident = query::cache(&world, &cell).expect("cache resident");
    assert_eq!(resident.coins().serials(), vec!["10:20#0"]);

    let raw = storage.get(cell.as_str()).expect("momento persisted");
    let restored = momento::decode(raw).expect("momento decodes");
    assert_eq!(&restored, resident);
}

#[test]
fn empty_cache_collect_leaves_inventory_unchanged() {
    let cell = CellKey::from_indices(3, 4);
    let mut storage = MemoryStorage::new();
    seeded_cache_with(&mut storage, &cell, &[]);
    let mut world = World::default();

    let events = run(&mut world, &mut storage, Command::Collect { cell: cell.clone() });

    assert!(events.is_empty(), "empty collect must not report anything");
    assert!(query::inventory(&world).is_empty());
    assert!(storage.get(INVENTORY_KEY).is_none());
}

#[test]
fn deposit_requires_a_coin_in_hand() {
    let cell = CellKey::from_indices(3, 4);
    let mut storage = MemoryStorage::new();
    seeded_cache_with(&mut storage, &cell, &["3:4#0"]);
    let mut world = World::default();

    let events = run(&mut world, &mut storage, Command::Deposit { cell: cell.clone() });

    assert!(events.is_empty());
    assert_eq!(
        query::cache(&world, &cell)
            .expect("cache restored")
            .coins()
            .serials(),
        vec!["3:4#0"]
    );
}

#[test]
fn opening_a_cache_seeds_it_from_its_position() {
    let config = GridConfig::default();
    let position = rich_sites(&config, 1, 1)[0];
    let mut storage = MemoryStorage::new();
    let mut world = World::new(config);

    let events = run(&mut world, &mut storage, Command::OpenCache { position });

    let cell = config.cell_key(position);
    let expected = initial_coin_count(position) as usize;
    assert_eq!(
        events,
        vec![Event::CacheOpened {
            cell: cell.clone(),
            coins: expected,
        }]
    );
    let serials = query::cache(&world, &cell)
        .expect("cache resident")
        .coins()
        .serials();
    assert_eq!(serials.first().copied(), Some(format!("{cell}#0").as_str()));
    assert!(storage.is_empty(), "opening alone must not write momentos");
}

#[test]
fn transfers_conserve_coins() {
    let config = GridConfig::default();
    let sites = rich_sites(&config, 2, 3);
    let mut storage = MemoryStorage::new();
    let mut world = World::new(config);
    for position in &sites {
        let _ = run(&mut world, &mut storage, Command::OpenCache { position: *position });
    }
    let cells: Vec<CellKey> = sites.iter().map(|site| config.cell_key(*site)).collect();
    let total = query::coins_in_play(&world);

    for step in 0..60usize {
        let cell = cells[step % cells.len()].clone();
        let command = if step % 3 == 2 {
            Command::Deposit { cell }
        } else {
            Command::Collect { cell }
        };
        let _ = run(&mut world, &mut storage, command);
        assert_eq!(query::coins_in_play(&world), total, "step {step} changed the total");
    }

    for _ in 0..total {
        let _ = run(
            &mut world,
            &mut storage,
            Command::Deposit {
                cell: cells[0].clone(),
            },
        );
    }
    assert!(query::inventory(&world).is_empty());
    assert_eq!(query::coins_in_play(&world), total);
}

#[test]
fn movement_persists_touched_caches_across_reload() {
    let config = GridConfig::default();
    let sites = rich_sites(&config, 2, 2);
    let mut storage = MemoryStorage::new();
    let mut world = World::new(config);

    for position in &sites {
        let _ = run(&mut world, &mut storage, Command::OpenCache { position: *position });
        let _ = run(
            &mut world,
            &mut storage,
            Command::Collect {
                cell: config.cell_key(*position),
            },
        );
    }
    let snapshots: Vec<_> = sites
        .iter()
        .map(|position| {
            query::cache(&world, &config.cell_key(*position))
                .expect("cache resident")
                .clone()
        })
        .collect();

    let events = run(
        &mut world,
        &mut storage,
        Command::MovePlayer {
            direction: Direction::West,
        },
    );
    assert!(matches!(events[0], Event::CachesPersisted { .. }));
    assert!(query::caches(&world).is_empty(), "movement evicts the table");

    let mut reloaded = World::load(config, &storage);
    assert_eq!(query::inventory(&reloaded).len(), sites.len());
    assert_eq!(query::position(&reloaded), query::position(&world));
    assert_eq!(query::path(&reloaded), query::path(&world));

    for (position, snapshot) in sites.iter().zip(&snapshots) {
        let _ = run(
            &mut reloaded,
            &mut storage,
            Command::OpenCache { position: *position },
        );
        let cache = query::cache(&reloaded, &config.cell_key(*position)).expect("cache resident");
        assert_eq!(cache, snapshot, "restored cache must not be re-seeded");
        assert_eq!(cache.len() as u32, initial_coin_count(*position) - 1);
    }
}

#[test]
fn geolocation_runs_the_movement_sequence() {
    let mut storage = MemoryStorage::new();
    let mut world = World::default();
    let fix = LatLng::new(37.0, -122.0);

    let events = run(&mut world, &mut storage, Command::Relocate { position: fix });

    assert_eq!(query::position(&world), fix);
    assert_eq!(
        events.last(),
        Some(&Event::PlayerMoved {
            from: geocoin_core::DEFAULT_ORIGIN,
            to: fix,
        })
    );
    assert!(storage.get(POSITION_KEY).is_some());
}

#[test]
fn corrupt_player_entries_fall_back_to_defaults() {
    let mut storage = MemoryStorage::new();
    storage.save(POSITION_KEY, "{\"lat\":").expect("save");
    storage.save(PATH_KEY, "42").expect("save");
    storage
        .save(INVENTORY_KEY, r#"[{"serial":"1:1#0"}]"#)
        .expect("save");

    let world = World::load(GridConfig::default(), &storage);

    assert_eq!(query::position(&world), geocoin_core::DEFAULT_ORIGIN);
    assert!(query::path(&world).is_empty());
    assert_eq!(query::inventory(&world).serials(), vec!["1:1#0"]);
}

#[test]
fn explicit_persist_reports_written_momentos() {
    let cell = CellKey::from_indices(8, 8);
    let mut storage = MemoryStorage::new();
    seeded_cache_with(&mut storage, &cell, &["8:8#0", "8:8#1"]);
    let mut world = World::default();
    let _ = run(&mut world, &mut storage, Command::Collect { cell: cell.clone() });

    let events = run(&mut world, &mut storage, Command::PersistCaches);

    assert_eq!(events, vec![Event::CachesPersisted { count: 0 }]);
    assert_eq!(
        storage.get(cell.as_str()),
        Some(r#"{"coins":[{"serial":"8:8#0"}]}"#)
    );
}
