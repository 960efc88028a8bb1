use geocoin_core::{CellKey, Coin, CoinStack, Command, GridConfig, LatLng};
use geocoin_world::{
    apply, momento, query,
    storage::{MemoryStorage, Storage, INVENTORY_KEY},
    Cache, World,
};
use proptest::prelude::*;

const CELLS: usize = 3;

#[derive(Clone, Debug)]
enum Exchange {
    Collect(usize),
    Deposit(usize),
}

fn serial() -> impl Strategy<Value = String> {
    "[0-9]{1,4}:-?[0-9]{1,5}#[0-9]{1,3}"
}

fn coin_stack(max: usize) -> impl Strategy<Value = CoinStack> {
    prop::collection::vec(serial(), 0..max)
        .prop_map(|serials| serials.into_iter().map(Coin::from_serial).collect())
}

fn exchanges(max: usize) -> impl Strategy<Value = Vec<Exchange>> {
    let exchange = prop_oneof![
        (0..CELLS).prop_map(Exchange::Collect),
        (0..CELLS).prop_map(Exchange::Deposit),
    ];
    prop::collection::vec(exchange, 0..max)
}

fn site(index: usize) -> LatLng {
    LatLng::new(10.0 + index as f64 * 0.01, 20.0)
}

fn cell(index: usize) -> CellKey {
    GridConfig::default().cell_key(site(index))
}

fn stored_cache(storage: &MemoryStorage, cell: &CellKey) -> Cache {
    let raw = storage.get(cell.as_str()).expect("momento stored");
    momento::decode(raw).expect("momento decodes")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn exchanges_conserve_coins_in_memory_and_on_reload(
        caches in prop::collection::vec(coin_stack(8), CELLS),
        inventory in coin_stack(4),
        ops in exchanges(80),
    ) {
        let mut storage = MemoryStorage::new();
        for (index, coins) in caches.iter().enumerate() {
            let encoded = momento::encode(&Cache::from_coins(coins.clone())).expect("encode");
            storage.save(cell(index).as_str(), &encoded).expect("save momento");
        }
        storage
            .save(INVENTORY_KEY, &serde_json::to_string(&inventory).expect("encode"))
            .expect("save inventory");
        let total = inventory.len() + caches.iter().map(CoinStack::len).sum::<usize>();

        let mut world = World::load(GridConfig::default(), &storage);
        for index in 0..CELLS {
            let mut events = Vec::new();
            apply(&mut world, &mut storage, Command::OpenCache { position: site(index) }, &mut events)
                .expect("open");
        }
        prop_assert_eq!(query::coins_in_play(&world), total);

        for (step, op) in ops.into_iter().enumerate() {
            let command = match op {
                Exchange::Collect(index) => Command::Collect { cell: cell(index) },
                Exchange::Deposit(index) => Command::Deposit { cell: cell(index) },
            };
            let mut events = Vec::new();
            apply(&mut world, &mut storage, command, &mut events).expect("exchange applies");
            prop_assert_eq!(query::coins_in_play(&world), total, "step {} in memory", step);

            let on_disk = (0..CELLS)
                .map(|index| stored_cache(&storage, &cell(index)).len())
                .sum::<usize>();
            let reloaded = World::load(GridConfig::default(), &storage);
            prop_assert_eq!(query::inventory(&reloaded).len() + on_disk, total, "step {} on reload", step);
        }

        for index in 0..CELLS {
            let cache = query::cache(&world, &cell(index)).expect("cache resident");
            prop_assert_eq!(cache, &stored_cache(&storage, &cell(index)));
        }
    }

    #[test]
    fn momento_preserves_coin_order(coins in coin_stack(16)) {
        let cache = Cache::from_coins(coins);
        let decoded = momento::decode(&momento::encode(&cache).expect("encode")).expect("decode");
        prop_assert_eq!(decoded, cache);
    }
}
