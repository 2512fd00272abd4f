use criterion::{black_box, criterion_group, criterion_main, Criterion};
use intent_kit::{xml, Bundle, ComponentName, PersistableBundle};
use intent_store::{IntentStore, MemoryStore, PrefStore, SqliteStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TEXT_KEYS: usize = 16;
const INT_KEYS: usize = 16;

fn random_bundle(rng: &mut StdRng, depth: usize) -> PersistableBundle {
    let mut bundle = PersistableBundle::new();
    for i in 0..8 {
        bundle.insert(format!("s{i}"), format!("value-{}", rng.gen::<u32>()));
        bundle.insert(format!("n{i}"), rng.gen::<i64>());
        bundle.insert(format!("b{i}"), rng.gen::<bool>());
    }
    let ints: Vec<i32> = (0..32).map(|_| rng.gen_range(-1000..1000)).collect();
    bundle.insert("ints", ints);
    if depth > 0 {
        bundle.insert("child", random_bundle(rng, depth - 1));
    }
    bundle
}

fn random_extras(rng: &mut StdRng) -> Bundle {
    let mut extras = Bundle::new();
    for i in 0..TEXT_KEYS {
        extras.put_string(format!("text{i}"), format!("{:x}", rng.gen::<u64>()));
    }
    for i in 0..INT_KEYS {
        extras.put_int(format!("int{i}"), rng.gen());
    }
    extras.put_persistable_bundle("blob", random_bundle(rng, 3));
    extras
}

fn configured<S: PrefStore>(backend: S) -> IntentStore<S> {
    IntentStore::new(backend, ComponentName::new("bench", "bench.Target"), "bench")
        .with_text_keys((0..TEXT_KEYS).map(|i| format!("text{i}")))
        .unwrap()
        .with_int_keys((0..INT_KEYS).map(|i| format!("int{i}")))
        .unwrap()
        .with_blob_keys(["blob"])
        .unwrap()
}

fn bench_xml_codec(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let bundle = random_bundle(&mut rng, 3);
    let text = xml::to_xml_string(&bundle).unwrap();

    c.bench_function("xml::to_xml_string depth 3", |b| {
        b.iter(|| black_box(xml::to_xml_string(black_box(&bundle)).unwrap()))
    });

    c.bench_function("xml::from_xml_str depth 3", |b| {
        b.iter(|| black_box(xml::from_xml_str(black_box(&text)).unwrap()))
    });
}

fn bench_memory_store(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let extras = random_extras(&mut rng);
    let mut store = configured(MemoryStore::new());

    c.bench_function("IntentStore<Memory>::save 33 fields", |b| {
        b.iter(|| store.save(black_box(&extras)).unwrap())
    });

    c.bench_function("IntentStore<Memory>::load 33 fields", |b| {
        b.iter(|| black_box(store.load().unwrap()))
    });
}

fn bench_sqlite_store(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(13);
    let extras = random_extras(&mut rng);
    let mut store = configured(SqliteStore::open_in_memory().unwrap());

    c.bench_function("IntentStore<Sqlite>::save 33 fields", |b| {
        b.iter(|| store.save(black_box(&extras)).unwrap())
    });

    c.bench_function("IntentStore<Sqlite>::load 33 fields", |b| {
        b.iter(|| black_box(store.load().unwrap()))
    });
}

criterion_group!(
    benches,
    bench_xml_codec,
    bench_memory_store,
    bench_sqlite_store,
);
criterion_main!(benches);
