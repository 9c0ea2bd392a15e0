use criterion::{Criterion, criterion_group, criterion_main};
use domain::{NewOrder, OrderStatus};
use order_store::{InMemoryOrderStore, OrderStore};

fn laptop_order() -> NewOrder {
    NewOrder::new(123, "Laptop", 1, "123 Test St", "4111111111111111").unwrap()
}

fn bench_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryOrderStore::new();
    let order = laptop_order();

    c.bench_function("order_store/create", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.create(&order).await.unwrap();
            });
        });
    });
}

fn bench_create_and_complete(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryOrderStore::new();
    let order = laptop_order();

    c.bench_function("order_store/create_and_complete", |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = store.create(&order).await.unwrap();
                store.set_status(id, OrderStatus::Completed).await.unwrap();
            });
        });
    });
}

fn bench_list_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryOrderStore::new();
    let order = laptop_order();
    rt.block_on(async {
        for _ in 0..1000 {
            store.create(&order).await.unwrap();
        }
    });

    c.bench_function("order_store/list_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let orders = store.list().await.unwrap();
                assert_eq!(orders.len(), 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_create_and_complete,
    bench_list_1000
);
criterion_main!(benches);
