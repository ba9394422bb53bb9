use chrono::Utc;
use common::{CategoryId, Money, PaymentMethod, ProductCondition, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CartService, PricingPolicy, order_number};
use store::{InMemoryStore, Product, ProductQuery, ProductStore, Rating, ShippingInfo};

fn product(name: String, price: i64) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(),
        description: format!("{name} for benchmarking"),
        thumbnail: String::new(),
        name,
        price: Money::from_major(price),
        original_price: None,
        category: CategoryId::new(),
        subcategory: None,
        brand: None,
        images: vec![],
        condition: ProductCondition::New,
        stock: u32::MAX,
        sold: 0,
        rating: Rating::default(),
        seller: UserId::new(),
        shipping: ShippingInfo::default(),
        variants: vec![],
        tags: vec!["bench".to_string()],
        is_active: true,
        is_featured: false,
        view_count: 0,
        created_at: now,
        updated_at: now,
    }
}

fn bench_cart_add(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let service = CartService::new(store.clone());
    let user = UserId::new();
    let product_id = rt.block_on(async {
        store
            .insert_product(product("Widget".to_string(), 10))
            .await
            .unwrap()
            .id
    });

    c.bench_function("domain/cart_add", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.add(user, product_id, 1, None).await.unwrap();
            });
        });
    });
}

fn bench_product_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    rt.block_on(async {
        for i in 0..1000 {
            store
                .insert_product(product(format!("Widget {i}"), i % 50))
                .await
                .unwrap();
        }
    });

    c.bench_function("domain/product_search_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let query = ProductQuery::new()
                    .search("widget 42")
                    .max_price(Money::from_major(25));
                store.query_products(query).await.unwrap();
            });
        });
    });
}

fn bench_pricing(c: &mut Criterion) {
    let policy = PricingPolicy::default();
    c.bench_function("domain/order_totals", |b| {
        b.iter(|| policy.totals(Money::from_major(1234), PaymentMethod::CashOnDelivery));
    });
    c.bench_function("domain/order_number", |b| {
        b.iter(|| order_number::generate(Utc::now()));
    });
}

criterion_group!(benches, bench_cart_add, bench_product_search, bench_pricing);
criterion_main!(benches);
