//! Fixtures shared by the unit tests in this crate.

use chrono::Utc;
use common::{
    CategoryId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductCondition,
    ProductId, UserId, UserRole,
};
use store::{
    Category, CategoryStore, InMemoryStore, Order, OrderItem, OrderStore, Product, ProductStore,
    Rating, ShippingAddress, ShippingInfo, User, UserStore,
};

pub fn memory_store() -> InMemoryStore {
    InMemoryStore::new()
}

pub async fn seed_product(store: &InMemoryStore, name: &str, price: i64, stock: u32) -> Product {
    let now = Utc::now();
    store
        .insert_product(Product {
            id: ProductId::new(),
            name: name.to_string(),
            description: String::new(),
            price: Money::from_major(price),
            original_price: None,
            category: CategoryId::new(),
            subcategory: None,
            brand: None,
            images: vec![],
            thumbnail: format!("/img/{name}.png"),
            condition: ProductCondition::New,
            stock,
            sold: 0,
            rating: Rating::default(),
            seller: UserId::new(),
            shipping: ShippingInfo::default(),
            variants: vec![],
            tags: vec![],
            is_active: true,
            is_featured: false,
            view_count: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn seed_user(store: &InMemoryStore, role: UserRole) -> User {
    let id = UserId::new();
    store
        .insert_user(User::new(
            format!("user-{id}"),
            format!("{id}@example.com"),
            role,
        ))
        .await
        .unwrap()
}

pub async fn seed_category(store: &InMemoryStore, name: &str) -> Category {
    let now = Utc::now();
    store
        .insert_category(Category {
            id: CategoryId::new(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            image: None,
            parent: None,
            level: 0,
            is_active: true,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn seed_order(
    store: &InMemoryStore,
    user: UserId,
    seller: UserId,
    status: OrderStatus,
) -> Order {
    let now = Utc::now();
    let id = OrderId::new();
    store
        .insert_order(Order {
            id,
            user,
            order_number: format!("ORD-{id}"),
            items: vec![OrderItem {
                product: ProductId::new(),
                name: "Item".to_string(),
                image: String::new(),
                price: Money::from_major(10),
                quantity: 1,
                variant: None,
                seller,
            }],
            shipping_address: ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
                country: "US".to_string(),
            },
            payment_method: PaymentMethod::CreditCard,
            payment_status: PaymentStatus::Pending,
            order_status: status,
            subtotal: Money::from_major(10),
            shipping_fee: Money::zero(),
            tax: Money::from_major(1),
            discount: Money::zero(),
            total_amount: Money::from_major(11),
            tracking_number: None,
            estimated_delivery: None,
            actual_delivery: None,
            notes: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}
