//! Integration tests for the catalog and cart services.
//!
//! These tests drive the services the way the HTTP layer does: a seller
//! lists products, a shopper fills a cart, and listings react to edits.

use common::{PageRequest, UserId, UserRole};
use domain::{CartService, CatalogService, DomainError, NewCategory, NewProduct, ProductUpdate};
use serde_json::json;
use store::{InMemoryStore, ProductQuery, SortField, SortOrder, User, UserStore, VariantSelection};

async fn user(store: &InMemoryStore, name: &str, role: UserRole) -> User {
    store
        .insert_user(User::new(name, format!("{name}@example.com"), role))
        .await
        .unwrap()
}

fn new_product(category: &store::Category, name: &str, price: f64, stock: u32) -> NewProduct {
    serde_json::from_value(json!({
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "category": category.id,
        "images": [format!("/img/{name}.png")],
        "stock": stock,
        "tags": ["gadget"],
    }))
    .unwrap()
}

struct Fixture {
    store: InMemoryStore,
    catalog: CatalogService<InMemoryStore>,
    cart: CartService<InMemoryStore>,
    seller: User,
    category: store::Category,
}

async fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let catalog = CatalogService::new(store.clone());
    let admin = user(&store, "admin", UserRole::Admin).await;
    let seller = user(&store, "seller", UserRole::Seller).await;
    let category = catalog
        .create_category(
            &admin,
            NewCategory {
                name: "Home Audio".to_string(),
                slug: None,
                description: None,
                image: None,
                parent: None,
                sort_order: 0,
            },
        )
        .await
        .unwrap();

    Fixture {
        cart: CartService::new(store.clone()),
        store,
        catalog,
        seller,
        category,
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_seller_lists_and_shoppers_find_products() {
        let f = fixture().await;
        assert_eq!(f.category.slug, "home-audio");

        let speaker = f
            .catalog
            .create_product(&f.seller, new_product(&f.category, "Speaker", 120.0, 4))
            .await
            .unwrap();
        f.catalog
            .create_product(&f.seller, new_product(&f.category, "Cable", 5.0, 100))
            .await
            .unwrap();

        assert_eq!(speaker.thumbnail, "/img/Speaker.png");
        assert_eq!(speaker.seller, f.seller.id);

        let found = f
            .catalog
            .list_products(ProductQuery::new().search("speaker"))
            .await
            .unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].id, speaker.id);

        let cheapest_first = f
            .catalog
            .list_products(ProductQuery::new().sort_by(SortField::Price, SortOrder::Asc))
            .await
            .unwrap();
        assert_eq!(cheapest_first.items[0].name, "Cable");

        let mine = f
            .catalog
            .seller_products(f.seller.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
    }

    #[tokio::test]
    async fn test_viewing_counts_and_deleting_hides() {
        let f = fixture().await;
        let product = f
            .catalog
            .create_product(&f.seller, new_product(&f.category, "Lamp", 30.0, 2))
            .await
            .unwrap();

        f.catalog.get_product(product.id).await.unwrap();
        let viewed = f.catalog.get_product(product.id).await.unwrap();
        assert_eq!(viewed.view_count, 2);

        f.catalog.delete_product(&f.seller, product.id).await.unwrap();
        let err = f.catalog.get_product(product.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let listed = f.catalog.list_products(ProductQuery::new()).await.unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    async fn test_other_sellers_cannot_edit() {
        let f = fixture().await;
        let product = f
            .catalog
            .create_product(&f.seller, new_product(&f.category, "Desk", 200.0, 1))
            .await
            .unwrap();
        let rival = user(&f.store, "rival", UserRole::Seller).await;

        let err = f
            .catalog
            .update_product(
                &rival,
                product.id,
                ProductUpdate {
                    name: Some("Mine now".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let shopper = user(&f.store, "shopper", UserRole::User).await;
        let err = f
            .catalog
            .create_product(&shopper, new_product(&f.category, "Nope", 1.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}

mod cart {
    use super::*;

    #[tokio::test]
    async fn test_cart_follows_catalog_changes() {
        let f = fixture().await;
        let product = f
            .catalog
            .create_product(&f.seller, new_product(&f.category, "Headphones", 80.0, 3))
            .await
            .unwrap();
        let shopper = UserId::new();

        let view = f.cart.add(shopper, product.id, 2, None).await.unwrap();
        assert_eq!(view.total_items, 2);
        assert_eq!(
            view.items[0].product_details.as_ref().unwrap().name,
            "Headphones"
        );

        let err = f.cart.add(shopper, product.id, 2, None).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));

        // Cart lines keep the price captured when they were added.
        f.catalog
            .update_product(
                &f.seller,
                product.id,
                ProductUpdate {
                    price: Some(common::Money::from_major(95)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let view = f.cart.get(shopper).await.unwrap();
        assert_eq!(view.items[0].item.price, common::Money::from_major(80));
        assert_eq!(
            view.items[0].product_details.as_ref().unwrap().price,
            common::Money::from_major(95)
        );

        f.catalog.delete_product(&f.seller, product.id).await.unwrap();
        let err = f.cart.add(shopper, product.id, 1, None).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_variants_make_separate_lines() {
        let f = fixture().await;
        let product = f
            .catalog
            .create_product(&f.seller, new_product(&f.category, "Shirt", 20.0, 10))
            .await
            .unwrap();
        let shopper = UserId::new();
        let red = VariantSelection::new("color", "red");
        let blue = VariantSelection::new("color", "blue");

        f.cart
            .add(shopper, product.id, 1, Some(red.clone()))
            .await
            .unwrap();
        f.cart
            .add(shopper, product.id, 2, Some(blue.clone()))
            .await
            .unwrap();
        let view = f
            .cart
            .set_quantity(shopper, product.id, 3, Some(red.clone()))
            .await
            .unwrap();
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total_items, 5);

        let view = f.cart.remove(shopper, product.id, Some(blue)).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].item.variant, Some(red));

        let summary = f.cart.summary(shopper).await.unwrap();
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_amount, common::Money::from_major(60));

        let view = f.cart.clear(shopper).await.unwrap();
        assert!(view.items.is_empty());
        assert!(view.total_amount.is_zero());
    }
}
