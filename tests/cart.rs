use axum_pos_api::cart::{Cart, CartError, CartStore};
use axum_pos_api::models::Product;
use chrono::Utc;
use uuid::Uuid;

fn product(name: &str, base_price: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        category_id: None,
        name: name.to_string(),
        base_price,
        image_url: None,
        stock: 10,
        track_inventory: true,
        created_at: Utc::now(),
    }
}

#[test]
fn adding_same_product_twice_merges_into_one_line() {
    let mut cart = Cart::new();
    let p = product("Es Kopi Susu", 18000);

    cart.add_item(&p);
    cart.add_item(&p);

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
    assert_eq!(cart.total(), 36000);
}

#[test]
fn update_quantity_to_zero_or_negative_removes_the_line() {
    for qty in [0, -5] {
        let mut cart = Cart::new();
        let p = product("Americano", 15000);
        cart.add_item(&p);

        cart.update_quantity(p.id, qty).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }
}

#[test]
fn update_quantity_sets_absolute_value() {
    let mut cart = Cart::new();
    let p = product("Teh Tarik", 12000);
    cart.add_item(&p);

    cart.update_quantity(p.id, 7).unwrap();

    assert_eq!(cart.lines()[0].quantity, 7);
    assert_eq!(cart.total(), 84000);
}

#[test]
fn update_quantity_on_absent_product_is_reported() {
    let mut cart = Cart::new();
    let p = product("Pisang Goreng", 8000);
    cart.add_item(&p);

    let missing = Uuid::new_v4();
    let err = cart.update_quantity(missing, 3).unwrap_err();
    assert!(matches!(err, CartError::NoSuchLine(id) if id == missing));

    // Also an error when the requested quantity would have removed the line.
    let err = cart.update_quantity(missing, 0).unwrap_err();
    assert!(matches!(err, CartError::NoSuchLine(_)));

    assert_eq!(cart.len(), 1);
}

#[test]
fn removing_an_absent_product_is_a_noop() {
    let mut cart = Cart::new();
    let p = product("Americano", 15000);
    cart.add_item(&p);
    let before = cart.snapshot();

    cart.remove_item(Uuid::new_v4());

    assert_eq!(cart.snapshot(), before);
}

#[test]
fn lines_keep_insertion_order() {
    let mut cart = Cart::new();
    let first = product("A", 1000);
    let second = product("B", 2000);
    let third = product("C", 3000);

    cart.add_item(&first);
    cart.add_item(&second);
    cart.add_item(&third);
    // Re-adding an existing product must not move its line.
    cart.add_item(&first);

    let names: Vec<&str> = cart.lines().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn captured_price_survives_catalog_changes() {
    let mut cart = Cart::new();
    let mut p = product("Es Kopi Susu", 18000);
    cart.add_item(&p);

    // A later price edit in the catalog must not reach the open order.
    p.base_price = 99000;

    assert_eq!(cart.lines()[0].unit_price, 18000);
    assert_eq!(cart.total(), 18000);
}

// Total always equals the sum over current lines, whatever the operation
// sequence. Deterministic pseudo-random walk checked against a mirror model.
#[test]
fn total_matches_model_under_random_operation_sequences() {
    let products: Vec<Product> = (0..8)
        .map(|i| product(&format!("p{i}"), 1000 * (i + 1)))
        .collect();

    let mut rng: u64 = 0x5eed_cafe_f00d_0001;
    let mut next = move || {
        rng = rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        rng >> 33
    };

    let mut cart = Cart::new();
    let mut model: Vec<(Uuid, i64, i64)> = Vec::new();

    for _ in 0..2000 {
        let p = &products[(next() % 8) as usize];
        match next() % 4 {
            0 | 1 => {
                cart.add_item(p);
                if let Some(entry) = model.iter_mut().find(|(id, _, _)| *id == p.id) {
                    entry.2 += 1;
                } else {
                    model.push((p.id, p.base_price, 1));
                }
            }
            2 => {
                cart.remove_item(p.id);
                model.retain(|(id, _, _)| *id != p.id);
            }
            _ => {
                let qty = (next() % 12) as i32 - 2;
                let in_model = model.iter().any(|(id, _, _)| *id == p.id);
                let result = cart.update_quantity(p.id, qty);
                if in_model {
                    result.unwrap();
                    if qty <= 0 {
                        model.retain(|(id, _, _)| *id != p.id);
                    } else if let Some(entry) = model.iter_mut().find(|(id, _, _)| *id == p.id) {
                        entry.2 = i64::from(qty);
                    }
                } else {
                    assert!(matches!(result, Err(CartError::NoSuchLine(_))));
                }
            }
        }

        let expected: i64 = model.iter().map(|(_, price, qty)| price * qty).sum();
        assert_eq!(cart.total(), expected);
        assert_eq!(cart.len(), model.len());
        assert!(cart.lines().iter().all(|l| l.quantity >= 1));
    }
}

#[test]
fn snapshot_round_trips_through_the_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("current-order-storage.json");

    let p1 = product("Es Kopi Susu", 18000);
    let p2 = product("Pisang Goreng", 8000);

    let store = CartStore::open(&path);
    store.add_item(&p1)?;
    store.add_item(&p1)?;
    store.add_item(&p2)?;
    let before = store.snapshot();
    drop(store);

    let reopened = CartStore::open(&path);
    let after = reopened.snapshot();

    assert_eq!(before, after);
    assert_eq!(after.total, 44000);
    Ok(())
}

#[test]
fn corrupt_snapshot_starts_an_empty_cart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("current-order-storage.json");
    std::fs::write(&path, b"{ not json")?;

    let store = CartStore::open(&path);

    assert!(store.snapshot().lines.is_empty());
    assert_eq!(store.snapshot().total, 0);
    Ok(())
}

#[test]
fn store_publishes_changes_to_observers() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CartStore::open(dir.path().join("order.json"));
    let rx = store.subscribe();

    let p = product("Americano", 15000);
    store.add_item(&p)?;
    store.add_item(&p)?;

    assert_eq!(rx.borrow().total, 30000);
    Ok(())
}
