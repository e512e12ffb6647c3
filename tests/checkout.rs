use std::sync::Mutex;

use axum_pos_api::cart::CartStore;
use axum_pos_api::checkout::{
    self, CheckoutContext, CheckoutError, NewOrder, NewOrderLine, OrderStore, PaymentMethod,
};
use axum_pos_api::models::Product;
use chrono::Utc;
use uuid::Uuid;

/// In-memory backend that records every call so tests can assert on the
/// exact write sequence, with switchable failure points.
#[derive(Default)]
struct RecordingStore {
    headers: Mutex<Vec<NewOrder>>,
    line_batches: Mutex<Vec<Vec<NewOrderLine>>>,
    delete_attempts: Mutex<Vec<Uuid>>,
    fail_header: bool,
    fail_lines: bool,
    fail_delete: bool,
}

impl RecordingStore {
    fn failing_lines(fail_delete: bool) -> Self {
        Self {
            fail_lines: true,
            fail_delete,
            ..Self::default()
        }
    }

    fn header_count(&self) -> usize {
        self.headers.lock().unwrap().len()
    }

    fn batch_count(&self) -> usize {
        self.line_batches.lock().unwrap().len()
    }
}

impl OrderStore for RecordingStore {
    async fn create_order(&self, order: &NewOrder) -> Result<Uuid, sqlx::Error> {
        if self.fail_header {
            return Err(sqlx::Error::Protocol("header insert rejected".into()));
        }
        self.headers.lock().unwrap().push(order.clone());
        Ok(Uuid::new_v4())
    }

    async fn create_order_lines(&self, lines: &[NewOrderLine]) -> Result<(), sqlx::Error> {
        if self.fail_lines {
            return Err(sqlx::Error::Protocol("line batch rejected".into()));
        }
        self.line_batches.lock().unwrap().push(lines.to_vec());
        Ok(())
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), sqlx::Error> {
        self.delete_attempts.lock().unwrap().push(order_id);
        if self.fail_delete {
            return Err(sqlx::Error::Protocol("delete rejected".into()));
        }
        Ok(())
    }
}

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

fn context() -> CheckoutContext {
    CheckoutContext {
        business_id: Uuid::new_v4(),
        store_id: Uuid::new_v4(),
        created_by: Uuid::new_v4(),
    }
}

fn loaded_cart(dir: &tempfile::TempDir) -> anyhow::Result<CartStore> {
    let cart = CartStore::open(dir.path().join("order.json"));
    let p1 = product("Es Kopi Susu", 15000);
    let p2 = product("Pisang Goreng", 8000);
    cart.add_item(&p1)?;
    cart.add_item(&p1)?;
    cart.add_item(&p2)?;
    Ok(cart)
}

#[tokio::test]
async fn checkout_writes_header_then_lines_and_clears_the_cart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cart = loaded_cart(&dir)?;
    assert_eq!(cart.snapshot().total, 38000);

    let store = RecordingStore::default();
    let receipt =
        checkout::checkout_cart(&store, &cart, &context(), PaymentMethod::Qris).await?;

    let headers = store.headers.lock().unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].total_amount, 38000);
    assert_eq!(headers[0].tax_amount, 0);
    assert_eq!(headers[0].payment_method.as_str(), "qris");

    let batches = store.line_batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    assert!(batches[0].iter().all(|l| l.order_id == receipt.order_id));
    let quantities: Vec<i32> = batches[0].iter().map(|l| l.quantity).collect();
    assert_eq!(quantities, [2, 1]);
    let prices: Vec<i64> = batches[0].iter().map(|l| l.unit_price).collect();
    assert_eq!(prices, [15000, 8000]);

    assert_eq!(receipt.total_amount, 38000);
    assert!(cart.snapshot().lines.is_empty());
    assert_eq!(cart.snapshot().total, 0);
    Ok(())
}

#[tokio::test]
async fn empty_cart_checkout_performs_no_writes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cart = CartStore::open(dir.path().join("order.json"));
    let store = RecordingStore::default();

    let err = checkout::checkout_cart(&store, &cart, &context(), PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(store.header_count(), 0);
    assert_eq!(store.batch_count(), 0);
    assert!(store.delete_attempts.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn header_failure_aborts_before_lines_and_keeps_the_cart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cart = loaded_cart(&dir)?;
    let store = RecordingStore {
        fail_header: true,
        ..RecordingStore::default()
    };

    let err = checkout::checkout_cart(&store, &cart, &context(), PaymentMethod::Card)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::HeaderWrite(_)));
    assert_eq!(store.batch_count(), 0);
    assert!(store.delete_attempts.lock().unwrap().is_empty());
    assert_eq!(cart.snapshot().total, 38000);
    Ok(())
}

#[tokio::test]
async fn line_failure_rolls_back_the_header_and_keeps_the_cart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cart = loaded_cart(&dir)?;
    let store = RecordingStore::failing_lines(false);

    let err = checkout::checkout_cart(&store, &cart, &context(), PaymentMethod::Transfer)
        .await
        .unwrap_err();

    match err {
        CheckoutError::LineItemWrite {
            order_id,
            compensated,
            ..
        } => {
            assert!(compensated);
            let attempts = store.delete_attempts.lock().unwrap();
            assert_eq!(attempts.as_slice(), [order_id]);
        }
        other => panic!("expected LineItemWrite, got {other:?}"),
    }

    assert_eq!(cart.snapshot().total, 38000);
    Ok(())
}

// Header landed, lines failed, and the rollback failed too: the error must
// stay distinguishable from a plain header failure because the backend is
// now holding an orphaned header.
#[tokio::test]
async fn failed_rollback_is_reported_as_an_uncompensated_orphan() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cart = loaded_cart(&dir)?;
    let store = RecordingStore::failing_lines(true);

    let err = checkout::checkout_cart(&store, &cart, &context(), PaymentMethod::Qris)
        .await
        .unwrap_err();

    assert!(!matches!(err, CheckoutError::HeaderWrite(_)));
    match err {
        CheckoutError::LineItemWrite {
            order_id,
            compensated,
            ..
        } => {
            assert!(!compensated);
            assert_eq!(store.delete_attempts.lock().unwrap().as_slice(), [order_id]);
        }
        other => panic!("expected LineItemWrite, got {other:?}"),
    }

    // The operator can retry with the order intact.
    assert_eq!(cart.snapshot().total, 38000);
    assert_eq!(cart.snapshot().lines.len(), 2);
    Ok(())
}

#[test]
fn payment_methods_normalize_case_on_parse() {
    assert_eq!(PaymentMethod::parse("QRIS"), Some(PaymentMethod::Qris));
    assert_eq!(PaymentMethod::parse("CaSh"), Some(PaymentMethod::Cash));
    assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
    assert_eq!(
        PaymentMethod::parse("Transfer"),
        Some(PaymentMethod::Transfer)
    );
    assert_eq!(PaymentMethod::parse("visa"), None);

    assert_eq!(PaymentMethod::Qris.as_str(), "qris");
    assert_eq!(PaymentMethod::Transfer.to_string(), "transfer");
}
