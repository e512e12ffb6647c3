use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::{CartSnapshot, CartStore};

/// Accepted tender types. Parsed case-insensitively from client input and
/// always written lowercase, matching the database constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Qris,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "qris" => Some(Self::Qris),
            "card" => Some(Self::Card),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Qris => "qris",
            Self::Card => "card",
            Self::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is ringing up the sale, and for which tenant.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub business_id: Uuid,
    pub store_id: Uuid,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub business_id: Uuid,
    pub store_id: Uuid,
    pub created_by: Uuid,
    pub total_amount: i64,
    pub tax_amount: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Receipt {
    pub order_id: Uuid,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Precondition failure: nothing was submitted to the backend.
    #[error("cart is empty")]
    EmptyCart,

    /// The order header insert failed; nothing was written.
    #[error("order header write failed")]
    HeaderWrite(#[source] sqlx::Error),

    /// The line batch failed after the header was written. When
    /// `compensated` is false the header is an orphan in the backend and has
    /// been flagged for monitoring.
    #[error("order line write failed for order {order_id}")]
    LineItemWrite {
        order_id: Uuid,
        compensated: bool,
        #[source]
        source: sqlx::Error,
    },
}

/// Backend contract for persisting a completed sale: create a header
/// returning its server-side identifier, batch-insert its lines, and delete
/// a header again when the lines could not be written.
pub trait OrderStore {
    fn create_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Uuid, sqlx::Error>> + Send;

    fn create_order_lines(
        &self,
        lines: &[NewOrderLine],
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn delete_order(&self, order_id: Uuid) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

/// Convert a cart snapshot into persisted order records.
///
/// Header first, then the line batch referencing the returned id, each line
/// carrying the unit price captured when the product was added, never the
/// catalog's live price. A failed line batch triggers a compensating delete
/// of the header so a retry does not stack orphans. The caller's cart is
/// left untouched; clearing it on success is the caller's move.
pub async fn submit<S: OrderStore>(
    store: &S,
    ctx: &CheckoutContext,
    snapshot: &CartSnapshot,
    payment_method: PaymentMethod,
) -> Result<Receipt, CheckoutError> {
    if snapshot.lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let order = NewOrder {
        business_id: ctx.business_id,
        store_id: ctx.store_id,
        created_by: ctx.created_by,
        total_amount: snapshot.total,
        tax_amount: 0,
        payment_method,
    };

    let order_id = store
        .create_order(&order)
        .await
        .map_err(CheckoutError::HeaderWrite)?;

    let lines: Vec<NewOrderLine> = snapshot
        .lines
        .iter()
        .map(|line| NewOrderLine {
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();

    if let Err(source) = store.create_order_lines(&lines).await {
        let compensated = match store.delete_order(order_id).await {
            Ok(()) => {
                tracing::warn!(%order_id, "order lines failed, header rolled back");
                true
            }
            Err(err) => {
                tracing::error!(
                    %order_id,
                    error = %err,
                    "order lines failed and header rollback failed, orphaned header left behind"
                );
                false
            }
        };
        return Err(CheckoutError::LineItemWrite {
            order_id,
            compensated,
            source,
        });
    }

    Ok(Receipt {
        order_id,
        total_amount: order.total_amount,
        payment_method,
    })
}

/// Run `submit` against the register's cart and clear it once the backend
/// owns the order. Any failure leaves the cart exactly as it was so the
/// operator can retry.
pub async fn checkout_cart<S: OrderStore>(
    store: &S,
    cart: &CartStore,
    ctx: &CheckoutContext,
    payment_method: PaymentMethod,
) -> Result<Receipt, CheckoutError> {
    let snapshot = cart.snapshot();
    let receipt = submit(store, ctx, &snapshot, payment_method).await?;

    // The order is committed at this point. A snapshot write failure must
    // not un-report it; the next cart mutation rewrites the file anyway.
    if let Err(err) = cart.clear() {
        tracing::warn!(error = %err, order_id = %receipt.order_id, "cart clear after checkout failed");
    }

    Ok(receipt)
}
