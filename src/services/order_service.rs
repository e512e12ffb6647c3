use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    checkout::{self, CheckoutError, NewOrder, NewOrderLine, OrderStore, PaymentMethod},
    db::DbPool,
    dto::orders::{CheckoutRequest, OrderItemDetail, OrderList, OrderWithItems},
    error::{AppError, AppResult},
    middleware::tenant::StaffContext,
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Postgres-backed [`OrderStore`]. Header ids are generated here, on the
/// storage side of the contract; the line batch runs inside one transaction
/// so a partial batch can never land.
pub struct PgOrderStore {
    pool: DbPool,
}

impl PgOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: &NewOrder) -> Result<Uuid, sqlx::Error> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO orders (id, business_id, store_id, created_by, total_amount, tax_amount, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.business_id)
        .bind(order.store_id)
        .bind(order.created_by)
        .bind(order.total_amount)
        .bind(order.tax_amount)
        .bind(order.payment_method.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn create_order_lines(&self, lines: &[NewOrderLine]) -> Result<(), sqlx::Error> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut txn = self.pool.begin().await?;
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price) ",
        );
        qb.push_values(lines, |mut b, line| {
            b.push_bind(Uuid::new_v4())
                .push_bind(line.order_id)
                .push_bind(line.product_id)
                .push_bind(line.quantity)
                .push_bind(line.unit_price);
        });
        qb.build().execute(&mut *txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub async fn checkout(
    state: &AppState,
    ctx: &StaffContext,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let Some(method) = PaymentMethod::parse(&payload.payment_method) else {
        return Err(AppError::BadRequest(format!(
            "unsupported payment method: {}",
            payload.payment_method
        )));
    };

    let store = PgOrderStore::new(state.pool.clone());
    let receipt =
        match checkout::checkout_cart(&store, &state.cart, &ctx.checkout_context(), method).await {
            Ok(receipt) => receipt,
            Err(err) => {
                if let CheckoutError::LineItemWrite {
                    order_id,
                    compensated: false,
                    ..
                } = &err
                {
                    // Durable marker so monitoring can find the orphaned header.
                    if let Err(audit_err) = log_audit(
                        &state.pool,
                        Some(ctx.staff_id),
                        "checkout_orphan",
                        Some("orders"),
                        Some(serde_json::json!({ "order_id": order_id })),
                    )
                    .await
                    {
                        tracing::warn!(error = %audit_err, "audit log failed");
                    }
                }
                return Err(err.into());
            }
        };

    if let Err(err) = log_audit(
        &state.pool,
        Some(ctx.staff_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": receipt.order_id,
            "total_amount": receipt.total_amount,
            "payment_method": receipt.payment_method,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = fetch_order(&state.pool, ctx, receipt.order_id).await?;
    let items = fetch_order_items(&state.pool, order.id).await?;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    pool: &DbPool,
    ctx: &StaffContext,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let method = match query.payment_method.as_deref() {
        Some(raw) => match PaymentMethod::parse(raw) {
            Some(method) => Some(method),
            None => {
                return Err(AppError::BadRequest(format!(
                    "unsupported payment method: {raw}"
                )));
            }
        },
        None => None,
    };
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut qb = QueryBuilder::new("SELECT * FROM orders WHERE business_id = ");
    qb.push_bind(ctx.business_id);
    if let Some(method) = method {
        qb.push(" AND payment_method = ");
        qb.push_bind(method.as_str());
    }
    qb.push(" ORDER BY created_at ");
    qb.push(sort_order.as_sql());
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let orders: Vec<Order> = qb.build_query_as().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE business_id = ");
    count_qb.push_bind(ctx.business_id);
    if let Some(method) = method {
        count_qb.push(" AND payment_method = ");
        count_qb.push_bind(method.as_str());
    }
    let total: (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    let meta = Meta::paged(page, limit, total.0);
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order(
    pool: &DbPool,
    ctx: &StaffContext,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = fetch_order(pool, ctx, id).await?;
    let items = fetch_order_items(pool, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

async fn fetch_order(pool: &DbPool, ctx: &StaffContext, id: Uuid) -> AppResult<Order> {
    let order =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND business_id = $2")
            .bind(id)
            .bind(ctx.business_id)
            .fetch_optional(pool)
            .await?;
    order.ok_or(AppError::NotFound)
}

async fn fetch_order_items(pool: &DbPool, order_id: Uuid) -> AppResult<Vec<OrderItemDetail>> {
    let items = sqlx::query_as::<_, OrderItemDetail>(
        r#"
        SELECT oi.id, oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price, oi.created_at
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = $1
        ORDER BY oi.created_at
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}
