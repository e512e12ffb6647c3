use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{CreateProductRequest, ProductDto, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::tenant::StaffContext,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
};

#[derive(FromRow)]
struct ProductWithCategoryRow {
    id: Uuid,
    business_id: Uuid,
    category_id: Option<Uuid>,
    name: String,
    base_price: i64,
    image_url: Option<String>,
    stock: i32,
    track_inventory: bool,
    created_at: DateTime<Utc>,
    category_name: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, business_id: Uuid, query: &ProductQuery) {
    qb.push(" WHERE p.business_id = ");
    qb.push_bind(business_id);
    if let Some(q) = query.q.as_ref().filter(|s| !s.is_empty()) {
        qb.push(" AND p.name ILIKE ");
        qb.push_bind(format!("%{q}%"));
    }
    if let Some(category_id) = query.category_id {
        qb.push(" AND p.category_id = ");
        qb.push_bind(category_id);
    }
    if let Some(min_price) = query.min_price {
        qb.push(" AND p.base_price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = query.max_price {
        qb.push(" AND p.base_price <= ");
        qb.push_bind(max_price);
    }
}

pub async fn list_products(
    pool: &DbPool,
    ctx: &StaffContext,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut qb = QueryBuilder::new(
        "SELECT p.id, p.business_id, p.category_id, p.name, p.base_price, p.image_url, \
         p.stock, p.track_inventory, p.created_at, c.name AS category_name \
         FROM products p LEFT JOIN categories c ON c.id = p.category_id",
    );
    push_filters(&mut qb, ctx.business_id, &query);
    qb.push(" ORDER BY ");
    qb.push(sort_by.as_sql());
    qb.push(" ");
    qb.push(sort_order.as_sql());
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows: Vec<ProductWithCategoryRow> = qb.build_query_as().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM products p");
    push_filters(&mut count_qb, ctx.business_id, &query);
    let total: (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    let items = rows
        .into_iter()
        .map(|row| ProductDto {
            product: Product {
                id: row.id,
                business_id: row.business_id,
                category_id: row.category_id,
                name: row.name,
                base_price: row.base_price,
                image_url: row.image_url,
                stock: row.stock,
                track_inventory: row.track_inventory,
                created_at: row.created_at,
            },
            category_name: row.category_name,
        })
        .collect();

    let meta = Meta::paged(page, limit, total.0);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(
    pool: &DbPool,
    ctx: &StaffContext,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = fetch_product(pool, ctx, id).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    pool: &DbPool,
    ctx: &StaffContext,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.base_price < 0 {
        return Err(AppError::BadRequest("base_price must not be negative".to_string()));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(pool, ctx, category_id).await?;
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, business_id, category_id, name, base_price, image_url, stock, track_inventory)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(ctx.business_id)
    .bind(payload.category_id)
    .bind(payload.name)
    .bind(payload.base_price)
    .bind(payload.image_url)
    .bind(payload.stock)
    .bind(payload.track_inventory.unwrap_or(true))
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(ctx.staff_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    pool: &DbPool,
    ctx: &StaffContext,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = fetch_product(pool, ctx, id).await?;

    if let Some(category_id) = payload.category_id {
        ensure_category(pool, ctx, category_id).await?;
    }

    let name = payload.name.unwrap_or(existing.name);
    let base_price = payload.base_price.unwrap_or(existing.base_price);
    let stock = payload.stock.unwrap_or(existing.stock);
    let category_id = payload.category_id.or(existing.category_id);
    let image_url = payload.image_url.or(existing.image_url);
    let track_inventory = payload.track_inventory.unwrap_or(existing.track_inventory);

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $3, base_price = $4, stock = $5, category_id = $6, image_url = $7, track_inventory = $8
        WHERE id = $1 AND business_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(ctx.business_id)
    .bind(name)
    .bind(base_price)
    .bind(stock)
    .bind(category_id)
    .bind(image_url)
    .bind(track_inventory)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(ctx.staff_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    pool: &DbPool,
    ctx: &StaffContext,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND business_id = $2")
        .bind(id)
        .bind(ctx.business_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(ctx.staff_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}

pub async fn fetch_product(pool: &DbPool, ctx: &StaffContext, id: Uuid) -> AppResult<Product> {
    let product =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND business_id = $2")
            .bind(id)
            .bind(ctx.business_id)
            .fetch_optional(pool)
            .await?;
    product.ok_or(AppError::NotFound)
}

async fn ensure_category(pool: &DbPool, ctx: &StaffContext, category_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM categories WHERE id = $1 AND business_id = $2")
            .bind(category_id)
            .bind(ctx.business_id)
            .fetch_optional(pool)
            .await?;
    if exists.is_none() {
        return Err(AppError::BadRequest("category not found".to_string()));
    }
    Ok(())
}
