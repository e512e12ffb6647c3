use axum_pos_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let business_id = ensure_business(&pool, "Kopi Pagi", "kopi-pagi").await?;
    let store_id = ensure_store(&pool, business_id, "Main Counter").await?;
    let staff_id = ensure_staff(&pool, business_id, "Demo Cashier", "cashier").await?;
    seed_catalog(&pool, business_id).await?;

    println!(
        "Seed completed. Business: {business_id}, Store: {store_id}, Staff: {staff_id}"
    );
    Ok(())
}

async fn ensure_business(pool: &sqlx::PgPool, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO businesses (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    println!("Ensured business {slug}");
    Ok(row.0)
}

async fn ensure_store(
    pool: &sqlx::PgPool,
    business_id: Uuid,
    name: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM stores WHERE business_id = $1 AND name = $2")
            .bind(business_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let row: (Uuid,) =
        sqlx::query_as("INSERT INTO stores (id, business_id, name) VALUES ($1, $2, $3) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(business_id)
            .bind(name)
            .fetch_one(pool)
            .await?;

    println!("Ensured store {name}");
    Ok(row.0)
}

async fn ensure_staff(
    pool: &sqlx::PgPool,
    business_id: Uuid,
    name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM staff_profiles WHERE business_id = $1 AND name = $2")
            .bind(business_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO staff_profiles (id, business_id, name, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(business_id)
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured staff {name} (role={role})");
    Ok(row.0)
}

async fn seed_catalog(pool: &sqlx::PgPool, business_id: Uuid) -> anyhow::Result<()> {
    let categories = vec!["Coffee", "Tea", "Snacks"];
    let mut category_ids = Vec::new();

    for name in categories {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM categories WHERE business_id = $1 AND name = $2")
                .bind(business_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        let id = match existing {
            Some((id,)) => id,
            None => {
                let row: (Uuid,) = sqlx::query_as(
                    "INSERT INTO categories (id, business_id, name) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(Uuid::new_v4())
                .bind(business_id)
                .bind(name)
                .fetch_one(pool)
                .await?;
                row.0
            }
        };
        category_ids.push(id);
    }

    let products = vec![
        ("Es Kopi Susu", 18000_i64, 100, 0_usize),
        ("Americano", 15000, 100, 0),
        ("Teh Tarik", 12000, 80, 1),
        ("Pisang Goreng", 8000, 40, 2),
    ];

    for (name, base_price, stock, category_idx) in products {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE business_id = $1 AND name = $2")
                .bind(business_id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO products (id, business_id, category_id, name, base_price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind(category_ids[category_idx])
        .bind(name)
        .bind(base_price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
