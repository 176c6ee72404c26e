use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_food_ordering_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let owner_id = ensure_user(&pool, "pizza_pete", "owner@example.com", "owner123", "owner").await?;
    let customer_id =
        ensure_user(&pool, "hungry_helen", "customer@example.com", "customer123", "customer")
            .await?;

    let restaurant_id = ensure_restaurant(&pool, owner_id).await?;
    seed_menu(&pool, restaurant_id).await?;

    println!("Seed completed. Owner ID: {owner_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    row.map(|(id,)| id)
        .ok_or_else(|| anyhow::anyhow!("failed to upsert user {email}"))
}

async fn ensure_restaurant(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM restaurants WHERE user_id = $1")
            .bind(owner_id)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, user_id, name, description, address, phone, delivery_fee, min_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind("Pete's Pizza")
    .bind(Some("Wood-fired pizza and sides"))
    .bind("1 Oven Lane")
    .bind("555-0100")
    .bind(300_i64)
    .bind(2000_i64)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_menu(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    let menu: [(&str, i64); 3] = [
        ("Margherita", 1000),
        ("Pepperoni", 1200),
        ("Garlic Bread", 500),
    ];

    for (name, price) in menu {
        sqlx::query(
            r#"
            INSERT INTO products (id, restaurant_id, name, price)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM products WHERE restaurant_id = $2 AND name = $3
            )
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(name)
        .bind(price)
        .execute(pool)
        .await?;
    }

    Ok(())
}
