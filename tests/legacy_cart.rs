use axum_food_ordering_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::AddToCartRequest,
    services::cart_service,
    session::SessionId,
    state::AppState,
};
use uuid::Uuid;

// Loading a legacy dictionary-shaped cart yields the canonical sequence shape
// with the same (product, quantity) pairs, priced like any other cart.
#[tokio::test]
async fn legacy_cart_blob_is_upgraded_on_load() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Rows use unique names so this test can share the database with the
    // checkout flow binary without truncating anything.
    let suffix = Uuid::new_v4().simple().to_string();
    let owner_id = create_user(
        &state,
        &format!("legacy_owner_{suffix}"),
        &format!("legacy_owner_{suffix}@example.com"),
    )
    .await?;
    let restaurant_id = create_restaurant(&state, owner_id).await?;
    let product_id = create_product(&state, restaurant_id).await?;

    let session = SessionId {
        id: Uuid::new_v4(),
        is_new: true,
    };

    // Write the old dictionary shape straight into the session row.
    let legacy = serde_json::json!({
        "restaurant_id": restaurant_id,
        "items": { product_id.to_string(): { "quantity": 3 } }
    });
    sqlx::query("INSERT INTO sessions (id, data) VALUES ($1, $2)")
        .bind(session.id)
        .bind(&legacy)
        .execute(&state.pool)
        .await?;

    let cart_view = cart_service::view_cart(&state, session).await?.data.unwrap();
    assert_eq!(cart_view.lines.len(), 1);
    assert_eq!(cart_view.lines[0].quantity, 3);
    assert_eq!(cart_view.subtotal, 2250);

    // Any mutation persists the canonical sequence shape.
    cart_service::add_to_cart(
        &state,
        session,
        AddToCartRequest {
            product_id,
            restaurant_id,
            quantity: Some("1".into()),
        },
    )
    .await?;

    let (raw,): (serde_json::Value,) =
        sqlx::query_as("SELECT data FROM sessions WHERE id = $1")
            .bind(session.id)
            .fetch_one(&state.pool)
            .await?;
    let lines = raw.as_array().expect("canonical cart is a JSON array");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], serde_json::json!(4));
    assert_eq!(
        lines[0]["product_id"],
        serde_json::json!(product_id.to_string())
    );

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState { pool, orm })
}

async fn create_user(state: &AppState, username: &str, email: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, 'dummy', 'owner')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}

async fn create_restaurant(state: &AppState, owner_id: Uuid) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, user_id, name, address, phone, delivery_fee, min_order)
        VALUES ($1, $2, 'Legacy Diner', '2 Memory Ln', '555-0198', 0, 0)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}

async fn create_product(state: &AppState, restaurant_id: Uuid) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (id, restaurant_id, name, price)
        VALUES ($1, $2, 'Blue Plate Special', 750)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(restaurant_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}
