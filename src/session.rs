//! Per-browser session holding the serialized cart.
//!
//! The session is an injected, request-scoped key-value blob: a `sessions`
//! row keyed by a uuid carried in the `cart_session` cookie. Cart routes
//! extract a [`SessionId`] (minting one when the cookie is absent) and go
//! through [`CartSession`] for every read and write, so the dual-shape
//! decoding in [`crate::cart::normalize`] stays behind one boundary.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    cart::{self, Cart},
    db::DbPool,
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "cart_session";

#[derive(Debug, Clone, Copy)]
pub struct SessionId {
    pub id: Uuid,
    pub is_new: bool,
}

impl SessionId {
    /// `Set-Cookie` value refreshing the session on every cart response.
    pub fn cookie_value(&self) -> String {
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id)
    }
}

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_session_cookie);

        Ok(match existing {
            Some(id) => SessionId { id, is_new: false },
            None => SessionId {
                id: Uuid::new_v4(),
                is_new: true,
            },
        })
    }
}

fn parse_session_cookie(raw: &str) -> Option<Uuid> {
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Request-scoped handle over the session's cart blob.
pub struct CartSession<'a> {
    pool: &'a DbPool,
    id: Uuid,
}

impl<'a> CartSession<'a> {
    pub fn new(pool: &'a DbPool, session: SessionId) -> Self {
        Self {
            pool,
            id: session.id,
        }
    }

    /// Read the cart, transparently upgrading a legacy dictionary-shaped
    /// blob. A missing session row is an empty cart.
    pub async fn load(&self) -> AppResult<Cart> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT data FROM sessions WHERE id = $1")
            .bind(self.id)
            .fetch_optional(self.pool)
            .await?;

        Ok(match row {
            Some((raw,)) => cart::normalize(raw),
            None => Cart::default(),
        })
    }

    /// Persist the cart in the canonical sequence shape.
    pub async fn save(&self, cart: &Cart) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, data) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(self.id)
        .bind(cart.to_value())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Drop the session cart entirely.
    pub async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(self.id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_parsing_picks_out_the_session() {
        let id = Uuid::new_v4();
        let raw = format!("theme=dark; cart_session={id}; lang=en");
        assert_eq!(parse_session_cookie(&raw), Some(id));

        assert_eq!(parse_session_cookie("theme=dark"), None);
        assert_eq!(parse_session_cookie("cart_session=not-a-uuid"), None);
        assert_eq!(parse_session_cookie(""), None);
    }
}
