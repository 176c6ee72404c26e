use crate::db::{DbPool, OrmConn};

/// Shared handles cloned into every handler. Both connections point at the
/// same database: `pool` serves plain reads and the session store, `orm`
/// serves entity queries and the checkout transaction.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}
