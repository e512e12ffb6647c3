use crate::cart::CartStore;
use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub cart: CartStore,
}
