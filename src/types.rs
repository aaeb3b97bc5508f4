use crate::db_types::{ActiveCall, OnCall, Priest};
use crate::repository::{PgRepository, Repository};

use sqlx::PgPool;
use std::sync::Arc;

/// Shared handle to one entity's repository.
pub type Repo<E> = Arc<dyn Repository<E>>;

/// Repositories injected into the router at startup.
#[derive(Clone)]
pub struct AppState {
    pub active_calls: Repo<ActiveCall>,
    pub on_calls: Repo<OnCall>,
    pub priests: Repo<Priest>,
}

impl AppState {
    /// Build the Postgres repositories over one shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            active_calls: Arc::new(PgRepository::<ActiveCall>::new(pool.clone())),
            on_calls: Arc::new(PgRepository::<OnCall>::new(pool.clone())),
            priests: Arc::new(PgRepository::<Priest>::new(pool)),
        }
    }
}
