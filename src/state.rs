//! Shared application state for all routes. The model is immutable once resolved.

use crate::config::ResolvedModel;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub model: Arc<ResolvedModel>,
}

impl AppState {
    pub fn new(pool: PgPool, model: ResolvedModel) -> Self {
        AppState {
            pool,
            model: Arc::new(model),
        }
    }
}
