//! Entity CRUD routes. The table name is a path parameter; handlers resolve it against the model.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:table", get(list).post(create))
        .route("/:table/", get(list).post(create))
        .route(
            "/:table/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
