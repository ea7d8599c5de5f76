//! Response helpers. Rows are returned bare, shaped by the entity's declared columns.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeleteConfirmation {
    pub detail: &'static str,
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn ok_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Vec<T>>) {
    (StatusCode::OK, Json(data))
}

pub fn deleted() -> (StatusCode, Json<DeleteConfirmation>) {
    (
        StatusCode::OK,
        Json(DeleteConfirmation {
            detail: "Item deleted successfully",
        }),
    )
}
