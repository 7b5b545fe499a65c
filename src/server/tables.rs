use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use crate::server::AppState;
use crate::server::dto::{CreateTableRequest, UpdateTableRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::service::tables;
use crate::types::NewTable;

pub fn tables_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tables).post(create_table))
        .route("/{id}", put(update_table).delete(delete_table))
}

async fn list_tables(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tables = tables::list_tables(state.store.as_ref())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(tables)))
}

async fn create_table(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTableRequest>,
) -> impl IntoResponse {
    let table = tables::create_table(
        state.store.as_ref(),
        NewTable {
            number: req.numero,
            capacity: req.capacidade,
        },
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(table))))
}

/// Only the availability flag is writable here.
async fn update_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTableRequest>,
) -> impl IntoResponse {
    let table = tables::update_availability(state.store.as_ref(), id, req.disponivel)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(table)))
}

async fn delete_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    tables::delete_table(state.store.as_ref(), id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
