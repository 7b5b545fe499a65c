use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use crate::server::AppState;
use crate::server::dto::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::service::customers::{self, CustomerChanges};
use crate::types::NewCustomer;

pub fn customers_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/{id}", put(update_customer).delete(delete_customer))
}

async fn list_customers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let customers = customers::list_customers(state.store.as_ref())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(customers)))
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCustomerRequest>,
) -> impl IntoResponse {
    let customer = customers::create_customer(
        state.store.as_ref(),
        NewCustomer {
            name: req.nome,
            email: req.email,
            phone: req.telefone,
        },
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCustomerRequest>,
) -> impl IntoResponse {
    let customer = customers::update_customer(
        state.store.as_ref(),
        id,
        CustomerChanges {
            name: req.nome,
            email: req.email,
            phone: req.telefone,
        },
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(customer)))
}

async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    customers::delete_customer(state.store.as_ref(), id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
