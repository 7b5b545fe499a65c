use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::server::AppState;
use crate::server::dto::{CreateReservationRequest, UpdateReservationRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::service::reservations::{self, ReservationRequest};

pub fn reservations_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_reservations).post(create_reservation))
        .route(
            "/{id}",
            get(get_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
}

async fn list_reservations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reservations = reservations::list_reservations(state.store.as_ref())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(reservations)))
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReservationRequest>,
) -> impl IntoResponse {
    let reservation = reservations::create_reservation(
        state.store.as_ref(),
        ReservationRequest {
            customer_id: req.cliente_id,
            table_id: req.mesa_id,
            date: req.data_reserva,
            time: req.horario,
            status: req.status,
        },
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(reservation))))
}

async fn get_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let reservation = reservations::get_reservation(state.store.as_ref(), id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(reservation)))
}

async fn update_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateReservationRequest>,
) -> impl IntoResponse {
    let reservation = reservations::update_status(state.store.as_ref(), id, &req.status)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(reservation)))
}

async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    reservations::delete_reservation(state.store.as_ref(), id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
