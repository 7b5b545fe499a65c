use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::auth::{CredentialHasher, RequireStaff};
use crate::server::AppState;
use crate::server::dto::{CreateStaffRequest, LoginRequest, LoginResponse, UpdateStaffRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::service::staff::{self, StaffChanges, StaffRequest};

pub fn staff_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_staff).post(create_staff))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/{id}", put(update_staff).delete(delete_staff))
}

async fn list_staff(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let staff = staff::list_staff(state.store.as_ref())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(staff)))
}

async fn create_staff(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStaffRequest>,
) -> impl IntoResponse {
    let staff = staff::create_staff(
        state.store.as_ref(),
        &CredentialHasher::new(),
        StaffRequest {
            name: req.nome,
            email: req.email,
            role: req.cargo,
            password: req.senha,
        },
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(staff))))
}

async fn update_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStaffRequest>,
) -> impl IntoResponse {
    let staff = staff::update_staff(
        state.store.as_ref(),
        &CredentialHasher::new(),
        &state.config.admin_email,
        id,
        StaffChanges {
            name: req.nome,
            email: req.email,
            role: req.cargo,
            password: req.senha,
        },
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(staff)))
}

async fn delete_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    staff::delete_staff(state.store.as_ref(), &state.config.admin_email, id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let session = staff::authenticate(
        state.store.as_ref(),
        &req.email,
        &req.senha,
        state.config.token_ttl()?,
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(LoginResponse {
        mensagem: "Login realizado com sucesso".to_string(),
        token: session.token,
        funcionario: session.staff,
    })))
}

async fn me(auth: RequireStaff) -> impl IntoResponse {
    Json(ApiResponse::success(auth.staff))
}

async fn logout(
    auth: RequireStaff,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    staff::logout(state.store.as_ref(), &auth.token.id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
