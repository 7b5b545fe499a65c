use serde::{Deserialize, Serialize};

use crate::types::Staff;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub telefone: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub nome: String,
    pub email: String,
    pub cargo: String,
    pub senha: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStaffRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub mensagem: String,
    pub token: String,
    pub funcionario: Staff,
}

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub numero: i32,
    pub capacidade: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTableRequest {
    #[serde(default)]
    pub disponivel: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub cliente_id: i64,
    pub mesa_id: i64,
    pub data_reserva: String,
    pub horario: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReservationRequest {
    pub status: String,
}
