use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ReservationStatus;

/// Display format for reservation dates in read models.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Wire and storage format for reservation dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "cargo")]
    pub role: String,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    #[serde(rename = "numero")]
    pub number: i32,
    #[serde(rename = "capacidade")]
    pub capacity: i32,
    #[serde(rename = "disponivel")]
    pub available: bool,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewTable {
    pub number: i32,
    pub capacity: i32,
}

/// Persisted reservation row. Use [`ReservationView`] for API output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: i64,
    pub customer_id: i64,
    pub table_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields for a reservation that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub customer_id: i64,
    pub table_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: ReservationStatus,
}

/// Reservation joined with snapshots of its customer and table.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub id: i64,
    #[serde(rename = "cliente")]
    pub customer: Customer,
    #[serde(rename = "mesa")]
    pub table: Table,
    #[serde(rename = "data_reserva", serialize_with = "serialize_display_date")]
    pub date: NaiveDate,
    #[serde(rename = "horario")]
    pub time: String,
    pub status: ReservationStatus,
    #[serde(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}

impl ReservationView {
    #[must_use]
    pub fn join(reservation: Reservation, customer: Customer, table: Table) -> Self {
        Self {
            id: reservation.id,
            customer,
            table,
            date: reservation.date,
            time: reservation.time,
            status: reservation.status,
            created_at: reservation.created_at,
        }
    }
}

fn serialize_display_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&date.format(DISPLAY_DATE_FORMAT))
}

/// Bearer token issued to a staff member at login.
#[derive(Debug, Clone)]
pub struct Token {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub staff_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
