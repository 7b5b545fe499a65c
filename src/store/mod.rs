mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::types::*;

/// What a status change does to the reservation's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEffect {
    Keep,
    /// Mark the table available again, unless another active reservation holds it.
    Release,
    /// Take the table; fails with `Conflict` if it is not available.
    Claim,
}

impl TableEffect {
    /// Effect of moving a reservation from `from` to `to`.
    #[must_use]
    pub fn between(from: ReservationStatus, to: ReservationStatus) -> Self {
        match (from.is_active(), to.is_active()) {
            (_, false) => Self::Release,
            (false, true) => Self::Claim,
            (true, true) => Self::Keep,
        }
    }
}

/// Store defines the database interface.
///
/// Methods that touch more than one row commit atomically: either every
/// write is visible afterwards or none is.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Customer operations
    fn create_customer(&self, customer: &NewCustomer) -> Result<Customer>;
    fn get_customer(&self, id: i64) -> Result<Option<Customer>>;
    fn list_customers(&self) -> Result<Vec<Customer>>;
    fn update_customer(&self, customer: &Customer) -> Result<()>;
    fn delete_customer(&self, id: i64) -> Result<bool>;
    fn count_customer_reservations(&self, id: i64) -> Result<i64>;

    // Staff operations
    fn create_staff(&self, staff: &NewStaff) -> Result<Staff>;
    fn get_staff(&self, id: i64) -> Result<Option<Staff>>;
    fn get_staff_by_email(&self, email: &str) -> Result<Option<Staff>>;
    fn list_staff(&self) -> Result<Vec<Staff>>;
    fn update_staff(&self, staff: &Staff) -> Result<()>;
    fn delete_staff(&self, id: i64) -> Result<bool>;
    fn count_staff(&self) -> Result<i64>;

    // Table operations
    fn create_table(&self, table: &NewTable) -> Result<Table>;
    fn get_table(&self, id: i64) -> Result<Option<Table>>;
    fn list_tables(&self) -> Result<Vec<Table>>;
    fn set_table_available(&self, id: i64, available: bool) -> Result<()>;
    fn delete_table(&self, id: i64) -> Result<bool>;
    fn count_table_reservations(&self, id: i64) -> Result<i64>;
    fn count_tables(&self) -> Result<i64>;
    fn count_occupied_tables(&self) -> Result<i64>;

    // Reservation operations
    /// Inserts the reservation and marks its table unavailable in one
    /// transaction. Fails with `Conflict` if the table is already taken.
    fn create_reservation_claiming_table(&self, reservation: &NewReservation)
    -> Result<Reservation>;
    fn get_reservation(&self, id: i64) -> Result<Option<Reservation>>;
    fn get_reservation_view(&self, id: i64) -> Result<Option<ReservationView>>;
    fn list_reservation_views(&self) -> Result<Vec<ReservationView>>;
    /// Sets the status and applies the matching [`TableEffect`], both
    /// computed and written in one transaction. Returns the applied effect
    /// and the reservation's table id.
    fn update_reservation_status(
        &self,
        id: i64,
        status: ReservationStatus,
    ) -> Result<(TableEffect, i64)>;
    /// Marks the reservation's table available and removes the reservation.
    fn delete_reservation_releasing_table(&self, id: i64) -> Result<bool>;

    // Reservation aggregates
    fn count_reservations(&self) -> Result<i64>;
    fn count_reservations_by_status(&self, status: ReservationStatus) -> Result<i64>;
    fn count_reservations_on(&self, date: NaiveDate) -> Result<i64>;
    /// Per-day counts for `from..=to`. Days without reservations are omitted.
    fn count_reservations_by_date(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    fn close(&self) -> Result<()>;
}
