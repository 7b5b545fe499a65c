//! Reservation lifecycle and table availability.
//!
//! A table's `available` flag is false exactly while an active (not
//! cancelled) reservation holds it. Every write here keeps that true:
//!
//! - creating a reservation claims its table, failing with `Conflict` when
//!   the table is already taken;
//! - moving a reservation to `Cancelada` releases the table, moving it back
//!   to an active status claims it again;
//! - deleting a reservation releases its table.
//!
//! A release never frees a table that another active reservation holds.
//!
//! Claims are conditional updates committed in the same transaction as the
//! reservation write, so two concurrent requests cannot both take a table.
//! A status change reads the current status inside that transaction too, so
//! the table effect never comes from a stale read.

use tracing::info;

use super::validation::{parse_date, validate_time};
use crate::error::{Error, Result};
use crate::store::{Store, TableEffect};
use crate::types::{NewReservation, ReservationStatus, ReservationView, Table};

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub customer_id: i64,
    pub table_id: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    pub time: String,
    /// Defaults to `Pendente`.
    pub status: Option<String>,
}

pub fn create_reservation(store: &dyn Store, request: ReservationRequest) -> Result<ReservationView> {
    let date = parse_date(&request.date)?;
    let time = validate_time(&request.time)?;
    let status = match request.status.as_deref() {
        Some(raw) => raw.parse::<ReservationStatus>()?,
        None => ReservationStatus::default(),
    };
    if !status.is_active() {
        return Err(Error::bad_request(
            "a reservation cannot be created as cancelled",
        ));
    }

    let customer = store
        .get_customer(request.customer_id)?
        .ok_or_else(|| Error::not_found("Customer not found"))?;
    let table = store
        .get_table(request.table_id)?
        .ok_or_else(|| Error::not_found("Table not found"))?;

    if !table.available {
        return Err(Error::conflict("Table is not available"));
    }

    let reservation = store.create_reservation_claiming_table(&NewReservation {
        customer_id: customer.id,
        table_id: table.id,
        date,
        time,
        status,
    })?;

    info!(
        reservation_id = reservation.id,
        table_id = table.id,
        %date,
        "reservation created, table claimed"
    );

    Ok(ReservationView::join(
        reservation,
        customer,
        Table {
            available: false,
            ..table
        },
    ))
}

pub fn list_reservations(store: &dyn Store) -> Result<Vec<ReservationView>> {
    store.list_reservation_views()
}

pub fn get_reservation(store: &dyn Store, id: i64) -> Result<ReservationView> {
    store
        .get_reservation_view(id)?
        .ok_or_else(|| Error::not_found("Reservation not found"))
}

/// Sets a reservation's status and keeps its table's flag in step.
///
/// Any transition is allowed. Cancelling releases the table, even when the
/// reservation was already cancelled.
pub fn update_status(store: &dyn Store, id: i64, status: &str) -> Result<ReservationView> {
    let status: ReservationStatus = status.parse()?;

    let (effect, table_id) = store.update_reservation_status(id, status)?;

    match effect {
        TableEffect::Release => info!(reservation_id = id, table_id, %status, "table released"),
        TableEffect::Claim => info!(reservation_id = id, table_id, %status, "table reclaimed"),
        TableEffect::Keep => info!(reservation_id = id, %status, "reservation status updated"),
    }

    get_reservation(store, id)
}

/// Removes a reservation, releasing its table regardless of status.
pub fn delete_reservation(store: &dyn Store, id: i64) -> Result<()> {
    if !store.delete_reservation_releasing_table(id)? {
        return Err(Error::not_found("Reservation not found"));
    }

    info!(reservation_id = id, "reservation deleted, table released");
    Ok(())
}
