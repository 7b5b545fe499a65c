use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::ReservationStatus;

/// Length of the reservation trend, ending today.
pub const TREND_DAYS: usize = 7;

/// Counts shown on the dashboard. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    #[serde(rename = "reservasHoje")]
    pub reservations_today: i64,
    #[serde(rename = "mesasOcupadas")]
    pub occupied_tables: i64,
    #[serde(rename = "totalMesas")]
    pub total_tables: i64,
    /// Every staff row counts as active.
    #[serde(rename = "funcionariosAtivos")]
    pub active_staff: i64,
    #[serde(rename = "totalFuncionarios")]
    pub total_staff: i64,
    #[serde(rename = "totalReservasGeral")]
    pub total_reservations: i64,
    #[serde(rename = "reservasPendentes")]
    pub pending_reservations: i64,
    #[serde(rename = "reservasConfirmadas")]
    pub confirmed_reservations: i64,
    #[serde(rename = "reservasCanceladas")]
    pub cancelled_reservations: i64,
    /// Reservations per day, oldest first, last entry is today.
    #[serde(rename = "reservas7Dias")]
    pub trend_counts: Vec<i64>,
    #[serde(rename = "labels7Dias")]
    pub trend_labels: Vec<&'static str>,
}

pub fn dashboard_stats(store: &dyn Store, today: NaiveDate) -> Result<DashboardStats> {
    let staff = store.count_staff()?;
    let (trend_labels, trend_counts) = reservation_trend(store, today)?.into_iter().unzip();

    Ok(DashboardStats {
        reservations_today: store.count_reservations_on(today)?,
        occupied_tables: store.count_occupied_tables()?,
        total_tables: store.count_tables()?,
        active_staff: staff,
        total_staff: staff,
        total_reservations: store.count_reservations()?,
        pending_reservations: store.count_reservations_by_status(ReservationStatus::Pending)?,
        confirmed_reservations: store.count_reservations_by_status(ReservationStatus::Confirmed)?,
        cancelled_reservations: store.count_reservations_by_status(ReservationStatus::Cancelled)?,
        trend_counts,
        trend_labels,
    })
}

/// (weekday label, count) for each of the `TREND_DAYS` days ending on `today`.
fn reservation_trend(store: &dyn Store, today: NaiveDate) -> Result<Vec<(&'static str, i64)>> {
    let first = today
        .checked_sub_days(Days::new(TREND_DAYS as u64 - 1))
        .ok_or_else(|| Error::bad_request(format!("date {today} is out of range")))?;

    let counts = store.count_reservations_by_date(first, today)?;

    Ok(first
        .iter_days()
        .take(TREND_DAYS)
        .map(|day| {
            let count = counts
                .iter()
                .find(|(date, _)| *date == day)
                .map_or(0, |(_, count)| *count);
            (weekday_label(day.weekday()), count)
        })
        .collect())
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Segunda",
        Weekday::Tue => "Terça",
        Weekday::Wed => "Quarta",
        Weekday::Thu => "Quinta",
        Weekday::Fri => "Sexta",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}
