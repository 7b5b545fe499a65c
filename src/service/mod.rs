//! Business rules for the reservation backend.
//!
//! Every function here works against a [`Store`](crate::store::Store) and
//! returns domain errors; translating them to HTTP is the server's job.

pub mod customers;
pub mod dashboard;
pub mod reservations;
pub mod staff;
pub mod tables;
pub mod validation;
