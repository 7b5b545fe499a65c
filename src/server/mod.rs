mod customers;
mod dashboard;
pub mod dto;
mod reservations;
pub mod response;
mod router;
mod staff;
mod tables;

pub use router::{AppState, create_router};
