//! Ticketline Booking — the booking coordinator.
//!
//! Owns booking records and drives the reservation saga: seats are reserved
//! at the catalog before a booking row exists, and every forward step has a
//! compensation. The catalog is reached only through the outbound
//! [`client::CatalogClient`] port.

pub mod client;
pub mod model;
pub mod repository;
pub mod service;
