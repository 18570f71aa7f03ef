//! HTTP layer for the Ticketline services.
//!
//! One library, three binaries: `catalog-api`, `booking-api` and
//! `payment-api` each mount their own route tree over their own state, but
//! share the error mapping and the health endpoint.

pub mod error;
pub mod routes;
pub mod state;
