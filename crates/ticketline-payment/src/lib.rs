//! Ticketline Payment — the payment processor.
//!
//! Owns payment records. Payment commitment and booking confirmation cannot
//! be made atomic across processes, so the confirm leg runs under a bounded
//! retry and falls back to a durable reconciliation record when the retries
//! exhaust. The booking service is reached only through the outbound
//! [`client::BookingClient`] port.

pub mod client;
pub mod model;
pub mod reconciliation;
pub mod repository;
pub mod service;
