//! Shared test mocks and utilities for the Ticketline services.

mod booking_client;
mod catalog_client;
mod clock;

pub use booking_client::{StubBookingClient, UnavailableBookingClient};
pub use catalog_client::{StubCatalogClient, UnavailableCatalogClient};
pub use clock::FixedClock;
