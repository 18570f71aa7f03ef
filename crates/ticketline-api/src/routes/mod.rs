//! Route modules for the three Ticketline servers.

pub mod bookings;
pub mod events;
pub mod health;
pub mod payments;
