//! Ticketline Catalog — the inventory authority.
//!
//! Owns event records and seat counts. Seats are mutated only through the
//! atomic reserve/release operations on [`store::EventStore`]; no other code
//! path writes `available_seats`.

pub mod model;
pub mod service;
pub mod store;
