//! Ticketline Core — shared abstractions.
//!
//! This crate defines the error taxonomy, the wire error envelope, the clock
//! abstraction, and the retry policy that all three services depend on. It
//! contains no infrastructure code.

pub mod clock;
pub mod envelope;
pub mod error;
pub mod retry;
