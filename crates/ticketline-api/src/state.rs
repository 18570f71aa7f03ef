//! Per-service application state.

use std::sync::Arc;

use ticketline_booking::service::BookingService;
use ticketline_catalog::service::CatalogService;
use ticketline_payment::service::PaymentService;

/// State for the event catalog server.
#[derive(Clone)]
pub struct CatalogState {
    /// The catalog application service.
    pub service: Arc<CatalogService>,
}

impl CatalogState {
    /// Creates the state.
    #[must_use]
    pub fn new(service: Arc<CatalogService>) -> Self {
        Self { service }
    }
}

/// State for the booking coordinator server.
#[derive(Clone)]
pub struct BookingState {
    /// The booking application service.
    pub service: Arc<BookingService>,
}

impl BookingState {
    /// Creates the state.
    #[must_use]
    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }
}

/// State for the payment processor server.
#[derive(Clone)]
pub struct PaymentState {
    /// The payment application service.
    pub service: Arc<PaymentService>,
}

impl PaymentState {
    /// Creates the state.
    #[must_use]
    pub fn new(service: Arc<PaymentService>) -> Self {
        Self { service }
    }
}
