// Booking client for the barbershop site: provider (Square) booking through the
// same-origin proxy, synced into the internal backend

pub mod api_client;
pub mod availability;
pub mod backend;
pub mod booking_service;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod token;

// Re-export key types for convenience
pub use api_client::{ApiClient, ClientStats};
pub use availability::{group_by_date, AvailabilityQuery, DateRange, SlotsByDate};
pub use backend::{BackendClient, BookingBackend, SyncBookingRequest};
pub use booking_service::{BookingOutcome, BookingService, BookingStats};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError};
pub use models::{
    ApiResponse, BookingId, BookingRecord, BookingRequest, CustomerDetails, IdempotencyKey,
    ProviderBooking, Service, TeamMember, TeamMemberStatus, TimeSlot,
};
pub use provider::{BookingProvider, SquareProxyProvider};
pub use token::{MemoryTokenStore, TokenStore};
