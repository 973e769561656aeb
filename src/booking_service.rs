// Booking orchestration: create the booking with the provider, then record it
// in the backend. A provider booking that fails to sync is still returned to
// the caller, tagged as `ProviderOnly`.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{Duration, NaiveDate};
use tracing::{error, info, warn};

use crate::{
    availability::{group_by_date, AvailabilityQuery, DateRange, SlotsByDate},
    backend::{BackendClient, BookingBackend, SyncBookingRequest},
    config::ClientConfig,
    error::{ApiError, ClientError},
    models::{
        ApiResponse, BookingId, BookingRecord, BookingRequest, IdempotencyKey, ProviderBooking,
        Service, TeamMember,
    },
    provider::{BookingProvider, SquareProxyProvider},
    token::TokenStore,
};

/// Id carried by synthetic records; the backend never issues it.
pub const SYNTHETIC_BOOKING_ID: BookingId = 0;

/// Length assumed for a synthetic record when the provider does not report
/// segment durations.
pub const FALLBACK_DURATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// Created with the provider and recorded by the backend.
    Synced {
        provider: ProviderBooking,
        response: ApiResponse<BookingRecord>,
        idempotency_key: IdempotencyKey,
    },
    /// Created with the provider only. `response` is synthetic.
    ProviderOnly {
        provider: ProviderBooking,
        response: ApiResponse<BookingRecord>,
        sync_error: ApiError,
        idempotency_key: IdempotencyKey,
    },
}

impl BookingOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, BookingOutcome::Synced { .. })
    }

    pub fn response(&self) -> &ApiResponse<BookingRecord> {
        match self {
            BookingOutcome::Synced { response, .. }
            | BookingOutcome::ProviderOnly { response, .. } => response,
        }
    }

    pub fn into_response(self) -> ApiResponse<BookingRecord> {
        match self {
            BookingOutcome::Synced { response, .. }
            | BookingOutcome::ProviderOnly { response, .. } => response,
        }
    }

    pub fn provider_booking(&self) -> &ProviderBooking {
        match self {
            BookingOutcome::Synced { provider, .. }
            | BookingOutcome::ProviderOnly { provider, .. } => provider,
        }
    }

    pub fn sync_error(&self) -> Option<&ApiError> {
        match self {
            BookingOutcome::Synced { .. } => None,
            BookingOutcome::ProviderOnly { sync_error, .. } => Some(sync_error),
        }
    }

    /// Reuse this key to retry the whole attempt without duplicating records.
    pub fn idempotency_key(&self) -> &IdempotencyKey {
        match self {
            BookingOutcome::Synced {
                idempotency_key, ..
            }
            | BookingOutcome::ProviderOnly {
                idempotency_key, ..
            } => idempotency_key,
        }
    }
}

#[derive(Debug, Default)]
struct BookingCounters {
    attempted: AtomicUsize,
    synced: AtomicUsize,
    provider_only: AtomicUsize,
    provider_failures: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingStats {
    pub bookings_attempted: usize,
    pub bookings_synced: usize,
    pub bookings_provider_only: usize,
    pub provider_failures: usize,
}

pub struct BookingService<P, B> {
    provider: P,
    backend: B,
    counters: Arc<BookingCounters>,
}

impl BookingService<SquareProxyProvider, BackendClient> {
    pub fn from_config(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self::new(
            SquareProxyProvider::from_config(config)?,
            BackendClient::from_config(config, tokens)?,
        ))
    }
}

impl<P: BookingProvider, B: BookingBackend> BookingService<P, B> {
    pub fn new(provider: P, backend: B) -> Self {
        Self {
            provider,
            backend,
            counters: Arc::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> BookingStats {
        BookingStats {
            bookings_attempted: self.counters.attempted.load(Ordering::SeqCst),
            bookings_synced: self.counters.synced.load(Ordering::SeqCst),
            bookings_provider_only: self.counters.provider_only.load(Ordering::SeqCst),
            provider_failures: self.counters.provider_failures.load(Ordering::SeqCst),
        }
    }

    /// Provider errors are returned as-is and the backend is not called.
    /// Backend errors after a provider success yield `ProviderOnly`.
    pub async fn create_booking(
        &self,
        request: BookingRequest,
    ) -> Result<BookingOutcome, ApiError> {
        let idempotency_key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(IdempotencyKey::generate);
        self.counters.attempted.fetch_add(1, Ordering::SeqCst);

        let provider = match self.provider.create_booking(&request, &idempotency_key).await {
            Ok(booking) => booking,
            Err(err) => {
                self.counters.provider_failures.fetch_add(1, Ordering::SeqCst);
                error!(%idempotency_key, error = %err, "provider booking failed");
                return Err(err);
            }
        };
        info!(
            %idempotency_key,
            provider_booking_id = %provider.id,
            status = %provider.status,
            "provider booking created"
        );

        let sync = sync_request(&provider, &request, &idempotency_key);
        match self.backend.sync_booking(&sync).await {
            Ok(response) => {
                self.counters.synced.fetch_add(1, Ordering::SeqCst);
                info!(
                    %idempotency_key,
                    booking_id = response.data.id,
                    "booking synced to backend"
                );
                Ok(BookingOutcome::Synced {
                    provider,
                    response,
                    idempotency_key,
                })
            }
            Err(sync_error) => {
                self.counters.provider_only.fetch_add(1, Ordering::SeqCst);
                warn!(
                    %idempotency_key,
                    provider_booking_id = %provider.id,
                    error = %sync_error,
                    "backend sync failed, returning provider-only booking"
                );
                let response = synthetic_response(&provider, &request);
                Ok(BookingOutcome::ProviderOnly {
                    provider,
                    response,
                    sync_error,
                    idempotency_key,
                })
            }
        }
    }

    pub async fn team_members(&self) -> Result<Vec<TeamMember>, ApiError> {
        Ok(self.backend.team_members().await?.data)
    }

    pub async fn bookable_team_members(&self) -> Result<Vec<TeamMember>, ApiError> {
        let mut members = self.team_members().await?;
        members.retain(TeamMember::is_bookable);
        Ok(members)
    }

    pub async fn services_for_team_member(
        &self,
        team_member_id: &str,
    ) -> Result<Vec<Service>, ApiError> {
        Ok(self
            .backend
            .services_for_team_member(team_member_id)
            .await?
            .data)
    }

    /// Free slots for each day in `start..=end`. A start after the end is
    /// rejected before any request is made.
    pub async fn search_availability(
        &self,
        service_variation_id: &str,
        team_member_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SlotsByDate, ApiError> {
        let range = DateRange::new(start, end)?;
        let query = AvailabilityQuery::new(
            service_variation_id,
            team_member_id.map(str::to_string),
            &range,
        )?;

        let response = self.backend.search_availability(&query).await?;
        Ok(group_by_date(response.data, &range))
    }

    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        reason: Option<&str>,
    ) -> Result<BookingRecord, ApiError> {
        if booking_id <= SYNTHETIC_BOOKING_ID {
            return Err(ApiError::InvalidRequest(format!(
                "booking {booking_id} has no backend record"
            )));
        }
        let response = self.backend.cancel_booking(booking_id, reason).await?;
        info!(booking_id, status = %response.data.status, "booking cancelled");
        Ok(response.data)
    }
}

fn sync_request(
    provider: &ProviderBooking,
    request: &BookingRequest,
    idempotency_key: &IdempotencyKey,
) -> SyncBookingRequest {
    SyncBookingRequest {
        square_booking_id: provider.id.clone(),
        idempotency_key: idempotency_key.clone(),
        service_variation_id: request.service_variation_id.clone(),
        team_member_id: request.team_member_id.clone(),
        start_at: provider.start_at,
        status: provider.status.clone(),
        customer_note: request
            .customer_note
            .clone()
            .or_else(|| provider.customer_note.clone()),
        customer: request.customer.clone(),
    }
}

fn appointment_length(provider: &ProviderBooking) -> Duration {
    provider
        .reported_duration()
        .unwrap_or_else(|| Duration::minutes(FALLBACK_DURATION_MINUTES))
}

fn synthetic_response(
    provider: &ProviderBooking,
    request: &BookingRequest,
) -> ApiResponse<BookingRecord> {
    ApiResponse {
        status_code: 200,
        message: Some("Booking confirmed with provider; backend sync pending".to_string()),
        data: BookingRecord {
            id: SYNTHETIC_BOOKING_ID,
            square_booking_id: provider.id.clone(),
            team_member_id: request.team_member_id.clone(),
            service_variation_id: request.service_variation_id.clone(),
            start_at: provider.start_at,
            end_at: provider.start_at + appointment_length(provider),
            status: provider.status.clone(),
            customer_note: request
                .customer_note
                .clone()
                .or_else(|| provider.customer_note.clone()),
        },
    }
}
