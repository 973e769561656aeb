// Internal backend: catalog, availability and booking records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    api_client::ApiClient,
    availability::AvailabilityQuery,
    config::ClientConfig,
    error::{ApiError, ClientError},
    models::{
        ApiResponse, BookingId, BookingRecord, CustomerDetails, IdempotencyKey, Service,
        TeamMember, TimeSlot,
    },
    token::TokenStore,
};

/// Payload that records a provider booking in the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncBookingRequest {
    pub square_booking_id: String,
    pub idempotency_key: IdempotencyKey,
    pub service_variation_id: String,
    pub team_member_id: String,
    pub start_at: DateTime<Utc>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerDetails>,
}

#[derive(Debug, Serialize)]
struct CancelBookingPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[async_trait]
pub trait BookingBackend: Send + Sync + 'static {
    async fn team_members(&self) -> Result<ApiResponse<Vec<TeamMember>>, ApiError>;

    async fn services_for_team_member(
        &self,
        team_member_id: &str,
    ) -> Result<ApiResponse<Vec<Service>>, ApiError>;

    async fn search_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<ApiResponse<Vec<TimeSlot>>, ApiError>;

    async fn sync_booking(
        &self,
        request: &SyncBookingRequest,
    ) -> Result<ApiResponse<BookingRecord>, ApiError>;

    async fn cancel_booking(
        &self,
        booking_id: BookingId,
        reason: Option<&str>,
    ) -> Result<ApiResponse<BookingRecord>, ApiError>;
}

pub struct BackendClient {
    client: ApiClient,
}

impl BackendClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn from_config(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let client = ApiClient::new(config.backend_url.clone(), config.timeout_ms)?
            .with_token_store(tokens);
        Ok(Self::new(client))
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.client
    }
}

fn path_segment(value: &str) -> Result<&str, ApiError> {
    if value.is_empty() || value.contains(['/', '?', '#']) {
        return Err(ApiError::InvalidRequest(format!(
            "`{value}` is not a valid identifier"
        )));
    }
    Ok(value)
}

#[async_trait]
impl BookingBackend for BackendClient {
    async fn team_members(&self) -> Result<ApiResponse<Vec<TeamMember>>, ApiError> {
        self.client.get("/team-members").await
    }

    async fn services_for_team_member(
        &self,
        team_member_id: &str,
    ) -> Result<ApiResponse<Vec<Service>>, ApiError> {
        let id = path_segment(team_member_id)?;
        self.client
            .get(&format!("/services/team-member/{id}"))
            .await
    }

    async fn search_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<ApiResponse<Vec<TimeSlot>>, ApiError> {
        self.client
            .post("/services/availability/search", query)
            .await
    }

    async fn sync_booking(
        &self,
        request: &SyncBookingRequest,
    ) -> Result<ApiResponse<BookingRecord>, ApiError> {
        self.client.post("/bookings", request).await
    }

    async fn cancel_booking(
        &self,
        booking_id: BookingId,
        reason: Option<&str>,
    ) -> Result<ApiResponse<BookingRecord>, ApiError> {
        self.client
            .post(
                &format!("/bookings/{booking_id}/cancel"),
                &CancelBookingPayload { reason },
            )
            .await
    }
}
