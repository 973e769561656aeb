// Provider (Square) booking creation through the same-origin proxy

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api_client::ApiClient,
    config::ClientConfig,
    error::{ApiError, ClientError},
    models::{AppointmentSegment, BookingRequest, CustomerDetails, IdempotencyKey, ProviderBooking},
};

pub const CREATE_BOOKING_PATH: &str = "/api/create-square-booking";

#[async_trait]
pub trait BookingProvider: Send + Sync + 'static {
    async fn create_booking(
        &self,
        request: &BookingRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<ProviderBooking, ApiError>;
}

#[derive(Debug, Serialize)]
struct CreateBookingPayload<'a> {
    idempotency_key: &'a str,
    booking: BookingDraft<'a>,
}

#[derive(Debug, Serialize)]
struct BookingDraft<'a> {
    location_id: &'a str,
    start_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_note: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<&'a CustomerDetails>,
    appointment_segments: Vec<AppointmentSegment>,
}

#[derive(Debug, Deserialize)]
struct CreateBookingResponse {
    #[serde(default)]
    booking: Option<ProviderBooking>,
    #[serde(default)]
    errors: Vec<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

pub struct SquareProxyProvider {
    client: ApiClient,
    location_id: String,
}

impl SquareProxyProvider {
    pub fn new(client: ApiClient, location_id: impl Into<String>) -> Self {
        Self {
            client,
            location_id: location_id.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = ApiClient::new(config.site_url.clone(), config.timeout_ms)?;
        Ok(Self::new(client, config.square_location_id.clone()))
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl BookingProvider for SquareProxyProvider {
    async fn create_booking(
        &self,
        request: &BookingRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<ProviderBooking, ApiError> {
        let payload = CreateBookingPayload {
            idempotency_key: idempotency_key.as_str(),
            booking: BookingDraft {
                location_id: &self.location_id,
                start_at: request.start_at,
                customer_note: request.customer_note.as_deref(),
                customer: request.customer.as_ref(),
                appointment_segments: vec![request.segment()],
            },
        };

        let response: CreateBookingResponse =
            self.client.post(CREATE_BOOKING_PATH, &payload).await?;

        // The proxy relays Square's body, which may carry errors with a 2xx.
        match response.booking {
            Some(booking) => Ok(booking),
            None => {
                let message = response
                    .errors
                    .into_iter()
                    .find_map(|e| e.detail.or(e.code))
                    .unwrap_or_else(|| "provider response did not include a booking".to_string());
                Err(ApiError::ApiResponseError {
                    status_code: 502,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn request() -> BookingRequest {
        BookingRequest::new(
            "VAR1",
            "TM1",
            Utc.with_ymd_and_hms(2026, 11, 2, 15, 0, 0).unwrap(),
        )
        .with_note("first visit")
    }

    fn provider(server: &MockServer) -> SquareProxyProvider {
        SquareProxyProvider::new(ApiClient::new(server.uri(), None).unwrap(), "LOC1")
    }

    #[tokio::test]
    async fn test_sends_key_location_and_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_BOOKING_PATH))
            .and(body_partial_json(json!({
                "idempotency_key": "key-1",
                "booking": {
                    "location_id": "LOC1",
                    "start_at": "2026-11-02T15:00:00Z",
                    "customer_note": "first visit",
                    "appointment_segments": [
                        {"service_variation_id": "VAR1", "team_member_id": "TM1"}
                    ]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "booking": {
                    "id": "sq_abc",
                    "version": 0,
                    "status": "ACCEPTED",
                    "start_at": "2026-11-02T15:00:00Z",
                    "location_id": "LOC1",
                    "appointment_segments": [
                        {"service_variation_id": "VAR1", "team_member_id": "TM1", "duration_minutes": 30}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let booking = provider(&server)
            .create_booking(&request(), &IdempotencyKey::from("key-1"))
            .await
            .unwrap();

        assert_eq!(booking.id, "sq_abc");
        assert_eq!(booking.status, "ACCEPTED");
        assert_eq!(booking.appointment_segments[0].duration_minutes, Some(30));
    }

    #[tokio::test]
    async fn test_non_success_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"code": "INVALID_VALUE", "detail": "start_at must be in the future"}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .create_booking(&request(), &IdempotencyKey::generate())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.message(), "start_at must be in the future");
    }

    #[tokio::test]
    async fn test_success_without_booking_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"code": "BOOKING_CONFLICT"}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .create_booking(&request(), &IdempotencyKey::generate())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::ApiResponseError {
                status_code: 502,
                message: "BOOKING_CONFLICT".to_string(),
            }
        );
    }
}
