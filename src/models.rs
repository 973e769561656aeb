// Booking domain types and the backend's response envelope

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookingId = i64;

/// Client-generated token that lives for a single booking attempt. Both the
/// provider call and the backend sync carry the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdempotencyKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for IdempotencyKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamMemberStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub given_name: String,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TeamMemberStatus,
}

impl TeamMember {
    pub fn is_bookable(&self) -> bool {
        self.status == TeamMemberStatus::Active
    }

    pub fn display_name(&self) -> String {
        match &self.family_name {
            Some(family) if !family.is_empty() => format!("{} {}", self.given_name, family),
            _ => self.given_name.clone(),
        }
    }
}

/// Amount in minor units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    pub duration_minutes: u32,
    pub team_member_id: String,
    pub square_variation_id: String,
    #[serde(default)]
    pub square_variation_version: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentSegment {
    pub service_variation_id: String,
    pub team_member_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_variation_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub appointment_segments: Vec<AppointmentSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub given_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub service_variation_id: String,
    pub service_variation_version: Option<i64>,
    pub team_member_id: String,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub customer_note: Option<String>,
    pub customer: Option<CustomerDetails>,
    /// Generated by the orchestrator when absent.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl BookingRequest {
    pub fn new(
        service_variation_id: impl Into<String>,
        team_member_id: impl Into<String>,
        start_at: DateTime<Utc>,
    ) -> Self {
        Self {
            service_variation_id: service_variation_id.into(),
            service_variation_version: None,
            team_member_id: team_member_id.into(),
            start_at,
            duration_minutes: None,
            customer_note: None,
            customer: None,
            idempotency_key: None,
        }
    }

    pub fn for_service(service: &Service, start_at: DateTime<Utc>) -> Self {
        Self {
            service_variation_version: service.square_variation_version,
            duration_minutes: Some(service.duration_minutes),
            ..Self::new(
                service.square_variation_id.clone(),
                service.team_member_id.clone(),
                start_at,
            )
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.customer_note = Some(note.into());
        self
    }

    pub fn with_customer(mut self, customer: CustomerDetails) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<IdempotencyKey>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn segment(&self) -> AppointmentSegment {
        AppointmentSegment {
            service_variation_id: self.service_variation_id.clone(),
            team_member_id: self.team_member_id.clone(),
            service_variation_version: self.service_variation_version,
            duration_minutes: self.duration_minutes,
        }
    }
}

/// A booking as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderBooking {
    pub id: String,
    #[serde(default)]
    pub version: Option<i64>,
    pub status: String,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub appointment_segments: Vec<AppointmentSegment>,
}

impl ProviderBooking {
    /// Total length, only when every segment reports a non-zero duration.
    pub fn reported_duration(&self) -> Option<Duration> {
        if self.appointment_segments.is_empty() {
            return None;
        }
        self.appointment_segments
            .iter()
            .try_fold(0i64, |total, s| {
                let minutes = s.duration_minutes.filter(|m| *m > 0)?;
                total.checked_add(i64::from(minutes))
            })
            .map(Duration::minutes)
    }
}

/// A booking row in the internal backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub square_booking_id: String,
    pub team_member_id: String,
    pub service_variation_id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub customer_note: Option<String>,
}
