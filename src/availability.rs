// Availability search: date range validation and per-date grouping of slots

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::{error::ApiError, models::TimeSlot};

// Square's availability search does not accept windows longer than this.
pub const MAX_RANGE_DAYS: i64 = 32;

pub type SlotsByDate = BTreeMap<NaiveDate, Vec<TimeSlot>>;

/// Inclusive range of calendar days, interpreted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ApiError> {
        if start > end {
            return Err(ApiError::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let range = Self { start, end };
        if range.days() > MAX_RANGE_DAYS {
            return Err(ApiError::InvalidRequest(format!(
                "date range of {} days exceeds the maximum of {MAX_RANGE_DAYS}",
                range.days()
            )));
        }
        Ok(range)
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Midnight after the last day (exclusive bound).
    pub fn end_at(&self) -> Result<DateTime<Utc>, ApiError> {
        self.end
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| ApiError::InvalidRequest(format!("end date {} is out of range", self.end)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityQuery {
    pub service_variation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_member_id: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl AvailabilityQuery {
    pub fn new(
        service_variation_id: impl Into<String>,
        team_member_id: Option<String>,
        range: &DateRange,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            service_variation_id: service_variation_id.into(),
            team_member_id,
            start_at: range.start_at(),
            end_at: range.end_at()?,
        })
    }
}

/// Every day of the range gets an entry, empty when nothing is free. Slots
/// outside the range are dropped and each day is ordered by start time.
pub fn group_by_date(slots: Vec<TimeSlot>, range: &DateRange) -> SlotsByDate {
    let mut by_date: SlotsByDate = range
        .start
        .iter_days()
        .take(range.days() as usize)
        .map(|day| (day, Vec::new()))
        .collect();

    for slot in slots {
        let day = slot.start_at.date_naive();
        if let Some(day_slots) = by_date.get_mut(&day) {
            day_slots.push(slot);
        }
    }

    for day_slots in by_date.values_mut() {
        day_slots.sort_by_key(|slot| slot.start_at);
    }

    by_date
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    fn slot(d: u32, h: u32, m: u32) -> TimeSlot {
        TimeSlot {
            start_at: Utc.with_ymd_and_hms(2026, 11, d, h, m, 0).unwrap(),
            location_id: Some("LOC1".to_string()),
            appointment_segments: vec![],
        }
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let err = DateRange::new(day(5), day(4)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_range_bounds() {
        let range = DateRange::new(day(2), day(4)).unwrap();
        assert_eq!(range.days(), 3);
        assert_eq!(
            range.start_at(),
            Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(
            range.end_at().unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 5, 0, 0, 0).unwrap()
        );
        assert!(range.contains(day(4)));
        assert!(!range.contains(day(5)));

        assert_eq!(DateRange::single(day(9)).days(), 1);
    }

    #[test]
    fn test_range_too_long() {
        let start = day(1);
        let end = start + Days::new(MAX_RANGE_DAYS as u64);
        assert!(DateRange::new(start, end).is_err());
        assert!(DateRange::new(start, end - Days::new(1)).is_ok());
    }

    #[test]
    fn test_group_by_date() {
        let range = DateRange::new(day(2), day(4)).unwrap();
        let slots = vec![
            slot(3, 16, 0),
            slot(2, 10, 30),
            slot(3, 9, 0),
            slot(7, 9, 0), // outside range
        ];

        let grouped = group_by_date(slots, &range);

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![day(2), day(3), day(4)]);
        assert_eq!(grouped[&day(2)].len(), 1);
        assert_eq!(
            grouped[&day(3)].iter().map(|s| s.start_at).collect::<Vec<_>>(),
            vec![slot(3, 9, 0).start_at, slot(3, 16, 0).start_at]
        );
        assert!(grouped[&day(4)].is_empty());
    }

    #[test]
    fn test_query_uses_range_bounds() {
        let range = DateRange::single(day(2));
        let query = AvailabilityQuery::new("VAR1", Some("TM1".to_string()), &range).unwrap();
        let json = serde_json::to_value(&query).unwrap();

        assert_eq!(json["service_variation_id"], "VAR1");
        assert_eq!(json["team_member_id"], "TM1");
        assert_eq!(json["start_at"], "2026-11-02T00:00:00Z");
        assert_eq!(json["end_at"], "2026-11-03T00:00:00Z");

        let without_member = AvailabilityQuery::new("VAR1", None, &range).unwrap();
        let json = serde_json::to_value(&without_member).unwrap();
        assert!(json.get("team_member_id").is_none());
    }
}
