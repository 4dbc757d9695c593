use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VacationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Inclusive date range, `start <= end` holds for every value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Both bounds count: ranges sharing a single day overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        other.start <= self.end && other.end >= self.start
    }
}

/// A vacation request joined with the owner data the workflow needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacationRecord {
    pub id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub owner_manager_id: Option<u64>,
    pub range: DateRange,
    pub status: VacationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn range(a: u32, b: u32) -> DateRange {
        DateRange::new(day(a), day(b)).unwrap()
    }

    #[test]
    fn rejects_reversed_bounds() {
        assert!(DateRange::new(day(5), day(1)).is_none());
        assert!(DateRange::new(day(3), day(3)).is_some());
    }

    #[test]
    fn shared_boundary_day_overlaps() {
        assert!(range(1, 5).overlaps(&range(5, 9)));
        assert!(range(5, 9).overlaps(&range(1, 5)));
    }

    #[test]
    fn containment_overlaps_both_ways() {
        assert!(range(1, 10).overlaps(&range(3, 4)));
        assert!(range(3, 4).overlaps(&range(1, 10)));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        assert!(!range(1, 5).overlaps(&range(6, 9)));
        assert!(!range(6, 9).overlaps(&range(1, 5)));
    }

    #[test]
    fn status_round_trips_through_column_text() {
        assert_eq!(VacationStatus::Approved.as_ref(), "APPROVED");
        assert_eq!("REJECTED".parse::<VacationStatus>().ok(), Some(VacationStatus::Rejected));
    }
}
