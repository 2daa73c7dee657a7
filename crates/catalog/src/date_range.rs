//! Inclusive calendar date intervals.

use core::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tempora_core::ValueObject;

use crate::error::{CatalogError, CatalogResult};

/// Inclusive `[start, end]`, or `[start, ∞)` when `end` is absent.
///
/// Invariant: `end`, when present, is never before `start`. Deserialization
/// goes through the same check as [`DateRange::new`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = CatalogError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> CatalogResult<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(CatalogError::InvalidDateRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// `[start, end]`.
    pub fn bounded(start: NaiveDate, end: NaiveDate) -> CatalogResult<Self> {
        Self::new(start, Some(end))
    }

    /// `[start, ∞)`.
    pub fn open(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.is_none_or(|end| date <= end)
    }

    /// Symmetric intersection test; an absent end counts as +∞.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        let self_reaches_other = other.end.is_none_or(|end| self.start <= end);
        let other_reaches_self = self.end.is_none_or(|end| other.start <= end);
        self_reaches_other && other_reaches_self
    }
}

impl ValueObject for DateRange {}

impl Ord for DateRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start).then_with(|| match (self.end, other.end) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    }
}

impl PartialOrd for DateRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {}]", self.start, end),
            None => write!(f, "[{}, ∞)", self.start),
        }
    }
}
