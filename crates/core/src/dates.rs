//! Canned date-range computation for the search date filter.
//!
//! Canned ranges ("last week", "older", ...) never persist literal
//! dates: their bounds are recomputed from the current date every time
//! they are evaluated, so a bookmarked URL always filters relative to
//! "now" rather than the moment the filter was chosen. Only the
//! `custom` kind carries explicit `since`/`until` values.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────

/// Days covered by the "last week" range.
pub const LAST_WEEK_DAYS: i64 = 7;

/// Days covered by the "last month" range.
pub const LAST_MONTH_DAYS: i64 = 31;

/// Days covered by the "last 90 days" range; also the cutoff for "older".
pub const LAST_90_DAYS: i64 = 90;

// ── Types ────────────────────────────────────────────────────────────

/// The kind of date filter applied to search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilterKind {
    /// No date restriction.
    #[default]
    All,
    LastWeek,
    LastMonth,
    Last90Days,
    /// Older than 90 days.
    Older,
    /// Explicit user-supplied `since`/`until` bounds.
    Custom,
}

impl DateFilterKind {
    /// Wire value used in the `typeDate` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::LastWeek => "last-week",
            Self::LastMonth => "last-month",
            Self::Last90Days => "last-90-days",
            Self::Older => "older",
            Self::Custom => "custom",
        }
    }

    /// Parse a `typeDate` wire value. Unrecognized strings yield `None`;
    /// the caller substitutes the default rather than erroring.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "last-week" => Some(Self::LastWeek),
            "last-month" => Some(Self::LastMonth),
            "last-90-days" => Some(Self::Last90Days),
            "older" => Some(Self::Older),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Compute the `(since, until)` bounds for this kind relative to
    /// `today`. Bounds are date-only, never time-of-day.
    ///
    /// `All` and `Custom` both return `(None, None)`: `All` has no
    /// bounds at all, and `Custom` bounds live on the filter itself,
    /// not on the kind.
    pub fn range(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            Self::All | Self::Custom => (None, None),
            Self::LastWeek => (Some(today - Duration::days(LAST_WEEK_DAYS)), Some(today)),
            Self::LastMonth => (Some(today - Duration::days(LAST_MONTH_DAYS)), Some(today)),
            Self::Last90Days => (Some(today - Duration::days(LAST_90_DAYS)), Some(today)),
            Self::Older => (None, Some(today - Duration::days(LAST_90_DAYS))),
        }
    }
}

impl std::fmt::Display for DateFilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The date filter attached to a search: a kind plus explicit bounds
/// for the `Custom` kind only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub kind: DateFilterKind,
    /// Populated only when `kind == Custom`.
    pub since: Option<NaiveDate>,
    /// Populated only when `kind == Custom`.
    pub until: Option<NaiveDate>,
}

impl DateFilter {
    /// A custom filter with explicit bounds.
    pub fn custom(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        Self {
            kind: DateFilterKind::Custom,
            since,
            until,
        }
    }

    /// Effective `(since, until)` bounds relative to `today`.
    ///
    /// Canned kinds recompute from `today`; `Custom` returns the stored
    /// bounds verbatim.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self.kind {
            DateFilterKind::Custom => (self.since, self.until),
            kind => kind.range(today),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
