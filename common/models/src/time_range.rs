use std::cmp;
use std::fmt::Display;

use crate::Timestamp;

/// A time interval with per-end inclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
    pub include_start: bool,
    pub include_end: bool,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp, include_start: bool, include_end: bool) -> Self {
        Self {
            start,
            end,
            include_start,
            include_end,
        }
    }

    /// `[start, end]`.
    pub fn new_inclusive(start: Timestamp, end: Timestamp) -> Self {
        Self::new(start, end, true, true)
    }

    /// `[start, end)`, the shape of segment and block windows.
    pub fn new_section(start: Timestamp, end: Timestamp) -> Self {
        Self::new(start, end, true, false)
    }

    pub fn all() -> Self {
        Self::new_inclusive(Timestamp::MIN, Timestamp::MAX)
    }

    #[inline(always)]
    pub fn contains(&self, ts: Timestamp) -> bool {
        let after_start = if self.include_start {
            ts >= self.start
        } else {
            ts > self.start
        };
        let before_end = if self.include_end {
            ts <= self.end
        } else {
            ts < self.end
        };
        after_start && before_end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        if self.end < other.start || other.end < self.start {
            return false;
        }
        if self.end == other.start && !(self.include_end && other.include_start) {
            return false;
        }
        if other.end == self.start && !(other.include_end && self.include_start) {
            return false;
        }
        true
    }

    /// The common sub-range of two ranges, or `None` when they do not meet.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        if !self.overlaps(other) {
            return None;
        }
        let (start, include_start) = match self.start.cmp(&other.start) {
            cmp::Ordering::Greater => (self.start, self.include_start),
            cmp::Ordering::Less => (other.start, other.include_start),
            cmp::Ordering::Equal => (self.start, self.include_start && other.include_start),
        };
        let (end, include_end) = match self.end.cmp(&other.end) {
            cmp::Ordering::Less => (self.end, self.include_end),
            cmp::Ordering::Greater => (other.end, other.include_end),
            cmp::Ordering::Equal => (self.end, self.include_end && other.include_end),
        };
        Some(TimeRange::new(start, end, include_start, include_end))
    }

    pub fn merge(&mut self, other: &TimeRange) {
        if other.start < self.start {
            self.start = other.start;
            self.include_start = other.include_start;
        } else if other.start == self.start {
            self.include_start = self.include_start || other.include_start;
        }
        if other.end > self.end {
            self.end = other.end;
            self.include_end = other.include_end;
        } else if other.end == self.end {
            self.include_end = self.include_end || other.include_end;
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = if self.include_start { '[' } else { '(' };
        let close = if self.include_end { ']' } else { ')' };
        write!(f, "{}{}, {}{}", open, self.start, self.end, close)
    }
}
