//! Sync watermark tracking for incremental order polling

use chrono::{DateTime, Duration, Utc};

/// Timestamp boundary of the last confirmed successful sync
///
/// Held in memory only. Starts one day in the past so the first poll
/// covers the previous 24 hours, and only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    last_sync_at: DateTime<Utc>,
}

impl Watermark {
    /// How many hours back the initial watermark reaches
    pub const INITIAL_LOOKBACK_HOURS: i64 = 24;

    /// Create a watermark positioned [`Self::INITIAL_LOOKBACK_HOURS`] before now
    pub fn new() -> Self {
        Self::at(Utc::now() - Duration::hours(Self::INITIAL_LOOKBACK_HOURS))
    }

    /// Create a watermark at a specific instant
    pub fn at(last_sync_at: DateTime<Utc>) -> Self {
        Self { last_sync_at }
    }

    /// When we last successfully synced
    pub fn last_sync_at(&self) -> DateTime<Utc> {
        self.last_sync_at
    }

    /// Move the watermark forward to `to`
    ///
    /// Never moves backwards: an older timestamp leaves the watermark
    /// unchanged. Returns whether the watermark moved.
    pub fn advance(&mut self, to: DateTime<Utc>) -> bool {
        if to > self.last_sync_at {
            self.last_sync_at = to;
            true
        } else {
            false
        }
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_watermark_is_one_day_back() {
        let before = Utc::now();
        let watermark = Watermark::new();
        let after = Utc::now();

        assert!(watermark.last_sync_at() >= before - Duration::hours(24));
        assert!(watermark.last_sync_at() <= after - Duration::hours(24));
    }

    #[test]
    fn test_advance_forward() {
        let start = Utc::now() - Duration::hours(1);
        let mut watermark = Watermark::at(start);

        let later = start + Duration::minutes(30);
        assert!(watermark.advance(later));
        assert_eq!(watermark.last_sync_at(), later);
    }

    #[test]
    fn test_advance_never_goes_backwards() {
        let start = Utc::now();
        let mut watermark = Watermark::at(start);

        assert!(!watermark.advance(start - Duration::minutes(1)));
        assert!(!watermark.advance(start));
        assert_eq!(watermark.last_sync_at(), start);
    }
}
