/*
 *  forecast_cache.rs
 *
 *  PiWeatherRock - weather at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Refresh bookkeeping for the forecast - when was it last fetched,
 *	and when is the next fetch due
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use log::debug;

/// Fixed delay before retrying a failed fetch, in seconds
pub const DEFAULT_RETRY_BACKOFF_SECS: u64 = 300;

/// Tracks forecast freshness in unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCache {
    last_refresh: Option<i64>,
    refresh_interval: i64,
    retry_at: Option<i64>,
}

impl ForecastCache {
    pub fn new(refresh_interval_secs: u64) -> Self {
        Self {
            last_refresh: None,
            refresh_interval: i64::try_from(refresh_interval_secs).unwrap_or(i64::MAX),
            retry_at: None,
        }
    }

    /// True when never fetched, when a postponed retry is due,
    /// or when the data is older than the refresh interval.
    pub fn is_stale(&self, now: i64) -> bool {
        let Some(last) = self.last_refresh else {
            return true;
        };
        if let Some(retry_at) = self.retry_at {
            return now > retry_at;
        }
        now.saturating_sub(last) > self.refresh_interval
    }

    /// Record a confirmed-successful fetch
    pub fn mark_refreshed(&mut self, now: i64) {
        self.last_refresh = Some(now);
        self.retry_at = None;
    }

    /// Postpone the next attempt by `backoff_secs` beyond `now`.
    /// Before the first successful fetch there is nothing to back off from,
    /// every tick keeps retrying.
    pub fn mark_failed_retry_later(&mut self, now: i64, backoff_secs: u64) {
        if self.last_refresh.is_none() {
            debug!("No forecast yet, retrying on the next tick");
            return;
        }
        let backoff = i64::try_from(backoff_secs).unwrap_or(i64::MAX);
        self.retry_at = Some(now.saturating_add(backoff));
    }

    /// Unix time of the last successful fetch, 0 when never fetched
    pub fn last_refresh_unix(&self) -> i64 {
        self.last_refresh.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_cache_is_stale() {
        let cache = ForecastCache::new(600);
        assert!(cache.is_stale(0));
        assert!(cache.is_stale(1_700_000_000));
        assert_eq!(cache.last_refresh_unix(), 0);
    }

    #[test]
    fn test_fresh_for_whole_interval_after_refresh() {
        let mut cache = ForecastCache::new(600);
        let t = 1_700_000_000;
        cache.mark_refreshed(t);
        for offset in [0, 1, 300, 599, 600] {
            assert!(!cache.is_stale(t + offset), "stale at +{}", offset);
        }
        assert!(cache.is_stale(t + 601));
        assert_eq!(cache.last_refresh_unix(), t);
    }

    #[test]
    fn test_failed_fetch_postpones_retry() {
        let mut cache = ForecastCache::new(300);
        let t = 1_700_000_000;
        cache.mark_refreshed(t - 1000);
        assert!(cache.is_stale(t));

        cache.mark_failed_retry_later(t, DEFAULT_RETRY_BACKOFF_SECS);
        assert!(!cache.is_stale(t + 299));
        assert!(!cache.is_stale(t + 300));
        assert!(cache.is_stale(t + 301));
        // the failure leaves the last good refresh alone
        assert_eq!(cache.last_refresh_unix(), t - 1000);
    }

    #[test]
    fn test_no_backoff_before_first_success() {
        let mut cache = ForecastCache::new(300);
        cache.mark_failed_retry_later(100, 300);
        assert!(cache.is_stale(101));
    }

    #[test]
    fn test_success_clears_pending_retry() {
        let mut cache = ForecastCache::new(60);
        cache.mark_refreshed(1_000);
        cache.mark_failed_retry_later(1_100, 300);
        cache.mark_refreshed(1_200);
        assert!(!cache.is_stale(1_260));
        assert!(cache.is_stale(1_261));
    }
}
