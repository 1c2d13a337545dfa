//! # Day-Scoped Extrema Cache
//!
//! Searching a week of extrema costs a few thousand harmonic evaluations,
//! which is far too slow to repeat for every widget refresh. This cache
//! computes the rolling N-day extrema window (default 7 days) once per
//! station per UTC day and serves every subsequent query from memory.
//!
//! ## Caching Strategy
//!
//! - **Window**: `[start of today UTC, start of today + N days)`, recomputed
//!   lazily on the first query of each UTC calendar day
//! - **Validity**: an entry is valid iff its creation date equals the
//!   current UTC date; `invalidate_expired` drops everything older
//! - **Single flight**: one mutex guards the entry map *and* the miss
//!   computation, so N concurrent readers of a cold station trigger exactly
//!   one extremum-search pass and then all observe the same published entry
//! - **Determinism**: within one UTC day every query answers from the same
//!   immutable entry, independent of call order or concurrency
//!
//! Readers of different stations serialize on the same lock; with a
//! handful of stations on a watch this is far cheaper than finer locking.
//!
//! ## Error Handling
//!
//! The cache adds no error kinds of its own: a forced computation re-raises
//! the engine's `UnknownStation` / `EmptyConstants`, and queries that find
//! nothing return `None` or an empty list.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::harmonics::TideEngine;
use crate::station::StationProvider;
use crate::{ExtremumType, TideError, TideExtremum};

/// Default rolling window, days.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// One station's cached window.
#[derive(Clone, Debug)]
struct CacheEntry {
    /// Extrema for the window, strictly increasing, types alternating.
    extrema: Vec<TideExtremum>,
    /// UTC calendar date the entry was computed on.
    created_on: NaiveDate,
    /// Window bounds `[start, end)`.
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

/// Per-station cache summary returned by [`ExtremaCache::stats`].
#[derive(Clone, Debug)]
pub struct StationCacheStats {
    /// Station the entry belongs to.
    pub station_id: String,
    /// Number of cached extrema.
    pub extremum_count: usize,
    /// Start of the cached window.
    pub window_start: DateTime<Utc>,
    /// End of the cached window (exclusive).
    pub window_end: DateTime<Utc>,
    /// Whether the entry is valid for the current UTC date.
    pub valid: bool,
}

/// Precomputed extrema store over a [`TideEngine`].
pub struct ExtremaCache<P: StationProvider> {
    engine: TideEngine<P>,
    window_days: i64,
    entries: Mutex<HashMap<String, CacheEntry>>,
    rebuilds: AtomicU64,
}

impl<P: StationProvider> ExtremaCache<P> {
    /// Cache over `engine` with the default 7-day window.
    pub fn new(engine: TideEngine<P>) -> Self {
        Self::with_window_days(engine, DEFAULT_WINDOW_DAYS)
    }

    /// Cache with a custom window length in days (minimum 1).
    pub fn with_window_days(engine: TideEngine<P>, window_days: i64) -> Self {
        ExtremaCache {
            engine,
            window_days: window_days.max(1),
            entries: Mutex::new(HashMap::new()),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// The engine queries are answered from.
    pub fn engine(&self) -> &TideEngine<P> {
        &self.engine
    }

    /// Number of window computations performed since construction.
    /// Diagnostic; also what the single-flight test observes.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    // -- Queries (wall-clock entry points delegate to the `_at` variants,
    //    which take the current instant explicitly for deterministic tests) --

    /// First cached high strictly after `t`, or `None` if none remains in
    /// the window.
    pub fn next_high(&self, station_id: &str, t: DateTime<Utc>) -> Result<Option<TideExtremum>, TideError> {
        self.next_high_at(station_id, t, Utc::now())
    }

    /// See [`ExtremaCache::next_high`].
    pub fn next_high_at(
        &self,
        station_id: &str,
        t: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<TideExtremum>, TideError> {
        self.next_of_kind(station_id, t, now, ExtremumType::High)
    }

    /// First cached low strictly after `t`, or `None` if none remains in
    /// the window.
    pub fn next_low(&self, station_id: &str, t: DateTime<Utc>) -> Result<Option<TideExtremum>, TideError> {
        self.next_low_at(station_id, t, Utc::now())
    }

    /// See [`ExtremaCache::next_low`].
    pub fn next_low_at(
        &self,
        station_id: &str,
        t: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<TideExtremum>, TideError> {
        self.next_of_kind(station_id, t, now, ExtremumType::Low)
    }

    fn next_of_kind(
        &self,
        station_id: &str,
        t: DateTime<Utc>,
        now: DateTime<Utc>,
        kind: ExtremumType,
    ) -> Result<Option<TideExtremum>, TideError> {
        self.with_entry(station_id, now, |entry| {
            entry
                .extrema
                .iter()
                .find(|e| e.kind == kind && e.time > t)
                .copied()
        })
    }

    /// The full cached window, sorted ascending.
    pub fn all_extrema(&self, station_id: &str) -> Result<Vec<TideExtremum>, TideError> {
        self.all_extrema_at(station_id, Utc::now())
    }

    /// See [`ExtremaCache::all_extrema`].
    pub fn all_extrema_at(
        &self,
        station_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<TideExtremum>, TideError> {
        self.with_entry(station_id, now, |entry| entry.extrema.clone())
    }

    /// Cached extrema with `t0 <= time <= t1` (both boundaries inclusive).
    /// Empty when `t1 < t0`.
    pub fn in_range(
        &self,
        station_id: &str,
        t0: DateTime<Utc>,
        t1: DateTime<Utc>,
    ) -> Result<Vec<TideExtremum>, TideError> {
        self.in_range_at(station_id, t0, t1, Utc::now())
    }

    /// See [`ExtremaCache::in_range`].
    pub fn in_range_at(
        &self,
        station_id: &str,
        t0: DateTime<Utc>,
        t1: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TideExtremum>, TideError> {
        if t1 < t0 {
            return Ok(Vec::new());
        }
        self.with_entry(station_id, now, |entry| {
            entry
                .extrema
                .iter()
                .filter(|e| e.time >= t0 && e.time <= t1)
                .copied()
                .collect()
        })
    }

    /// Ensure a valid entry exists for this UTC day.
    pub fn prewarm(&self, station_id: &str) -> Result<(), TideError> {
        self.prewarm_at(station_id, Utc::now())
    }

    /// See [`ExtremaCache::prewarm`].
    pub fn prewarm_at(&self, station_id: &str, now: DateTime<Utc>) -> Result<(), TideError> {
        self.with_entry(station_id, now, |_| ())
    }

    // -- Invalidation --

    /// Drop the entry for one station.
    pub fn invalidate(&self, station_id: &str) {
        self.entries
            .lock()
            .expect("extrema cache lock poisoned")
            .remove(station_id);
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.entries
            .lock()
            .expect("extrema cache lock poisoned")
            .clear();
    }

    /// Drop only entries whose creation date is not the current UTC date.
    pub fn invalidate_expired(&self) {
        self.invalidate_expired_at(Utc::now());
    }

    /// See [`ExtremaCache::invalidate_expired`].
    pub fn invalidate_expired_at(&self, now: DateTime<Utc>) {
        let today = now.date_naive();
        self.entries
            .lock()
            .expect("extrema cache lock poisoned")
            .retain(|_, entry| entry.created_on == today);
    }

    /// Snapshot of every cached entry, taken under the cache lock.
    pub fn stats(&self) -> Vec<StationCacheStats> {
        self.stats_at(Utc::now())
    }

    /// See [`ExtremaCache::stats`].
    pub fn stats_at(&self, now: DateTime<Utc>) -> Vec<StationCacheStats> {
        let today = now.date_naive();
        let entries = self.entries.lock().expect("extrema cache lock poisoned");
        let mut stats: Vec<StationCacheStats> = entries
            .iter()
            .map(|(id, entry)| StationCacheStats {
                station_id: id.clone(),
                extremum_count: entry.extrema.len(),
                window_start: entry.window_start,
                window_end: entry.window_end,
                valid: entry.created_on == today,
            })
            .collect();
        stats.sort_by(|a, b| a.station_id.cmp(&b.station_id));
        stats
    }

    // -- Entry management --

    /// Run `f` against the valid entry for `station_id`, computing it first
    /// if missing or stale. The computation happens while holding the map
    /// lock: concurrent callers for the same (station, day) block here and
    /// then read the single published entry.
    fn with_entry<R>(
        &self,
        station_id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&CacheEntry) -> R,
    ) -> Result<R, TideError> {
        let today = now.date_naive();
        let mut entries = self.entries.lock().expect("extrema cache lock poisoned");

        let needs_rebuild = match entries.get(station_id) {
            Some(entry) => entry.created_on != today,
            None => true,
        };

        if needs_rebuild {
            let entry = self.compute_entry(station_id, today)?;
            self.rebuilds.fetch_add(1, Ordering::Relaxed);
            entries.insert(station_id.to_string(), entry);
        }

        let entry = entries
            .get(station_id)
            .expect("entry present after rebuild");
        Ok(f(entry))
    }

    /// Compute the window entry for `today`.
    fn compute_entry(&self, station_id: &str, today: NaiveDate) -> Result<CacheEntry, TideError> {
        let window_start = today
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc();
        let window_end = window_start + Duration::days(self.window_days);

        let extrema = self.engine.extrema(station_id, window_start, window_end)?;

        Ok(CacheEntry {
            extrema,
            created_on: today,
            window_start,
            window_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonics::TideEngine;
    use crate::station::{HarmonicConstituent, StationCatalog, StationConstants};
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn m2_cache() -> ExtremaCache<StationCatalog> {
        let mut catalog = StationCatalog::new();
        catalog.insert_reference(
            "M2ONLY",
            StationConstants {
                datum_offset: 0.0,
                constituents: vec![HarmonicConstituent {
                    name: "M2".to_string(),
                    amplitude: 1.5,
                    phase_gmt: 10.0,
                }],
            },
        );
        ExtremaCache::new(TideEngine::new(catalog))
    }

    #[test]
    fn window_covers_seven_days_from_midnight() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 9, 30, 0);
        cache.prewarm_at("M2ONLY", now).unwrap();

        let stats = cache.stats_at(now);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].window_start, utc(2026, 2, 12, 0, 0, 0));
        assert_eq!(stats[0].window_end, utc(2026, 2, 19, 0, 0, 0));
        assert!(stats[0].valid);
        // Pure M2 over 7 days: about 27 extrema.
        assert!(
            (24..=29).contains(&stats[0].extremum_count),
            "unexpected extremum count {}",
            stats[0].extremum_count
        );
    }

    #[test]
    fn queries_reuse_the_entry_within_a_day() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 0, 30, 0);

        let all_first = cache.all_extrema_at("M2ONLY", now).unwrap();
        let all_again = cache.all_extrema_at("M2ONLY", now + Duration::hours(5)).unwrap();
        assert_eq!(all_first.len(), all_again.len());
        for (a, b) in all_first.iter().zip(all_again.iter()) {
            assert_eq!(a.time, b.time);
        }
        assert_eq!(cache.rebuild_count(), 1, "same-day queries must not rebuild");
    }

    #[test]
    fn date_change_triggers_rebuild() {
        let cache = m2_cache();
        let day_one = utc(2026, 2, 12, 23, 0, 0);
        let day_two = utc(2026, 2, 13, 0, 5, 0);

        cache.prewarm_at("M2ONLY", day_one).unwrap();
        cache.prewarm_at("M2ONLY", day_two).unwrap();
        assert_eq!(cache.rebuild_count(), 2);

        let stats = cache.stats_at(day_two);
        assert_eq!(stats[0].window_start, utc(2026, 2, 13, 0, 0, 0));
    }

    #[test]
    fn next_high_and_low_respect_kind_and_strict_after() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 0, 0, 0);

        let all = cache.all_extrema_at("M2ONLY", now).unwrap();
        let first = all[0];

        let next = match first.kind {
            ExtremumType::High => cache.next_high_at("M2ONLY", now, now).unwrap().unwrap(),
            ExtremumType::Low => cache.next_low_at("M2ONLY", now, now).unwrap().unwrap(),
        };
        assert_eq!(next.time, first.time);

        // Querying exactly at an extremum must return the following one of
        // that kind (strictly after), not the extremum itself.
        let following = match first.kind {
            ExtremumType::High => cache.next_high_at("M2ONLY", first.time, now).unwrap(),
            ExtremumType::Low => cache.next_low_at("M2ONLY", first.time, now).unwrap(),
        };
        assert!(following.unwrap().time > first.time);
    }

    #[test]
    fn next_query_past_window_returns_none() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 0, 0, 0);
        let beyond = utc(2026, 2, 19, 0, 0, 0);
        assert!(cache.next_high_at("M2ONLY", beyond, now).unwrap().is_none());
        assert!(cache.next_low_at("M2ONLY", beyond, now).unwrap().is_none());
    }

    #[test]
    fn in_range_is_inclusive_and_rejects_inverted() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 0, 0, 0);
        let all = cache.all_extrema_at("M2ONLY", now).unwrap();
        let first = all[0];

        let hits = cache
            .in_range_at("M2ONLY", first.time, first.time, now)
            .unwrap();
        assert_eq!(hits.len(), 1, "boundary extremum must be included");
        assert_eq!(hits[0].time, first.time);

        let none = cache
            .in_range_at("M2ONLY", first.time, first.time - Duration::seconds(1), now)
            .unwrap();
        assert!(none.is_empty(), "inverted range must be empty");
    }

    #[test]
    fn invalidate_drops_entries() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 6, 0, 0);

        cache.prewarm_at("M2ONLY", now).unwrap();
        assert_eq!(cache.stats_at(now).len(), 1);

        cache.invalidate("M2ONLY");
        assert!(cache.stats_at(now).is_empty());

        cache.prewarm_at("M2ONLY", now).unwrap();
        cache.invalidate_all();
        assert!(cache.stats_at(now).is_empty());
    }

    #[test]
    fn invalidate_expired_keeps_todays_entries() {
        let cache = m2_cache();
        let yesterday = utc(2026, 2, 11, 12, 0, 0);
        let today = utc(2026, 2, 12, 12, 0, 0);

        cache.prewarm_at("M2ONLY", yesterday).unwrap();
        cache.invalidate_expired_at(today);
        assert!(cache.stats_at(today).is_empty(), "stale entry must be dropped");

        cache.prewarm_at("M2ONLY", today).unwrap();
        cache.invalidate_expired_at(today);
        assert_eq!(cache.stats_at(today).len(), 1, "fresh entry must survive");
    }

    #[test]
    fn cache_reraises_engine_errors() {
        let cache = m2_cache();
        let now = utc(2026, 2, 12, 0, 0, 0);
        assert_eq!(
            cache.prewarm_at("NOPE", now),
            Err(TideError::UnknownStation("NOPE".to_string()))
        );
        assert!(cache.next_high_at("NOPE", now, now).is_err());
    }
}
