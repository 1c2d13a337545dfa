//! # Harmonic Prediction Engine
//!
//! Combines a station's harmonic constants with the astronomical engine to
//! evaluate water level, its rate of change, high/low water events, and
//! uniformly sampled height curves.
//!
//! ## Prediction model
//!
//! For a reference station the height at instant `t` is the classical
//! harmonic sum
//!
//! ```text
//! h(t) = Z₀ + Σᵢ Aᵢ · fᵢ(t) · cos( ωᵢ·(t − t_ref) + Vᵢ(t_ref) + uᵢ(t) − κᵢ )
//! ```
//!
//! with the equilibrium argument V evaluated **once** at the fixed reference
//! epoch (1983-01-01 00:00:00 UTC) and cached at engine construction, while
//! the slowly varying node factor f and nodal phase u are evaluated at the
//! prediction instant. Evaluating V at the prediction time as well would
//! double-count the slow terms and bias every prediction.
//!
//! Subordinate stations resolve to their reference's constants; their time
//! offsets shift the found extrema and their height factors scale the
//! departure from datum, with the factor chosen by the sign of the
//! *reference* rate (using the subordinate's own corrected rate here would
//! be circular with the rising/falling classifier).
//!
//! ## Extremum search
//!
//! A coarse forward scan in 30-minute steps watches the sign of the rate; a
//! sign change brackets an extremum, which a Newton iteration on the rate
//! polishes to sub-second precision. The search gives up 30 hours out, so a
//! station with degenerate constants yields "no extremum" rather than a
//! spin.
//!
//! ## Time arithmetic
//!
//! ω is degrees per mean solar hour, so every `ω·Δt` product expresses Δt
//! in hours as `seconds / 3600` in double precision. Integer hour
//! arithmetic accumulates errors of many minutes within months.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::astro::{self, NodalCorrections};
use crate::constituents::{self, CONSTITUENTS};
use crate::station::{StationConstants, StationKind, StationProvider, SubordinateOffsets};
use crate::{ExtremumType, TideDirection, TideError, TideExtremum, TideHeight};

/// Rates below this magnitude (length units per hour) classify as slack.
pub const EPSILON_SLACK: f64 = 0.05;

/// Newton convergence threshold on the rate, length units per hour.
const EPSILON_NEWTON: f64 = 1e-3;

/// Maximum Newton iterations before declaring non-convergence.
const NEWTON_MAX_ITERATIONS: usize = 20;

/// Half-width of the symmetric difference used for the rate.
const RATE_DELTA_SECONDS: i64 = 60;

/// Half-width of the symmetric difference used for the rate's derivative
/// during Newton refinement.
const NEWTON_DELTA_SECONDS: i64 = 300;

/// Coarse bracketing step.
const COARSE_STEP_MINUTES: i64 = 30;

/// The coarse scan starts this far after the query instant.
const SEARCH_START_OFFSET_MINUTES: i64 = 10;

/// The search gives up this far after the query instant.
const SEARCH_HORIZON_HOURS: i64 = 30;

/// Newton iterates may wander this far outside the coarse bracket.
const BRACKET_SLACK_HOURS: i64 = 1;

/// Reference epoch for the cached equilibrium arguments.
pub fn reference_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1983, 1, 1, 0, 0, 0).unwrap()
}

/// Harmonic prediction engine over a station provider.
///
/// Pure and reentrant: every method takes `&self` and mutates nothing, so a
/// shared engine may be called from any thread without coordination.
pub struct TideEngine<P: StationProvider> {
    provider: P,
    /// Equilibrium argument V at [`reference_epoch`] per catalog
    /// constituent, in catalog order. Computed once at construction.
    v0_ref: [f64; CONSTITUENTS.len()],
}

/// A station id resolved to the constants that predictions run on.
struct Resolved<'a> {
    constants: &'a StationConstants,
    subordinate: Option<SubordinateOffsets>,
}

impl<P: StationProvider> TideEngine<P> {
    /// Build an engine over `provider`, caching V at the reference epoch
    /// for every catalog constituent.
    pub fn new(provider: P) -> Self {
        let epoch = reference_epoch();
        let mut v0_ref = [0.0; CONSTITUENTS.len()];
        for (slot, constituent) in v0_ref.iter_mut().zip(CONSTITUENTS.iter()) {
            *slot = astro::equilibrium_argument(constituent, epoch);
        }
        TideEngine { provider, v0_ref }
    }

    /// The provider this engine resolves stations through.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve a station id to reference constants plus any subordinate
    /// offsets, surfacing the two shape-level errors.
    fn resolve(&self, station_id: &str) -> Result<Resolved<'_>, TideError> {
        let kind = self
            .provider
            .resolve_kind(station_id)
            .ok_or_else(|| TideError::UnknownStation(station_id.to_string()))?;

        let (reference_id, subordinate) = match kind {
            StationKind::Reference => (station_id.to_string(), None),
            StationKind::Subordinate {
                reference_id,
                offsets,
            } => (reference_id, Some(offsets)),
        };

        let constants = self
            .provider
            .constants(&reference_id)
            .ok_or(TideError::UnknownStation(reference_id))?;

        if constants.constituents.is_empty() {
            return Err(TideError::EmptyConstants(station_id.to_string()));
        }

        Ok(Resolved {
            constants,
            subordinate,
        })
    }

    // -- Reference-station evaluation (no subordinate post-processing) --

    /// Harmonic sum at `t`. Station constituents with names missing from
    /// the catalog are skipped.
    fn reference_height(&self, constants: &StationConstants, t: DateTime<Utc>) -> f64 {
        let args = astro::arguments(t);
        let corrections = NodalCorrections::from_arguments(&args);
        let dt_hours = hours_since_reference(t);

        let mut height = constants.datum_offset;
        for hc in &constants.constituents {
            let Some((index, constituent)) = constituents::lookup_indexed(&hc.name) else {
                continue;
            };
            let phase_deg = constituent.speed * dt_hours
                + self.v0_ref[index]
                + corrections.nodal_phase(constituent)
                - hc.phase_gmt;
            height += hc.amplitude
                * corrections.node_factor(constituent)
                * phase_deg.to_radians().cos();
        }
        height
    }

    /// Symmetric-difference rate of the reference height at `t`, in length
    /// units per hour.
    fn reference_rate(&self, constants: &StationConstants, t: DateTime<Utc>) -> f64 {
        let delta = Duration::seconds(RATE_DELTA_SECONDS);
        let plus = self.reference_height(constants, t + delta);
        let minus = self.reference_height(constants, t - delta);
        (plus - minus) / (2.0 * RATE_DELTA_SECONDS as f64 / 3600.0)
    }

    // -- Public operations --

    /// Water level at `t` for `station_id`, in the station's length unit.
    ///
    /// Subordinate ids resolve to their reference's constants; the height
    /// factor (high or low, chosen by the sign of the reference rate)
    /// scales the departure from the datum offset Z₀.
    pub fn height(&self, station_id: &str, t: DateTime<Utc>) -> Result<f64, TideError> {
        let resolved = self.resolve(station_id)?;
        let height = self.reference_height(resolved.constants, t);

        Ok(match resolved.subordinate {
            None => height,
            Some(offsets) => {
                let reference_rate = self.reference_rate(resolved.constants, t);
                let factor = if reference_rate >= 0.0 {
                    offsets.height_factor_high
                } else {
                    offsets.height_factor_low
                };
                factor * height + (1.0 - factor) * resolved.constants.datum_offset
            }
        })
    }

    /// Rate of change of the water level at `t`, length units per hour.
    ///
    /// Subordinate ids collapse to their reference's rate; the height
    /// factor is deliberately not applied here.
    pub fn rate(&self, station_id: &str, t: DateTime<Utc>) -> Result<f64, TideError> {
        let resolved = self.resolve(station_id)?;
        Ok(self.reference_rate(resolved.constants, t))
    }

    /// Height, rate, and direction at `t` in one call.
    pub fn tide_height(&self, station_id: &str, t: DateTime<Utc>) -> Result<TideHeight, TideError> {
        let resolved = self.resolve(station_id)?;
        Ok(self.sample(&resolved, t))
    }

    /// Evaluate one sample against already-resolved constants.
    fn sample(&self, resolved: &Resolved<'_>, t: DateTime<Utc>) -> TideHeight {
        let rate = self.reference_rate(resolved.constants, t);
        let height = match &resolved.subordinate {
            None => self.reference_height(resolved.constants, t),
            Some(offsets) => {
                let factor = if rate >= 0.0 {
                    offsets.height_factor_high
                } else {
                    offsets.height_factor_low
                };
                factor * self.reference_height(resolved.constants, t)
                    + (1.0 - factor) * resolved.constants.datum_offset
            }
        };
        TideHeight {
            time: t,
            height,
            rate,
            direction: classify_direction(rate),
        }
    }

    /// First high (or low) water strictly after `t`, or `None` when the
    /// 30-hour search horizon brackets no matching extremum.
    ///
    /// For subordinate stations the found reference extremum is shifted by
    /// the high/low time offset and its height recomputed at the shifted
    /// time through [`TideEngine::height`], which applies the height
    /// factor.
    pub fn next_extremum(
        &self,
        station_id: &str,
        t: DateTime<Utc>,
        want_high: bool,
    ) -> Result<Option<TideExtremum>, TideError> {
        let resolved = self.resolve(station_id)?;
        let horizon = t + Duration::hours(SEARCH_HORIZON_HOURS);

        let mut t_prev = t + Duration::minutes(SEARCH_START_OFFSET_MINUTES);
        let mut rate_prev = self.reference_rate(resolved.constants, t_prev);

        while t_prev < horizon {
            let t_curr = (t_prev + Duration::minutes(COARSE_STEP_MINUTES)).min(horizon);
            let rate_curr = self.reference_rate(resolved.constants, t_curr);

            if rate_prev * rate_curr < 0.0 {
                if let Some((t_extremum, acceleration)) =
                    self.refine_extremum(resolved.constants, t_prev, t_curr)
                {
                    let is_high = acceleration < 0.0;
                    if is_high == want_high {
                        return Ok(Some(self.finish_extremum(
                            station_id,
                            &resolved,
                            t_extremum,
                            is_high,
                        )?));
                    }
                }
                // Wrong type or non-convergence: keep scanning forward.
            }

            t_prev = t_curr;
            rate_prev = rate_curr;
        }

        Ok(None)
    }

    /// Turn a refined reference-station extremum instant into the returned
    /// event, applying subordinate offsets when present.
    fn finish_extremum(
        &self,
        station_id: &str,
        resolved: &Resolved<'_>,
        t_extremum: DateTime<Utc>,
        is_high: bool,
    ) -> Result<TideExtremum, TideError> {
        let kind = if is_high {
            ExtremumType::High
        } else {
            ExtremumType::Low
        };

        match &resolved.subordinate {
            None => Ok(TideExtremum {
                time: t_extremum,
                height: self.reference_height(resolved.constants, t_extremum),
                kind,
            }),
            Some(offsets) => {
                let shift = if is_high {
                    offsets.time_offset_high
                } else {
                    offsets.time_offset_low
                };
                let shifted = t_extremum + Duration::minutes(shift);
                Ok(TideExtremum {
                    time: shifted,
                    height: self.height(station_id, shifted)?,
                    kind,
                })
            }
        }
    }

    /// Newton refinement of a bracketed extremum: drive the rate to zero,
    /// classify by the sign of its derivative. Returns the refined instant
    /// and the acceleration there, or `None` on non-convergence or escape
    /// from the bracket (±1 h of slack allowed).
    fn refine_extremum(
        &self,
        constants: &StationConstants,
        bracket_lo: DateTime<Utc>,
        bracket_hi: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, f64)> {
        let lo = bracket_lo - Duration::hours(BRACKET_SLACK_HOURS);
        let hi = bracket_hi + Duration::hours(BRACKET_SLACK_HOURS);
        let mut t = bracket_lo + (bracket_hi - bracket_lo) / 2;

        for _ in 0..NEWTON_MAX_ITERATIONS {
            let rate = self.reference_rate(constants, t);
            let delta = Duration::seconds(NEWTON_DELTA_SECONDS);
            let acceleration = (self.reference_rate(constants, t + delta)
                - self.reference_rate(constants, t - delta))
                / (2.0 * NEWTON_DELTA_SECONDS as f64 / 3600.0);

            if rate.abs() < EPSILON_NEWTON {
                return Some((t, acceleration));
            }
            if acceleration == 0.0 {
                return None;
            }

            let step_hours = -rate / acceleration;
            t += Duration::milliseconds((step_hours * 3_600_000.0) as i64);
            if t < lo || t > hi {
                return None;
            }
        }

        None
    }

    /// All extrema in `[t0, t1)`, sorted by time, strictly alternating in
    /// type. Empty when `t1 <= t0` or when nothing is found.
    pub fn extrema(
        &self,
        station_id: &str,
        t0: DateTime<Utc>,
        t1: DateTime<Utc>,
    ) -> Result<Vec<TideExtremum>, TideError> {
        if t1 <= t0 {
            return Ok(Vec::new());
        }

        // rate > 0 at the interval start means a high comes next.
        let mut want_high = self.rate(station_id, t0)? > 0.0;
        let mut cursor = t0;
        let mut events = Vec::new();

        while let Some(extremum) = self.next_extremum(station_id, cursor, want_high)? {
            if extremum.time >= t1 {
                break;
            }
            cursor = extremum.time;
            want_high = !want_high;
            events.push(extremum);
        }

        Ok(events)
    }

    /// Heights sampled at `t0, t0 + step, …` up to and including `t1` when
    /// it lands on the grid. Intervals are exactly `step_minutes * 60`
    /// seconds. Empty when `t0 > t1` or the step is not positive.
    pub fn curve(
        &self,
        station_id: &str,
        t0: DateTime<Utc>,
        t1: DateTime<Utc>,
        step_minutes: i64,
    ) -> Result<Vec<TideHeight>, TideError> {
        if t0 > t1 || step_minutes <= 0 {
            return Ok(Vec::new());
        }

        let resolved = self.resolve(station_id)?;
        let step = Duration::seconds(step_minutes * 60);
        let capacity = ((t1 - t0).num_seconds() / step.num_seconds() + 1) as usize;
        let mut samples = Vec::with_capacity(capacity);

        let mut t = t0;
        while t <= t1 {
            samples.push(self.sample(&resolved, t));
            t += step;
        }

        Ok(samples)
    }
}

/// Classify a rate as rising, falling, or slack.
pub fn classify_direction(rate: f64) -> TideDirection {
    if rate.abs() < EPSILON_SLACK {
        TideDirection::Slack
    } else if rate > 0.0 {
        TideDirection::Rising
    } else {
        TideDirection::Falling
    }
}

/// Mean solar hours elapsed since the reference epoch, double precision.
fn hours_since_reference(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9;
    let epoch_seconds = reference_epoch().timestamp() as f64;
    (seconds - epoch_seconds) / 3600.0
}
