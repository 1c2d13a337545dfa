//! # Tide Predictor Core Library
//!
//! This library is the harmonic tide-prediction core of the tide clock: given
//! a station's stored harmonic constants and a UTC instant it computes water
//! level, its time derivative, the next high/low water, uniformly sampled
//! height curves, and a precomputed multi-day extrema cache that the display
//! layers query cheaply.
//!
//! ## Design Philosophy
//!
//! ### Fully offline
//! Earlier revisions of this project scraped NOAA's prediction pages at
//! runtime. All predictions are now computed on-device from bundled harmonic
//! constants, so the device never touches the network: the classical
//! Schureman / NOAA SP98 model (37 partial-tide constituents with node
//! factors and equilibrium arguments) reproduces the published tide tables
//! to within a couple of minutes and a tenth of a foot.
//!
//! ### Watch-friendly evaluation
//! - **One cosine per constituent**: a height evaluation is O(37) cosines
//!   plus a handful of transcendental operations for the nodal corrections,
//!   which are computed once per instant and shared across constituents
//! - **No per-call allocation** on the height/rate hot path
//! - **Day-scoped caching**: the rolling 7-day extrema window is computed
//!   once per station per UTC day and then served from memory
//!
//! ### Data Flow
//! 1. **Resolve**: a station id is resolved through the [`station`] provider
//!    to its harmonic constants (subordinate ids resolve to their reference)
//! 2. **Sum**: the [`harmonics`] engine combines the constants with the
//!    [`astro`] engine's time-dependent corrections into heights and rates
//! 3. **Search**: extrema are bracketed by a coarse scan and polished with a
//!    Newton step on the rate
//! 4. **Cache**: the [`cache`] layer stores each day's extrema window behind
//!    a single mutex, safe under concurrent readers
//!
//! ## Core Types
//!
//! The library exports two primary value types shared by every layer:
//! - [`TideHeight`]: instantaneous water level with rate and direction
//! - [`TideExtremum`]: a high or low water event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Module declarations
pub mod astro;
pub mod cache;
pub mod config;
pub mod constituents;
pub mod fallback;
pub mod harmonics;
pub mod renderer;
pub mod station;

// Cross-module test suite
#[cfg(test)]
mod tests;

/// Errors surfaced by the harmonic engine and the extrema cache.
///
/// Only two "shape-level" failures are observable to callers; every
/// numerical anomaly (empty intervals, non-converging refinement, missing
/// extrema) collapses to an empty result or `None` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TideError {
    /// The station provider has no harmonic constants for the resolved id.
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// The station exists but carries no harmonic constituents.
    #[error("station {0} has no harmonic constituents")]
    EmptyConstants(String),
}

/// Direction of water movement at an instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideDirection {
    /// Water level increasing (rate above the slack threshold).
    Rising,
    /// Water level decreasing.
    Falling,
    /// |rate| below the slack threshold, regardless of sign.
    Slack,
}

/// Instantaneous water level at a specific UTC instant.
///
/// Heights and rates share the length unit of the station's constants
/// (feet for the bundled NOAA corpus); rates are per mean solar hour.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TideHeight {
    /// Instant the sample refers to.
    pub time: DateTime<Utc>,
    /// Water level above the station datum (MLLW for the bundled corpus).
    pub height: f64,
    /// Time derivative of the height, in length units per hour.
    pub rate: f64,
    /// Rising / falling / slack classification of `rate`.
    pub direction: TideDirection,
}

/// Kind of a tide extremum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremumType {
    /// Local maximum (high water).
    High,
    /// Local minimum (low water).
    Low,
}

/// A high or low water event.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TideExtremum {
    /// Instant of the extremum.
    pub time: DateTime<Utc>,
    /// Water level at the extremum.
    pub height: f64,
    /// High or low.
    pub kind: ExtremumType,
}

impl TideExtremum {
    /// True for high water.
    pub fn is_high(&self) -> bool {
        self.kind == ExtremumType::High
    }
}
