//! # Station Records and the Station Provider
//!
//! The prediction engine never owns station storage; it consumes a read-only
//! [`StationProvider`] capability that resolves a station id to its kind
//! (reference vs subordinate), harmonic constants, datum offset, and any
//! subordinate offset record.
//!
//! [`StationCatalog`] is the bundled in-memory implementation. It
//! deserializes the station corpus produced by the data pipeline
//! (`stations.json`: one record per station with camelCase fields, a `type`
//! tag, `phase_GMT` constituent phases, and `tidepredoffsets` for
//! subordinates) and serves lookups from a map. Records are immutable once
//! loaded, so the catalog is freely shareable across threads.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a station database file.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The database file could not be read.
    #[error("station database IO: {0}")]
    Io(#[from] std::io::Error),

    /// The database file is not valid station JSON.
    #[error("station database parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// A subordinate record does not name its reference station.
    #[error("subordinate station {0} has no reference station id")]
    MissingReference(String),

    /// A record carries a station type the pipeline never emits.
    #[error("station {0} has unknown type {1:?}")]
    UnknownStationType(String, String),
}

/// One harmonic constituent of a station: name, amplitude in the station's
/// length unit, and phase lag κ in degrees referenced to GMT/UTC.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarmonicConstituent {
    /// NOAA constituent name (matched case-sensitively against the catalog).
    pub name: String,
    /// Amplitude A.
    pub amplitude: f64,
    /// GMT phase lag κ, degrees.
    #[serde(rename = "phase_GMT")]
    pub phase_gmt: f64,
}

/// The harmonic constants of a reference station.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StationConstants {
    /// Datum offset Z₀: elevation of mean sea level above the station
    /// datum (MLLW for the bundled corpus), in the station's length unit.
    #[serde(default)]
    pub datum_offset: f64,
    /// Per-constituent constants, in the record's declared order.
    pub constituents: Vec<HarmonicConstituent>,
}

/// Time and height corrections of a subordinate station relative to its
/// reference. Time offsets are signed minutes; height factors are
/// dimensionless ratios applied to the departure from datum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubordinateOffsets {
    /// Minutes added to the reference high-water times.
    pub time_offset_high: i64,
    /// Minutes added to the reference low-water times.
    pub time_offset_low: i64,
    /// Ratio applied to high-water departures from datum.
    pub height_factor_high: f64,
    /// Ratio applied to low-water departures from datum.
    pub height_factor_low: f64,
}

/// Resolution of a station id.
#[derive(Clone, Debug)]
pub enum StationKind {
    /// Predictions come directly from the station's own constants.
    Reference,
    /// Predictions derive from another station's constants plus offsets.
    Subordinate {
        /// Id of the reference station carrying the constants.
        reference_id: String,
        /// Offset record applied to the reference predictions.
        offsets: SubordinateOffsets,
    },
}

/// Read-only lookup capability consumed by the harmonic engine.
///
/// Implementations must be referentially transparent for the duration of a
/// prediction; the engine treats them as immutable configuration loaded
/// once and performs no interior mutation through this trait.
pub trait StationProvider {
    /// Resolve a station id to its kind, or `None` for unknown ids.
    fn resolve_kind(&self, station_id: &str) -> Option<StationKind>;

    /// Harmonic constants for a (reference) station id, or `None` when the
    /// provider has no constants for it.
    fn constants(&self, station_id: &str) -> Option<&StationConstants>;
}

// -- Bundled catalog implementation --

/// Raw station record as produced by the data pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationRecord {
    id: String,
    #[serde(default)]
    name: String,
    /// "harmonic" or "subordinate".
    #[serde(rename = "type")]
    station_type: String,
    #[serde(default)]
    reference_station_id: Option<String>,
    #[serde(default)]
    datum_offset: f64,
    #[serde(default)]
    harmonic_constituents: Vec<HarmonicConstituent>,
    #[serde(default)]
    tidepredoffsets: Option<RawOffsets>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOffsets {
    #[serde(default)]
    time_offset_high_tide: i64,
    #[serde(default)]
    time_offset_low_tide: i64,
    #[serde(default = "unity")]
    height_offset_high_tide: f64,
    #[serde(default = "unity")]
    height_offset_low_tide: f64,
}

fn unity() -> f64 {
    1.0
}

/// In-memory station database.
///
/// Stations are keyed by id; reference stations carry constants, and
/// subordinate stations carry a reference id plus an offset record.
#[derive(Clone, Debug, Default)]
pub struct StationCatalog {
    constants: HashMap<String, StationConstants>,
    kinds: HashMap<String, StationKind>,
    names: HashMap<String, String>,
}

impl StationCatalog {
    /// Empty catalog; populate with [`StationCatalog::insert_reference`] /
    /// [`StationCatalog::insert_subordinate`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a station database from a JSON file in the pipeline's
    /// `stations.json` shape.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a station database from JSON text.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<StationRecord> = serde_json::from_str(json)?;
        let mut catalog = StationCatalog::new();

        for record in records {
            // The pipeline only ever writes these two types; anything else
            // is a corrupt or mislabeled record and must not load.
            match record.station_type.as_str() {
                "subordinate" => {
                    let reference_id = record
                        .reference_station_id
                        .clone()
                        .ok_or_else(|| CatalogError::MissingReference(record.id.clone()))?;
                    let raw = record.tidepredoffsets.unwrap_or(RawOffsets {
                        time_offset_high_tide: 0,
                        time_offset_low_tide: 0,
                        height_offset_high_tide: 1.0,
                        height_offset_low_tide: 1.0,
                    });
                    catalog.insert_subordinate(
                        &record.id,
                        &reference_id,
                        SubordinateOffsets {
                            time_offset_high: raw.time_offset_high_tide,
                            time_offset_low: raw.time_offset_low_tide,
                            height_factor_high: raw.height_offset_high_tide,
                            height_factor_low: raw.height_offset_low_tide,
                        },
                    );
                }
                "harmonic" => {
                    catalog.insert_reference(
                        &record.id,
                        StationConstants {
                            datum_offset: record.datum_offset,
                            constituents: record.harmonic_constituents,
                        },
                    );
                }
                other => {
                    return Err(CatalogError::UnknownStationType(
                        record.id.clone(),
                        other.to_string(),
                    ));
                }
            }
            catalog.names.insert(record.id.clone(), record.name);
        }

        Ok(catalog)
    }

    /// Add a reference station with its constants.
    pub fn insert_reference(&mut self, id: &str, constants: StationConstants) {
        self.constants.insert(id.to_string(), constants);
        self.kinds.insert(id.to_string(), StationKind::Reference);
    }

    /// Add a subordinate station pointing at `reference_id`.
    pub fn insert_subordinate(
        &mut self,
        id: &str,
        reference_id: &str,
        offsets: SubordinateOffsets,
    ) {
        self.kinds.insert(
            id.to_string(),
            StationKind::Subordinate {
                reference_id: reference_id.to_string(),
                offsets,
            },
        );
    }

    /// Human-readable station name, when the record carried one.
    pub fn station_name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Number of stations in the catalog.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True when no stations are loaded.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl StationProvider for StationCatalog {
    fn resolve_kind(&self, station_id: &str) -> Option<StationKind> {
        self.kinds.get(station_id).cloned()
    }

    fn constants(&self, station_id: &str) -> Option<&StationConstants> {
        self.constants.get(station_id)
    }
}
