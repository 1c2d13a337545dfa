//! # Built-in Station Constants
//!
//! This module provides a compiled-in station catalog used when no station
//! database file is configured. Earlier revisions shipped a sine-wave
//! approximation here for network outages; with prediction fully on-device
//! the fallback is simply a real constant set, so "offline" mode is exactly
//! as accurate as a one-station database.
//!
//! ## Bundled stations
//!
//! - **9414290 San Francisco, CA** — full NOAA harmonic set: the four
//!   dominant semidiurnals (M2/S2/N2/K2), the four dominant diurnals
//!   (K1/O1/P1/Q1), and the long-period Mm/Mf/Ssa. Amplitudes in feet,
//!   phases in degrees referenced to GMT. Heights are relative to the
//!   station's mean sea level (datum offset zero).
//! - **9414819 Golden Gate East (subordinate)** — demonstrates the
//!   subordinate offset path: predictions derive from San Francisco with
//!   small time shifts and height ratios.
//!
//! The same catalog doubles as the deterministic fixture for the
//! cross-module test suite.

use crate::station::{
    HarmonicConstituent, StationCatalog, StationConstants, SubordinateOffsets,
};

/// Station id of the bundled reference station.
pub const BUILTIN_REFERENCE_ID: &str = "9414290";

/// Station id of the bundled demonstration subordinate.
pub const BUILTIN_SUBORDINATE_ID: &str = "9414819";

/// NOAA harmonic constants for San Francisco (station 9414290):
/// (name, amplitude ft, GMT phase °).
const SAN_FRANCISCO: [(&str, f64, f64); 11] = [
    ("M2", 2.929, 193.1),
    ("S2", 0.880, 216.7),
    ("N2", 0.668, 169.8),
    ("K2", 0.239, 216.6),
    ("K1", 0.950, 166.6),
    ("O1", 0.618, 143.1),
    ("P1", 0.286, 163.7),
    ("Q1", 0.109, 130.8),
    ("MM", 0.026, 137.7),
    ("MF", 0.049, 133.1),
    ("SSA", 0.180, 255.0),
];

/// Build the built-in catalog.
pub fn builtin_catalog() -> StationCatalog {
    let mut catalog = StationCatalog::new();

    catalog.insert_reference(
        BUILTIN_REFERENCE_ID,
        StationConstants {
            datum_offset: 0.0,
            constituents: SAN_FRANCISCO
                .iter()
                .map(|&(name, amplitude, phase_gmt)| HarmonicConstituent {
                    name: name.to_string(),
                    amplitude,
                    phase_gmt,
                })
                .collect(),
        },
    );

    catalog.insert_subordinate(
        BUILTIN_SUBORDINATE_ID,
        BUILTIN_REFERENCE_ID,
        SubordinateOffsets {
            time_offset_high: 12,
            time_offset_low: 20,
            height_factor_high: 0.96,
            height_factor_low: 1.02,
        },
    );

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{StationKind, StationProvider};

    #[test]
    fn builtin_reference_has_full_constant_set() {
        let catalog = builtin_catalog();
        let constants = catalog.constants(BUILTIN_REFERENCE_ID).unwrap();
        assert_eq!(constants.constituents.len(), 11);
        assert_eq!(constants.datum_offset, 0.0);

        // Every bundled name must resolve in the constituent catalog;
        // a typo here would be skipped silently by the engine.
        for hc in &constants.constituents {
            assert!(
                crate::constituents::lookup(&hc.name).is_some(),
                "bundled constituent {} missing from catalog",
                hc.name
            );
        }
    }

    #[test]
    fn builtin_subordinate_points_at_reference() {
        let catalog = builtin_catalog();
        match catalog.resolve_kind(BUILTIN_SUBORDINATE_ID) {
            Some(StationKind::Subordinate { reference_id, .. }) => {
                assert_eq!(reference_id, BUILTIN_REFERENCE_ID);
            }
            other => panic!("expected subordinate, got {other:?}"),
        }
    }
}
