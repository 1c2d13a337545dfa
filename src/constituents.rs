//! # Partial-Tide Constituent Catalog
//!
//! Static table of the 37 harmonic constituents NOAA publishes for its
//! reference stations, in NOAA's standard order. Each entry carries the
//! angular speed, the six Doodson multipliers over the fundamental
//! astronomical arguments (τ, s, h, p, N, p₁), the constant phase offset of
//! the equilibrium argument, a band classification, and a tag selecting the
//! Schureman node-factor / nodal-phase formulas in [`crate::astro`].
//!
//! ## Phase offset convention
//!
//! Schureman's equilibrium arguments are written against the hour angle of
//! the mean sun `T`, which is zero at *noon*. Our fundamental argument τ
//! (mean lunar time) uses a midnight epoch, so substituting
//! `T = τ + s − h − 180°` folds an extra 180° into every constituent with an
//! odd τ multiplier. The `phase_offset` column stores the net constant so
//! that `V = d·(τ, s, h, p, N, p₁) + phase_offset` — it is a property of the
//! constituent, not of the time. Dropping it shifts diurnal predictions by
//! hours, which is very visible against the published tide tables.
//!
//! Reference: Schureman, *Manual of Harmonic Analysis and Prediction of
//! Tides* (SP98), Table 2; speeds as published by NOAA CO-OPS.

/// Tidal band of a constituent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Roughly two cycles per day (M2 family, solar semidiurnals).
    Semidiurnal,
    /// Roughly one cycle per day.
    Diurnal,
    /// Fortnightly, monthly, and annual constituents.
    LongPeriod,
    /// Overtides and compound shallow-water constituents.
    Compound,
}

/// Selects the node-factor f and nodal-phase u formulas for a constituent.
///
/// The finite set of Schureman closed forms is represented as a tagged
/// enumeration matched in [`crate::astro`]; compound constituents factor as
/// signed products of their M2 and K1 components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodalKind {
    /// Pure solar constituent: f = 1, u = 0.
    Solar,
    /// M2 family (also N2, 2N2, μ2, ν2, λ2): f = cos⁴(I/2)/0.91544,
    /// u = 2(ξ−ν).
    M2,
    /// O1 family (also Q1, 2Q1, ρ1): f = sin I·cos²(I/2)/0.37689,
    /// u = 2ξ−ν.
    O1,
    /// Luni-solar declinational diurnal.
    K1,
    /// Luni-solar declinational semidiurnal.
    K2,
    /// f = sin 2I/0.7214, u = −ν.
    J1,
    /// Smaller lunar elliptic diurnal; carries the Q correction.
    M1,
    /// Smaller lunar elliptic semidiurnal; carries the R correction.
    L2,
    /// Lunar monthly: f = (2/3 − sin²I)/0.5021, u = 0.
    Mm,
    /// Lunar fortnightly: f = sin²I/0.1578, u = −2ξ.
    Mf,
    /// Lunar diurnal second-order: f = sin I·sin²(I/2)/0.01640, u = −2ξ−ν.
    Oo1,
    /// Lunar terdiurnal: f = f(M2)^(3/2), u = 3(ξ−ν).
    M3,
    /// Compound of M2 and K1 components: f = f(M2)^|m2| · f(K1)^|k1|,
    /// u = m2·u(M2) + k1·u(K1). Negative exponents subtract phase only.
    Compound { m2: i8, k1: i8 },
}

/// One partial tide.
#[derive(Clone, Copy, Debug)]
pub struct Constituent {
    /// NOAA constituent name, matched case-sensitively by station records.
    pub name: &'static str,
    /// Angular speed ω in degrees per mean solar hour.
    pub speed: f64,
    /// Doodson multipliers of (τ, s, h, p, N, p₁).
    pub doodson: [i8; 6],
    /// Constant phase offset c of the equilibrium argument, degrees.
    pub phase_offset: f64,
    /// Tidal band.
    pub class: Classification,
    /// Node-factor / nodal-phase selector.
    pub nodal: NodalKind,
}

use Classification::{Compound, Diurnal, LongPeriod, Semidiurnal};

/// The 37 NOAA constituents in NOAA's published order.
pub const CONSTITUENTS: [Constituent; 37] = [
    Constituent {
        name: "M2",
        speed: 28.984_104_2,
        doodson: [2, 0, 0, 0, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::M2,
    },
    Constituent {
        name: "S2",
        speed: 30.0,
        doodson: [2, 2, -2, 0, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "N2",
        speed: 28.439_729_5,
        doodson: [2, -1, 0, 1, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::M2,
    },
    Constituent {
        name: "K1",
        speed: 15.041_068_6,
        doodson: [1, 1, 0, 0, 0, 0],
        phase_offset: 90.0,
        class: Diurnal,
        nodal: NodalKind::K1,
    },
    Constituent {
        name: "M4",
        speed: 57.968_208_4,
        doodson: [4, 0, 0, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 2, k1: 0 },
    },
    Constituent {
        name: "O1",
        speed: 13.943_035_6,
        doodson: [1, -1, 0, 0, 0, 0],
        phase_offset: 270.0,
        class: Diurnal,
        nodal: NodalKind::O1,
    },
    Constituent {
        name: "M6",
        speed: 86.952_312_7,
        doodson: [6, 0, 0, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 3, k1: 0 },
    },
    Constituent {
        name: "MK3",
        speed: 44.025_172_9,
        doodson: [3, 1, 0, 0, 0, 0],
        phase_offset: 90.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 1, k1: 1 },
    },
    Constituent {
        name: "S4",
        speed: 60.0,
        doodson: [4, 4, -4, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "MN4",
        speed: 57.423_833_7,
        doodson: [4, -1, 0, 1, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 2, k1: 0 },
    },
    Constituent {
        name: "NU2",
        speed: 28.512_583_1,
        doodson: [2, -1, 2, -1, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::M2,
    },
    Constituent {
        name: "S6",
        speed: 90.0,
        doodson: [6, 6, -6, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "MU2",
        speed: 27.968_208_4,
        doodson: [2, -2, 2, 0, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::M2,
    },
    Constituent {
        name: "2N2",
        speed: 27.895_354_8,
        doodson: [2, -2, 0, 2, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::M2,
    },
    Constituent {
        name: "OO1",
        speed: 16.139_101_7,
        doodson: [1, 3, 0, 0, 0, 0],
        phase_offset: 90.0,
        class: Diurnal,
        nodal: NodalKind::Oo1,
    },
    Constituent {
        name: "LAM2",
        speed: 29.455_625_3,
        doodson: [2, 1, -2, 1, 0, 0],
        phase_offset: 180.0,
        class: Semidiurnal,
        nodal: NodalKind::M2,
    },
    Constituent {
        name: "S1",
        speed: 15.0,
        doodson: [1, 1, -1, 0, 0, 0],
        phase_offset: 180.0,
        class: Diurnal,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "M1",
        speed: 14.496_693_9,
        doodson: [1, 0, 0, 1, 0, 0],
        phase_offset: 90.0,
        class: Diurnal,
        nodal: NodalKind::M1,
    },
    Constituent {
        name: "J1",
        speed: 15.585_443_3,
        doodson: [1, 2, 0, -1, 0, 0],
        phase_offset: 90.0,
        class: Diurnal,
        nodal: NodalKind::J1,
    },
    Constituent {
        name: "MM",
        speed: 0.544_374_7,
        doodson: [0, 1, 0, -1, 0, 0],
        phase_offset: 0.0,
        class: LongPeriod,
        nodal: NodalKind::Mm,
    },
    Constituent {
        name: "SSA",
        speed: 0.082_137_3,
        doodson: [0, 0, 2, 0, 0, 0],
        phase_offset: 0.0,
        class: LongPeriod,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "SA",
        speed: 0.041_068_6,
        doodson: [0, 0, 1, 0, 0, 0],
        phase_offset: 0.0,
        class: LongPeriod,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "MSF",
        speed: 1.015_895_8,
        doodson: [0, 2, -2, 0, 0, 0],
        phase_offset: 0.0,
        class: LongPeriod,
        nodal: NodalKind::Compound { m2: -1, k1: 0 },
    },
    Constituent {
        name: "MF",
        speed: 1.098_033_1,
        doodson: [0, 2, 0, 0, 0, 0],
        phase_offset: 0.0,
        class: LongPeriod,
        nodal: NodalKind::Mf,
    },
    Constituent {
        name: "RHO1",
        speed: 13.471_514_5,
        doodson: [1, -2, 2, -1, 0, 0],
        phase_offset: 270.0,
        class: Diurnal,
        nodal: NodalKind::O1,
    },
    Constituent {
        name: "Q1",
        speed: 13.398_660_9,
        doodson: [1, -2, 0, 1, 0, 0],
        phase_offset: 270.0,
        class: Diurnal,
        nodal: NodalKind::O1,
    },
    Constituent {
        name: "T2",
        speed: 29.958_933_3,
        doodson: [2, 2, -3, 0, 0, 1],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "R2",
        speed: 30.041_066_7,
        doodson: [2, 2, -1, 0, 0, -1],
        phase_offset: 180.0,
        class: Semidiurnal,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "2Q1",
        speed: 12.854_286_2,
        doodson: [1, -3, 0, 2, 0, 0],
        phase_offset: 270.0,
        class: Diurnal,
        nodal: NodalKind::O1,
    },
    Constituent {
        name: "P1",
        speed: 14.958_931_4,
        doodson: [1, 1, -2, 0, 0, 0],
        phase_offset: 270.0,
        class: Diurnal,
        nodal: NodalKind::Solar,
    },
    Constituent {
        name: "2SM2",
        speed: 31.015_895_8,
        doodson: [2, 4, -4, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: -1, k1: 0 },
    },
    Constituent {
        name: "M3",
        speed: 43.476_156_3,
        doodson: [3, 0, 0, 0, 0, 0],
        phase_offset: 180.0,
        class: Compound,
        nodal: NodalKind::M3,
    },
    Constituent {
        name: "L2",
        speed: 29.528_478_9,
        doodson: [2, 1, 0, -1, 0, 0],
        phase_offset: 180.0,
        class: Semidiurnal,
        nodal: NodalKind::L2,
    },
    Constituent {
        name: "2MK3",
        speed: 42.927_139_8,
        doodson: [3, -1, 0, 0, 0, 0],
        phase_offset: 270.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 2, k1: -1 },
    },
    Constituent {
        name: "K2",
        speed: 30.082_137_3,
        doodson: [2, 2, 0, 0, 0, 0],
        phase_offset: 0.0,
        class: Semidiurnal,
        nodal: NodalKind::K2,
    },
    Constituent {
        name: "M8",
        speed: 115.936_416_6,
        doodson: [8, 0, 0, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 4, k1: 0 },
    },
    Constituent {
        name: "MS4",
        speed: 58.984_104_2,
        doodson: [4, 2, -2, 0, 0, 0],
        phase_offset: 0.0,
        class: Compound,
        nodal: NodalKind::Compound { m2: 1, k1: 0 },
    },
];

/// All constituents in declared (NOAA) order.
pub fn all() -> &'static [Constituent] {
    &CONSTITUENTS
}

/// Find a constituent by its NOAA name. Case-sensitive; unknown names
/// return `None` (station records referencing them are skipped upstream).
pub fn lookup(name: &str) -> Option<&'static Constituent> {
    lookup_indexed(name).map(|(_, c)| c)
}

/// Like [`lookup`], additionally yielding the position in declared order
/// (used to index the engine's equilibrium-argument table).
pub fn lookup_indexed(name: &str) -> Option<(usize, &'static Constituent)> {
    CONSTITUENTS
        .iter()
        .enumerate()
        .find(|(_, c)| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hourly rates of (τ, s, h, p, N, p₁), from the derivatives of the
    /// Meeus polynomials in `astro.rs`.
    const RATES: [f64; 6] = [
        14.492_052_1,
        0.549_016_5,
        0.041_068_6,
        0.004_641_8,
        -0.002_206_4,
        0.000_002_0,
    ];

    #[test]
    fn catalog_has_37_constituents() {
        assert_eq!(all().len(), 37);
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in CONSTITUENTS.iter().enumerate() {
            for b in &CONSTITUENTS[i + 1..] {
                assert_ne!(a.name, b.name, "duplicate constituent name");
            }
        }
    }

    /// Every tabulated speed must equal the dot product of its Doodson
    /// multipliers with the argument rates. This cross-checks both columns
    /// against each other and against the astronomical polynomials.
    #[test]
    fn speeds_match_doodson_multipliers() {
        for c in all() {
            let derived: f64 = c
                .doodson
                .iter()
                .zip(RATES.iter())
                .map(|(&d, &r)| f64::from(d) * r)
                .sum();
            assert!(
                (derived - c.speed).abs() < 1e-4,
                "{}: Doodson-derived speed {derived} != tabulated {}",
                c.name,
                c.speed
            );
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("M2").is_some());
        assert!(lookup("m2").is_none());
        assert!(lookup("XX9").is_none());
    }

    #[test]
    fn lookup_indexed_matches_declared_order() {
        let (idx, c) = lookup_indexed("K1").unwrap();
        assert_eq!(c.name, "K1");
        assert_eq!(CONSTITUENTS[idx].name, "K1");
    }

    /// Only constituents with an odd τ multiplier may carry a ±90°/180°
    /// noon-epoch correction; even-τ constituents keep 0 or 180 from their
    /// Schureman constants alone.
    #[test]
    fn phase_offsets_are_quadrant_multiples() {
        for c in all() {
            let q = c.phase_offset / 90.0;
            assert!(
                (q - q.round()).abs() < 1e-12 && (0.0..360.0).contains(&c.phase_offset),
                "{}: phase offset {} not a quadrant multiple",
                c.name,
                c.phase_offset
            );
        }
    }

    #[test]
    fn solar_constituents_are_tagged_solar() {
        for name in ["S1", "S2", "S4", "S6", "T2", "R2", "P1", "SA", "SSA"] {
            let c = lookup(name).unwrap();
            assert_eq!(c.nodal, NodalKind::Solar, "{name} should be pure solar");
        }
    }
}
