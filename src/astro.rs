//! Astronomical arguments & nodal corrections (Schureman SP98)
//!
//! Pure functions mapping a UTC instant to the fundamental astronomical
//! arguments (τ, s, h, p, N, p₁), the lunar orbital parameters
//! (I, ν, ξ, ν′, ν″, P), and per-constituent equilibrium arguments V,
//! node factors f, and nodal phases u.
//!
//! Accuracy: the Meeus mean-element polynomials hold the arguments to a few
//! arc-seconds across ±1 century of J2000, far below the 0.01 ft level that
//! matters for tide prediction.  References: Meeus, *Astronomical
//! Algorithms* (2nd ed.), ch. 25 & 47; Schureman SP98 eqs. 73–234.
//!
//! Everything here is deterministic and infallible: unknown constituents
//! cannot reach these functions because callers resolve names through
//! [`crate::constituents::lookup`] first.

use chrono::{DateTime, Utc};

use crate::constituents::{Constituent, NodalKind};

/// J2000 epoch (2000-01-01 12:00:00 UTC) as a Unix timestamp.
const J2000_UNIX_SECONDS: f64 = 946_728_000.0;

/// Days per Julian century.
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Fundamental astronomical arguments at an instant, in degrees.
///
/// `tau` is mean lunar time and is deliberately **not** reduced modulo 360:
/// the harmonic sum multiplies it by integer Doodson coefficients, and
/// reducing it first would introduce visible hops in the height curve at
/// day boundaries. The slow arguments are normalized to [0, 360).
#[derive(Clone, Copy, Debug)]
pub struct AstronomicalArguments {
    /// Mean lunar time, unbounded.
    pub tau: f64,
    /// Mean longitude of the Moon.
    pub s: f64,
    /// Mean longitude of the Sun.
    pub h: f64,
    /// Mean longitude of the lunar perigee.
    pub p: f64,
    /// Mean longitude of the Moon's ascending node.
    pub n: f64,
    /// Mean longitude of the solar perigee.
    pub p1: f64,
}

/// Schureman's lunar orbital parameters at an instant, in degrees.
#[derive(Clone, Copy, Debug)]
pub struct OrbitalParameters {
    /// Obliquity of the lunar orbit to the equator.
    pub i: f64,
    /// Right-ascension offset ν.
    pub nu: f64,
    /// Longitude offset ξ.
    pub xi: f64,
    /// ν′, used by K1.
    pub nu_prime: f64,
    /// ν″, used by K2.
    pub nu_second: f64,
    /// P = p − ξ, used by M1 and L2.
    pub p_cap: f64,
}

#[inline]
fn rad(deg: f64) -> f64 {
    deg.to_radians()
}

#[inline]
fn deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Reduce an angle to [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

/// Julian centuries since J2000 for a UTC instant, with sub-second
/// resolution. Time differences are carried in double precision throughout;
/// integer-second truncation would drift the fast arguments.
fn julian_centuries(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9;
    (seconds - J2000_UNIX_SECONDS) / (86_400.0 * DAYS_PER_CENTURY)
}

/// Fractional UTC hour of day in [0, 24).
fn hours_of_day(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9;
    seconds.rem_euclid(86_400.0) / 3600.0
}

/// Compute the fundamental astronomical arguments at `t`.
pub fn arguments(t: DateTime<Utc>) -> AstronomicalArguments {
    let tc = julian_centuries(t);

    // ---------- 1. Meeus mean-element polynomials (degrees) ----------
    let s = 218.316_447_7
        + 481_267.881_234_21 * tc
        + (-0.001_578_6 + tc * (1.0 / 538_841.0 - tc / 65_194_000.0)) * tc * tc;
    let h = 280.466_46 + 36_000.769_83 * tc + 0.000_303_2 * tc * tc;
    let p = 83.353_246_5
        + 4_069.013_728_7 * tc
        + (-0.010_320_0 + tc * (-1.0 / 80_053.0 + tc / 18_999_000.0)) * tc * tc;
    let n = 125.044_52 - 1_934.136_261 * tc + (0.002_070_8 + tc / 450_000.0) * tc * tc;
    let p1 = 282.937_681_93 + 1.719_526_9 * tc + 0.000_459_62 * tc * tc;

    let s = normalize_degrees(s);
    let h = normalize_degrees(h);

    // ---------- 2. Mean lunar time, midnight epoch, left unbounded ----------
    let tau = 15.0 * hours_of_day(t) + h - s;

    AstronomicalArguments {
        tau,
        s,
        h,
        p: normalize_degrees(p),
        n: normalize_degrees(n),
        p1: normalize_degrees(p1),
    }
}

/// Equilibrium argument V of a constituent at `t`, degrees in [0, 360).
///
/// `V = d₁τ + d₂s + d₃h + d₄p + d₅N + d₆p₁ + c`, with the τ contribution
/// taken from the unbounded τ and the modulo reduction applied only to the
/// final value.
pub fn equilibrium_argument(constituent: &Constituent, t: DateTime<Utc>) -> f64 {
    let a = arguments(t);
    let x = [a.tau, a.s, a.h, a.p, a.n, a.p1];
    let v: f64 = constituent
        .doodson
        .iter()
        .zip(x.iter())
        .map(|(&d, &arg)| f64::from(d) * arg)
        .sum();
    normalize_degrees(v + constituent.phase_offset)
}

impl OrbitalParameters {
    /// Derive the orbital parameters from the fundamental arguments
    /// (Schureman eqs. 191–232). Intermediate trigonometry in radians,
    /// results in degrees.
    pub fn from_arguments(a: &AstronomicalArguments) -> Self {
        let n = rad(a.n);

        // Obliquity of the lunar orbit to the Earth's equator.
        let i = (0.913_694_9 - 0.035_692_6 * n.cos()).acos();

        // ν: right ascension of the intersection, ξ: its longitude.
        let nu = (0.089_705_6 * n.sin() / i.sin()).asin();
        let xi = n - 2.0 * (0.644_12 * (n / 2.0).tan()).atan() - nu;

        // ν′ and ν″ enter K1 and K2 only. Both denominators are strictly
        // positive over the 18.6-year nodal cycle, so the principal arctan
        // branch is the correct one.
        let nu_prime = (nu.sin() / (nu.cos() + 0.334_766 / (2.0 * i).sin())).atan();
        let nu_second =
            0.5 * ((2.0 * nu).sin() / ((2.0 * nu).cos() + 0.072_618_4 / (i.sin() * i.sin()))).atan();

        let xi_deg = deg(xi);

        OrbitalParameters {
            i: deg(i),
            nu: deg(nu),
            xi: xi_deg,
            nu_prime: deg(nu_prime),
            nu_second: deg(nu_second),
            p_cap: a.p - xi_deg,
        }
    }
}

/// Orbital parameters at `t`.
pub fn orbital_parameters(t: DateTime<Utc>) -> OrbitalParameters {
    OrbitalParameters::from_arguments(&arguments(t))
}

/// Node factor f and nodal phase u evaluated once per instant and shared
/// across all constituents of a harmonic sum.
///
/// The height hot path evaluates f and u for every station constituent at
/// every sample; constructing this once per instant keeps the per-
/// constituent cost to a match plus a few trig calls, with no allocation.
#[derive(Clone, Copy, Debug)]
pub struct NodalCorrections {
    orbit: OrbitalParameters,
}

impl NodalCorrections {
    /// Compute the corrections for an instant.
    pub fn at(t: DateTime<Utc>) -> Self {
        NodalCorrections {
            orbit: orbital_parameters(t),
        }
    }

    /// Build from precomputed arguments (saves re-deriving them when the
    /// caller already has them in hand).
    pub fn from_arguments(a: &AstronomicalArguments) -> Self {
        NodalCorrections {
            orbit: OrbitalParameters::from_arguments(a),
        }
    }

    /// The underlying orbital parameters.
    pub fn orbit(&self) -> &OrbitalParameters {
        &self.orbit
    }

    // ---------- component factors shared by the compound arms ----------

    fn f_m2(&self) -> f64 {
        let half_i = rad(self.orbit.i) / 2.0;
        half_i.cos().powi(4) / 0.915_44
    }

    fn u_m2(&self) -> f64 {
        2.0 * (self.orbit.xi - self.orbit.nu)
    }

    fn f_o1(&self) -> f64 {
        let i = rad(self.orbit.i);
        i.sin() * (i / 2.0).cos().powi(2) / 0.376_89
    }

    fn f_k1(&self) -> f64 {
        let i = rad(self.orbit.i);
        let nu = rad(self.orbit.nu);
        (0.896_5 * (2.0 * i).sin().powi(2) + 0.600_1 * (2.0 * i).sin() * nu.cos() + 0.100_6)
            .sqrt()
    }

    fn u_k1(&self) -> f64 {
        -self.orbit.nu_prime
    }

    /// Node factor f of a constituent (dimensionless, ~0.8–1.2).
    pub fn node_factor(&self, constituent: &Constituent) -> f64 {
        let i = rad(self.orbit.i);
        match constituent.nodal {
            NodalKind::Solar => 1.0,
            NodalKind::M2 => self.f_m2(),
            NodalKind::O1 => self.f_o1(),
            NodalKind::K1 => self.f_k1(),
            NodalKind::K2 => {
                let nu = rad(self.orbit.nu);
                (19.044_4 * i.sin().powi(4)
                    + 2.770_2 * i.sin().powi(2) * (2.0 * nu).cos()
                    + 0.098_1)
                    .sqrt()
            }
            NodalKind::J1 => (2.0 * i).sin() / 0.721_4,
            NodalKind::M1 => {
                let two_p = 2.0 * rad(self.orbit.p_cap);
                self.f_o1() * (2.310 + 1.435 * two_p.cos()).sqrt()
            }
            NodalKind::L2 => {
                let half_i = i / 2.0;
                let two_p = 2.0 * rad(self.orbit.p_cap);
                let tan2 = half_i.tan().powi(2);
                let inv_ra = (1.0 - 12.0 * tan2 * two_p.cos() + 36.0 * tan2 * tan2).sqrt();
                self.f_m2() * inv_ra
            }
            NodalKind::Mm => (2.0 / 3.0 - i.sin().powi(2)) / 0.502_1,
            NodalKind::Mf => i.sin().powi(2) / 0.157_8,
            NodalKind::Oo1 => i.sin() * (i / 2.0).sin().powi(2) / 0.016_40,
            NodalKind::M3 => self.f_m2().powf(1.5),
            NodalKind::Compound { m2, k1 } => {
                self.f_m2().powi(i32::from(m2.unsigned_abs()))
                    * self.f_k1().powi(i32::from(k1.unsigned_abs()))
            }
        }
    }

    /// Nodal phase u of a constituent, degrees.
    pub fn nodal_phase(&self, constituent: &Constituent) -> f64 {
        let o = &self.orbit;
        match constituent.nodal {
            NodalKind::Solar => 0.0,
            NodalKind::M2 => self.u_m2(),
            NodalKind::O1 => 2.0 * o.xi - o.nu,
            NodalKind::K1 => self.u_k1(),
            NodalKind::K2 => -2.0 * o.nu_second,
            NodalKind::J1 => -o.nu,
            NodalKind::M1 => {
                let i = rad(o.i);
                let q = ((5.0 * i.cos() - 1.0) / (7.0 * i.cos() + 1.0) * rad(o.p_cap).tan())
                    .atan();
                o.xi - o.nu + deg(q)
            }
            NodalKind::L2 => {
                let half_i = rad(o.i) / 2.0;
                let two_p = 2.0 * rad(o.p_cap);
                let cot2 = 1.0 / half_i.tan().powi(2);
                let r = (two_p.sin() / (cot2 / 6.0 - two_p.cos())).atan();
                2.0 * o.xi - 2.0 * o.nu - deg(r)
            }
            NodalKind::Mm => 0.0,
            NodalKind::Mf => -2.0 * o.xi,
            NodalKind::Oo1 => -2.0 * o.xi - o.nu,
            NodalKind::M3 => 3.0 * (o.xi - o.nu),
            NodalKind::Compound { m2, k1 } => {
                f64::from(m2) * self.u_m2() + f64::from(k1) * self.u_k1()
            }
        }
    }
}

/// Node factor of a constituent at `t`. Convenience wrapper; hot paths use
/// [`NodalCorrections`] to share the orbital parameters across a sum.
pub fn node_factor(constituent: &Constituent, t: DateTime<Utc>) -> f64 {
    NodalCorrections::at(t).node_factor(constituent)
}

/// Nodal phase of a constituent at `t`, degrees.
pub fn nodal_phase(constituent: &Constituent, t: DateTime<Utc>) -> f64 {
    NodalCorrections::at(t).nodal_phase(constituent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constituents::lookup;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    /// At the J2000 epoch the polynomials collapse to their constant terms.
    #[test]
    fn fundamental_arguments_at_j2000() {
        let a = arguments(utc(2000, 1, 1, 12, 0, 0));
        assert!((a.s - 218.316_447_7).abs() < 1e-6, "s = {}", a.s);
        assert!((a.h - 280.466_46).abs() < 1e-6, "h = {}", a.h);
        assert!((a.p - 83.353_246_5).abs() < 1e-6, "p = {}", a.p);
        assert!((a.n - 125.044_52).abs() < 1e-6, "N = {}", a.n);
        assert!((a.p1 - 282.937_681_93).abs() < 1e-6, "p1 = {}", a.p1);
        // τ = 15·12 + h − s at noon
        assert!((a.tau - 242.150_012_3).abs() < 1e-6, "tau = {}", a.tau);
    }

    #[test]
    fn slow_arguments_are_normalized() {
        for &t in &[
            utc(1983, 1, 1, 0, 0, 0),
            utc(2026, 2, 12, 6, 30, 0),
            utc(2031, 12, 31, 23, 59, 59),
        ] {
            let a = arguments(t);
            for (name, v) in [("s", a.s), ("h", a.h), ("p", a.p), ("N", a.n), ("p1", a.p1)] {
                assert!((0.0..360.0).contains(&v), "{name} = {v} at {t}");
            }
        }
    }

    /// The equilibrium argument of every constituent must advance smoothly
    /// across a midnight boundary: one minute of elapsed time moves V by
    /// ω/60 degrees, nothing more.
    #[test]
    fn equilibrium_argument_is_continuous_across_midnight() {
        let before = utc(2025, 12, 31, 23, 59, 30);
        let after = utc(2026, 1, 1, 0, 0, 30);
        for c in crate::constituents::all() {
            let v0 = equilibrium_argument(c, before);
            let v1 = equilibrium_argument(c, after);
            let expected = c.speed / 60.0; // one minute of advance
            let mut delta = (v1 - v0).rem_euclid(360.0);
            if delta > 180.0 {
                delta -= 360.0;
            }
            assert!(
                (delta - expected).abs() < 1e-3,
                "{}: V jumped by {delta}° across midnight (expected {expected}°)",
                c.name
            );
        }
    }

    #[test]
    fn node_factors_are_near_unity() {
        // Spot instants spread over half a nodal cycle.
        for &t in &[
            utc(2015, 6, 1, 0, 0, 0),
            utc(2020, 3, 15, 12, 0, 0),
            utc(2026, 2, 12, 0, 0, 0),
        ] {
            let nc = NodalCorrections::at(t);
            for c in crate::constituents::all() {
                let f = nc.node_factor(c);
                assert!(
                    (0.5..=2.0).contains(&f),
                    "{}: node factor {f} out of range at {t}",
                    c.name
                );
            }
        }
    }

    #[test]
    fn solar_constituents_have_trivial_corrections() {
        let nc = NodalCorrections::at(utc(2026, 2, 12, 0, 0, 0));
        for name in ["S2", "S1", "S4", "S6", "T2", "R2", "P1", "SA", "SSA"] {
            let c = lookup(name).unwrap();
            assert_eq!(nc.node_factor(c), 1.0, "{name} f");
            assert_eq!(nc.nodal_phase(c), 0.0, "{name} u");
        }
    }

    /// Compound corrections must factor exactly as products/sums of their
    /// component corrections.
    #[test]
    fn compound_corrections_factor_from_components() {
        let nc = NodalCorrections::at(utc(2024, 7, 4, 18, 0, 0));
        let f_m2 = nc.node_factor(lookup("M2").unwrap());
        let f_k1 = nc.node_factor(lookup("K1").unwrap());
        let u_m2 = nc.nodal_phase(lookup("M2").unwrap());
        let u_k1 = nc.nodal_phase(lookup("K1").unwrap());

        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

        assert!(close(nc.node_factor(lookup("M4").unwrap()), f_m2 * f_m2));
        assert!(close(nc.node_factor(lookup("M6").unwrap()), f_m2.powi(3)));
        assert!(close(nc.node_factor(lookup("M8").unwrap()), f_m2.powi(4)));
        assert!(close(nc.node_factor(lookup("MS4").unwrap()), f_m2));
        assert!(close(nc.node_factor(lookup("MK3").unwrap()), f_m2 * f_k1));
        assert!(close(
            nc.node_factor(lookup("2MK3").unwrap()),
            f_m2 * f_m2 * f_k1
        ));

        assert!(close(nc.nodal_phase(lookup("M4").unwrap()), 2.0 * u_m2));
        assert!(close(nc.nodal_phase(lookup("MK3").unwrap()), u_m2 + u_k1));
        assert!(close(nc.nodal_phase(lookup("2SM2").unwrap()), -u_m2));
        assert!(close(
            nc.nodal_phase(lookup("2MK3").unwrap()),
            2.0 * u_m2 - u_k1
        ));
    }

    /// The lunar inclination I stays inside its theoretical envelope
    /// (≈18.3°–28.6°) over the nodal cycle.
    #[test]
    fn lunar_inclination_envelope() {
        for year in 2010..2030 {
            let o = orbital_parameters(utc(year, 6, 15, 0, 0, 0));
            assert!(
                (18.0..=29.0).contains(&o.i),
                "I = {} out of envelope in {year}",
                o.i
            );
        }
    }
}
