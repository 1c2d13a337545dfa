//! # Tide Curve Rendering
//!
//! This module renders a sampled tide curve to ASCII terminal output. The
//! e-ink pipeline that used to live alongside it moved to the firmware
//! repository together with the display drivers; the terminal chart remains
//! the development-mode view of the prediction engine.
//!
//! The chart is sized from the curve *and* the cached extrema together: a
//! refined high or low is the quantity the user actually reads off the
//! display, so it must never be clipped even when it falls between two
//! samples and pokes past the sampled envelope. Axis labels are placed at
//! round heights, either relative to the station datum or, when
//! `show_msl` is set, as signed departures from mean sea level.

use chrono::{DateTime, Timelike, Utc};

use crate::config::Config;
use crate::{ExtremumType, TideExtremum, TideHeight};

/// Width reserved for axis labels, including the axis line.
const Y_AXIS_WIDTH: usize = 6;

/// Offset subtracted from raw heights when labeling the axis: zero for
/// datum-relative display, the configured MSL offset otherwise.
fn label_offset(config: &Config) -> f64 {
    if config.station.show_msl {
        config.station.msl_offset
    } else {
        0.0
    }
}

/// Vertical extent of the chart: the sampled curve together with every
/// overlaid extremum, padded so the curve never touches the frame.
fn chart_bounds(samples: &[TideHeight], extrema: &[TideExtremum]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for sample in samples {
        lo = lo.min(sample.height);
        hi = hi.max(sample.height);
    }
    for extremum in extrema {
        lo = lo.min(extremum.height);
        hi = hi.max(extremum.height);
    }
    let pad = ((hi - lo) * 0.05).max(0.05);
    (lo - pad, hi + pad)
}

/// Label cadence for a given vertical span: the smallest half-foot
/// multiple that keeps the axis down to a handful of labels.
fn label_step(span: f64) -> f64 {
    for step in [0.5, 1.0, 2.0, 5.0, 10.0] {
        if span / step <= 8.0 {
            return step;
        }
    }
    20.0
}

/// One axis label: signed single-decimal feet about MSL, unsigned about
/// the datum.
fn axis_label(value: f64, signed: bool) -> String {
    if signed {
        format!("{:+.1}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Write `text` into a character row starting at `start`, clipping at the
/// row's end.
fn place(row: &mut [char], start: usize, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        if start + i < row.len() {
            row[start + i] = ch;
        }
    }
}

/// Render a sampled curve with extrema annotations to a string.
///
/// Layout: a `chart_rows`-tall grid with axis labels on the left, one
/// column per sample, `H`/`L` marking the cached extrema, `X` marking the
/// sample closest to `now`, and a ruler tick at every hour boundary.
pub fn render_ascii(
    samples: &[TideHeight],
    extrema: &[TideExtremum],
    now: DateTime<Utc>,
    config: &Config,
) -> String {
    if samples.len() < 2 {
        return String::from("(not enough samples to draw)\n");
    }

    let rows = config.display.chart_rows.max(8);
    let sample_count = samples.len();

    // Only extrema inside the sampled window take part in layout.
    let first_time = samples[0].time;
    let last_time = samples[sample_count - 1].time;
    let visible: Vec<TideExtremum> = extrema
        .iter()
        .filter(|e| e.time >= first_time && e.time <= last_time)
        .copied()
        .collect();

    let (lo, hi) = chart_bounds(samples, &visible);
    let span = hi - lo;

    let height_to_row = |height: f64| {
        let normalized = (height - lo) / span;
        ((1.0 - normalized) * (rows as f64 - 1.0))
            .round()
            .clamp(0.0, rows as f64 - 1.0) as usize
    };

    let mut grid = vec![vec![' '; sample_count + Y_AXIS_WIDTH]; rows];

    // Axis labels at round multiples of the step, in the configured frame.
    let offset = label_offset(config);
    let signed = config.station.show_msl;
    let step = label_step(span);
    let mut level = ((lo - offset) / step).ceil() * step;
    while level + offset <= hi {
        let row = height_to_row(level + offset);
        let label = axis_label(level, signed);
        place(&mut grid[row][..Y_AXIS_WIDTH - 1], 0, &label);
        grid[row][Y_AXIS_WIDTH - 1] = '|';
        level += step;
    }

    // Column of the sample nearest an instant.
    let column_of = |t: DateTime<Utc>| {
        samples
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| (s.time - t).num_seconds().abs())
            .map(|(i, _)| i)
            .unwrap_or(0)
    };

    // Plot the curve.
    let now_column = column_of(now);
    for (column, sample) in samples.iter().enumerate() {
        let row = height_to_row(sample.height);
        grid[row][column + Y_AXIS_WIDTH] = if column == now_column { 'X' } else { '.' };
    }

    // Overlay extrema markers (drawn after the curve so they win the cell).
    for extremum in &visible {
        let column = column_of(extremum.time);
        let row = height_to_row(extremum.height);
        grid[row][column + Y_AXIS_WIDTH] = match extremum.kind {
            ExtremumType::High => 'H',
            ExtremumType::Low => 'L',
        };
    }

    let mut out = String::new();
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    // Ruler: a tick wherever the curve crosses an hour boundary.
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let ruler: String = samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i > 0 && s.time.hour() != samples[i - 1].time.hour() {
                '|'
            } else {
                ' '
            }
        })
        .collect();
    out.push_str(&format!("{}{}\n", padding, ruler));

    // Window labels, with "Now" under the X column.
    let window = config.display.time_window_hours;
    let mut labels = vec![' '; sample_count];
    let right_label = format!("+{}h", window);
    place(&mut labels, 0, &format!("-{}h", window));
    place(&mut labels, now_column.saturating_sub(1), "Now");
    place(
        &mut labels,
        sample_count.saturating_sub(right_label.len()),
        &right_label,
    );
    out.push_str(&format!(
        "{}{}\n",
        padding,
        labels.into_iter().collect::<String>().trim_end()
    ));

    out
}

/// Render tide data to ASCII terminal.
pub fn draw_ascii(
    samples: &[TideHeight],
    extrema: &[TideExtremum],
    now: DateTime<Utc>,
    config: &Config,
) {
    print!("{}", render_ascii(samples, extrema, now, config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideDirection;
    use chrono::{Duration, TimeZone};

    fn sample_at(minutes: i64, height: f64) -> TideHeight {
        let base = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        TideHeight {
            time: base + Duration::minutes(minutes),
            height,
            rate: 0.0,
            direction: TideDirection::Slack,
        }
    }

    fn test_samples() -> Vec<TideHeight> {
        vec![
            sample_at(0, 1.0),
            sample_at(10, 2.0),
            sample_at(20, 3.0),
            sample_at(30, 2.0),
            sample_at(40, 1.0),
        ]
    }

    #[test]
    fn test_chart_contains_curve_and_now_marker() {
        let samples = test_samples();
        let now = samples[2].time;
        let out = render_ascii(&samples, &[], now, &Config::default());
        assert!(out.contains('X'), "now marker missing:\n{out}");
        assert!(out.contains('.'), "curve points missing:\n{out}");
        assert!(out.contains("Now"), "time label missing:\n{out}");
    }

    #[test]
    fn test_extrema_markers_overlay_curve() {
        let samples = test_samples();
        let high = TideExtremum {
            time: samples[2].time,
            height: 3.0,
            kind: ExtremumType::High,
        };
        let out = render_ascii(&samples, &[high], samples[0].time, &Config::default());
        assert!(out.contains('H'), "high marker missing:\n{out}");
    }

    #[test]
    fn test_out_of_window_extrema_are_skipped() {
        let samples = test_samples();
        let stray = TideExtremum {
            time: samples[4].time + Duration::hours(5),
            height: 3.0,
            kind: ExtremumType::Low,
        };
        let out = render_ascii(&samples, &[stray], samples[0].time, &Config::default());
        assert!(!out.contains('L'), "stray extremum should be skipped:\n{out}");
    }

    #[test]
    fn test_bounds_cover_extrema_between_samples() {
        let samples = test_samples();
        // A refined high sitting above every sample must widen the chart.
        let peak = TideExtremum {
            time: samples[2].time + Duration::minutes(5),
            height: 3.4,
            kind: ExtremumType::High,
        };
        let (lo, hi) = chart_bounds(&samples, &[peak]);
        assert!(hi > 3.4, "upper bound {hi} must cover the refined high");
        assert!(lo < 1.0, "lower bound {lo} must pad below the curve");
    }

    #[test]
    fn test_axis_label_modes() {
        // Datum-relative labels are plain, MSL labels carry their sign.
        assert_eq!(axis_label(2.0, false), "2.0");
        assert_eq!(axis_label(2.0, true), "+2.0");
        assert_eq!(axis_label(-1.5, true), "-1.5");
        assert_eq!(axis_label(0.0, true), "+0.0");
    }

    #[test]
    fn test_label_step_scales_with_span() {
        assert_eq!(label_step(1.0), 0.5);
        assert_eq!(label_step(6.0), 1.0);
        assert_eq!(label_step(30.0), 5.0);
    }

    #[test]
    fn test_msl_mode_shows_signed_labels() {
        let mut config = Config::default();
        config.station.show_msl = true;
        config.station.msl_offset = 2.0;
        let samples = test_samples(); // raw heights 1.0..=3.0 → -1.0..=+1.0 MSL
        let out = render_ascii(&samples, &[], samples[0].time, &config);
        assert!(
            out.contains("-1.0") && out.contains("+0.0"),
            "MSL labels should be signed departures from mean sea level:\n{out}"
        );
    }

    #[test]
    fn test_degenerate_input() {
        let out = render_ascii(&[], &[], Utc::now(), &Config::default());
        assert!(out.contains("not enough samples"));
    }
}
