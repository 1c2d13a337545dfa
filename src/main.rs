//! # Tide Predictor Application Entry Point
//!
//! This binary wraps the prediction library in a small terminal front end,
//! the same development-mode view the project has always had: load the
//! configuration, open the station database (or fall back to the built-in
//! constants), and print current conditions, the upcoming highs and lows,
//! and an ASCII tide curve.
//!
//! ## Application Flow
//!
//! 1. **Parse command line**: optional station id override and `--table`
//! 2. **Load constants**: station database from config, built-in fallback
//!    when the file is missing
//! 3. **Predict**: current height/rate/direction, next high and low from
//!    the 7-day extrema cache, sampled curve around "now"
//! 4. **Render**: ASCII chart plus a tide table for the cached window
//!
//! ## Error Handling
//!
//! Configuration and database problems fall back with a notice on stderr;
//! an unknown station id is a hard error surfaced through `anyhow` for the
//! systemd journal.

use std::env;

use chrono::{Duration, Utc};
use tide_predictor_lib::cache::ExtremaCache;
use tide_predictor_lib::config::Config;
use tide_predictor_lib::fallback;
use tide_predictor_lib::harmonics::TideEngine;
use tide_predictor_lib::renderer;
use tide_predictor_lib::station::StationCatalog;
use tide_predictor_lib::TideDirection;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let show_table = args.iter().any(|a| a == "--table");
    let station_override = args.iter().find(|a| !a.starts_with("--")).cloned();

    let config = Config::load();
    let station_id = station_override.unwrap_or_else(|| config.station.id.clone());

    // Station constants: bundled database if present, built-in fallback
    // otherwise. The fallback is a real constant set, so predictions stay
    // exact either way.
    let catalog = match StationCatalog::load_from_path(&config.station.database_path) {
        Ok(catalog) => catalog,
        Err(error) => {
            eprintln!(
                "Station database unavailable ({}): using built-in constants",
                error
            );
            fallback::builtin_catalog()
        }
    };

    let cache = ExtremaCache::with_window_days(
        TideEngine::new(catalog),
        config.prediction.cache_window_days,
    );

    let now = Utc::now();

    // Current conditions.
    let current = cache.engine().tide_height(&station_id, now)?;
    let direction = match current.direction {
        TideDirection::Rising => "rising",
        TideDirection::Falling => "falling",
        TideDirection::Slack => "slack",
    };
    println!(
        "{}  {:.2} ft, {} ({:+.2} ft/h)",
        station_id, current.height, direction, current.rate
    );

    // Next events from the cache.
    if let Some(high) = cache.next_high(&station_id, now)? {
        println!(
            "Next high: {}  {:.2} ft",
            high.time.format("%Y-%m-%d %H:%MZ"),
            high.height
        );
    }
    if let Some(low) = cache.next_low(&station_id, now)? {
        println!(
            "Next low:  {}  {:.2} ft",
            low.time.format("%Y-%m-%d %H:%MZ"),
            low.height
        );
    }
    println!();

    // Curve around now.
    let window = Duration::hours(config.display.time_window_hours);
    let samples = cache.engine().curve(
        &station_id,
        now - window,
        now + window,
        config.prediction.curve_step_minutes,
    )?;
    let events = cache.in_range(&station_id, now - window, now + window)?;
    renderer::draw_ascii(&samples, &events, now, &config);

    // Full cached tide table on request.
    if show_table {
        println!();
        for extremum in cache.all_extrema(&station_id)? {
            println!(
                "{}  {}  {:.2} ft",
                extremum.time.format("%Y-%m-%d %H:%MZ"),
                if extremum.is_high() { "HIGH" } else { "LOW " },
                extremum.height
            );
        }
    }

    Ok(())
}
