//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-config.toml file. It provides a centralized way to configure the
//! active station, the station database location, prediction parameters,
//! and display options.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Station selection
    pub station: StationConfig,
    /// Prediction parameters
    pub prediction: PredictionConfig,
    /// Display and UI configuration
    pub display: DisplayConfig,
}

/// Tide station configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct StationConfig {
    /// NOAA station ID (e.g., "9414290" for San Francisco)
    pub id: String,
    /// Human-readable station name for reference
    pub name: String,
    /// Path to the bundled station database (stations.json). When the file
    /// is missing the built-in fallback constants are used instead.
    pub database_path: String,
    /// MLLW to Mean Sea Level offset in feet for user-friendly display
    pub msl_offset: f64,
    /// Whether to show heights relative to MSL (true) or MLLW (false)
    /// Default false shows traditional MLLW tide chart values (0-9+ feet)
    pub show_msl: bool,
}

/// Prediction engine configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct PredictionConfig {
    /// Rolling extrema-cache window in days
    pub cache_window_days: i64,
    /// Sampling step for the rendered curve, minutes
    pub curve_step_minutes: i64,
}

/// Display and visualization configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Time window in hours (shows -window to +window from current time)
    pub time_window_hours: i64,
    /// ASCII chart height in rows
    pub chart_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                id: "9414290".to_string(),
                name: "San Francisco, CA".to_string(),
                database_path: "stations.json".to_string(),
                msl_offset: 3.19,
                show_msl: false, // Default to traditional MLLW display
            },
            prediction: PredictionConfig {
                cache_window_days: 7,
                curve_step_minutes: 10,
            },
            display: DisplayConfig {
                time_window_hours: 12,
                chart_rows: 24,
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("tide-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Invalid config file format: {}", e);
                    eprintln!("Using default configuration (San Francisco, CA)");
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Info: No config file found, using default configuration (San Francisco, CA)");
                Self::default()
            }
        }
    }

    /// Save current configuration to tide-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("tide-config.toml", contents)?;
        println!("Configuration saved to tide-config.toml");
        Ok(())
    }
}
