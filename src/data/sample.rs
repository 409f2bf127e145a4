//! Synthetic storm-events sample generation.
//!
//! Writes a CSV in the same layout `io::ingest` reads, so `stormcast sample`
//! followed by `stormcast train` exercises the whole pipeline without real
//! NOAA exports. Each event type has a profile (season, region, movement,
//! severity scales); rows are drawn from the profile with seeded randomness,
//! and a slice of fields is deliberately left missing or zero so the
//! missing-is-not-zero paths get real traffic.

use std::fs::File;
use std::io::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};

use crate::domain::{days_in_month, SampleConfig, TIMESTAMP_FORMAT};
use crate::error::AppError;
use crate::math::geo::destination_point;

/// Fraction of rows written with no coordinates at all.
const NO_TRACK_FRACTION: f64 = 0.12;
/// Additional fraction written with begin coordinates only.
const BEGIN_ONLY_FRACTION: f64 = 0.06;
/// Fraction of rows with an empty event-type cell.
const UNLABELED_FRACTION: f64 = 0.02;
/// Fraction of rows whose magnitude cell is left empty.
const NO_MAGNITUDE_FRACTION: f64 = 0.10;
/// Fraction of rows collapsed to a same-instant event.
const INSTANT_FRACTION: f64 = 0.04;

const CSV_COLUMNS: [&str; 16] = [
    "BEGIN_DATE_TIME",
    "END_DATE_TIME",
    "EVENT_TYPE",
    "BEGIN_LAT",
    "BEGIN_LON",
    "END_LAT",
    "END_LON",
    "MAGNITUDE",
    "DAMAGE_PROPERTY",
    "DAMAGE_CROPS",
    "INJURIES_DIRECT",
    "INJURIES_INDIRECT",
    "DEATHS_DIRECT",
    "DEATHS_INDIRECT",
    "STATE",
    "CZ_NAME",
];

/// Season, region and severity parameters for one synthetic event type.
struct EventProfile {
    name: &'static str,
    /// Relative prevalence among generated rows.
    weight: f64,
    /// Seasonal center as a fractional month; samples wrap around December.
    peak_month: f64,
    month_spread: f64,
    peak_hour: f64,
    hour_spread: f64,
    lat_center: f64,
    lat_spread: f64,
    lon_center: f64,
    lon_spread: f64,
    /// Mean/sd of the magnitude column (hail inches, wind knots, ...).
    magnitude: (f64, f64),
    /// Median property / crop damage in dollars (log-normal around these).
    property_scale: f64,
    crop_scale: f64,
    /// Poisson rates for casualty counts.
    injury_rate: f64,
    death_rate: f64,
    /// Typical track length in km and duration in minutes.
    track_km: f64,
    duration_minutes: f64,
    states: &'static [&'static str],
}

static PROFILES: [EventProfile; 5] = [
    EventProfile {
        name: "Tornado",
        weight: 0.18,
        peak_month: 4.5,
        month_spread: 1.5,
        peak_hour: 16.0,
        hour_spread: 3.0,
        lat_center: 35.0,
        lat_spread: 3.0,
        lon_center: -92.0,
        lon_spread: 5.0,
        magnitude: (1.2, 0.8),
        property_scale: 2.0e5,
        crop_scale: 1.5e4,
        injury_rate: 0.8,
        death_rate: 0.05,
        track_km: 15.0,
        duration_minutes: 20.0,
        states: &["ALABAMA", "MISSISSIPPI", "TENNESSEE", "OKLAHOMA"],
    },
    EventProfile {
        name: "Hail",
        weight: 0.30,
        peak_month: 5.5,
        month_spread: 1.5,
        peak_hour: 15.0,
        hour_spread: 3.0,
        lat_center: 39.0,
        lat_spread: 4.0,
        lon_center: -98.0,
        lon_spread: 6.0,
        magnitude: (1.25, 0.5),
        property_scale: 2.0e4,
        crop_scale: 3.0e4,
        injury_rate: 0.05,
        death_rate: 0.005,
        track_km: 5.0,
        duration_minutes: 15.0,
        states: &["KANSAS", "NEBRASKA", "TEXAS", "COLORADO"],
    },
    EventProfile {
        name: "Thunderstorm Wind",
        weight: 0.30,
        peak_month: 6.5,
        month_spread: 2.0,
        peak_hour: 17.0,
        hour_spread: 3.5,
        lat_center: 38.0,
        lat_spread: 5.0,
        lon_center: -90.0,
        lon_spread: 8.0,
        magnitude: (55.0, 10.0),
        property_scale: 1.5e4,
        crop_scale: 8.0e3,
        injury_rate: 0.08,
        death_rate: 0.008,
        track_km: 8.0,
        duration_minutes: 10.0,
        states: &["MISSOURI", "ILLINOIS", "KENTUCKY", "OHIO"],
    },
    EventProfile {
        name: "Flash Flood",
        weight: 0.12,
        peak_month: 7.0,
        month_spread: 2.0,
        peak_hour: 18.0,
        hour_spread: 5.0,
        lat_center: 33.0,
        lat_spread: 4.0,
        lon_center: -95.0,
        lon_spread: 8.0,
        magnitude: (1.0, 0.5),
        property_scale: 5.0e4,
        crop_scale: 4.0e4,
        injury_rate: 0.1,
        death_rate: 0.02,
        track_km: 3.0,
        duration_minutes: 150.0,
        states: &["TEXAS", "LOUISIANA", "ARKANSAS", "ARIZONA"],
    },
    EventProfile {
        name: "Winter Storm",
        weight: 0.10,
        // Fractional peak just before January so samples span Dec-Feb.
        peak_month: 0.8,
        month_spread: 1.4,
        peak_hour: 10.0,
        hour_spread: 6.0,
        lat_center: 43.0,
        lat_spread: 3.0,
        lon_center: -95.0,
        lon_spread: 10.0,
        magnitude: (1.0, 0.4),
        property_scale: 3.0e4,
        crop_scale: 5.0e3,
        injury_rate: 0.15,
        death_rate: 0.01,
        track_km: 60.0,
        duration_minutes: 480.0,
        states: &["MINNESOTA", "WISCONSIN", "MICHIGAN", "NEW YORK"],
    },
];

const COUNTIES: [&str; 8] = [
    "WASHINGTON", "JEFFERSON", "FRANKLIN", "LINCOLN", "MADISON", "CLAY", "MARION", "GREENE",
];

/// Per-label row counts, in first-written order.
#[derive(Debug, Clone)]
pub struct SampleSummary {
    pub rows_written: usize,
    pub by_event: Vec<(String, usize)>,
}

/// Generate a sample CSV at the configured path.
pub fn generate_sample(config: &SampleConfig) -> Result<SampleSummary, AppError> {
    validate_config(config)?;
    let file = File::create(&config.out_path).map_err(|e| {
        AppError::new(
            2,
            format!(
                "Failed to create sample CSV '{}': {e}",
                config.out_path.display()
            ),
        )
    })?;
    write_sample_csv(file, config)
}

/// Writer-generic generation, so tests can capture the bytes.
pub fn write_sample_csv<W: Write>(out: W, config: &SampleConfig) -> Result<SampleSummary, AppError> {
    validate_config(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV: {e}")))?;

    let mut by_event: Vec<(String, usize)> = Vec::new();

    for _ in 0..config.count {
        let profile = pick_profile(&mut rng);
        let row = synthesize_row(&mut rng, profile)?;

        if !row[2].is_empty() {
            match by_event.iter_mut().find(|(name, _)| *name == row[2]) {
                Some(entry) => entry.1 += 1,
                None => by_event.push((row[2].clone(), 1)),
            }
        }

        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write sample CSV: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV: {e}")))?;

    Ok(SampleSummary {
        rows_written: config.count,
        by_event,
    })
}

fn validate_config(config: &SampleConfig) -> Result<(), AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    Ok(())
}

fn pick_profile(rng: &mut StdRng) -> &'static EventProfile {
    let total: f64 = PROFILES.iter().map(|p| p.weight).sum();
    let mut roll = rng.r#gen::<f64>() * total;
    for profile in &PROFILES {
        if roll < profile.weight {
            return profile;
        }
        roll -= profile.weight;
    }
    &PROFILES[PROFILES.len() - 1]
}

fn synthesize_row(rng: &mut StdRng, profile: &EventProfile) -> Result<Vec<String>, AppError> {
    let begin = sample_begin(rng, profile)?;

    let duration_minutes = if rng.r#gen::<f64>() < INSTANT_FRACTION {
        0.0
    } else {
        normal_sample(rng, profile.duration_minutes, profile.duration_minutes * 0.5)?.max(0.0)
    };
    let end = begin + Duration::seconds((duration_minutes * 60.0).round() as i64);

    let begin_lat = normal_sample(rng, profile.lat_center, profile.lat_spread)?.clamp(18.0, 64.0);
    let begin_lon = normal_sample(rng, profile.lon_center, profile.lon_spread)?.clamp(-125.0, -67.0);

    // Storms in the sample drift broadly northeast.
    let bearing = normal_sample(rng, 45.0, 40.0)?.rem_euclid(360.0);
    let track = normal_sample(rng, profile.track_km, profile.track_km * 0.5)?.abs();
    let (end_lat, end_lon) = destination_point(begin_lat, begin_lon, bearing, track);

    let coords_roll = rng.r#gen::<f64>();
    let (begin_coords, end_coords) = if coords_roll < NO_TRACK_FRACTION {
        (false, false)
    } else if coords_roll < NO_TRACK_FRACTION + BEGIN_ONLY_FRACTION {
        (true, false)
    } else {
        (true, true)
    };

    let event_type = if rng.r#gen::<f64>() < UNLABELED_FRACTION {
        String::new()
    } else {
        profile.name.to_string()
    };

    let magnitude = if rng.r#gen::<f64>() < NO_MAGNITUDE_FRACTION {
        String::new()
    } else {
        let (mean, sd) = profile.magnitude;
        format!("{:.2}", normal_sample(rng, mean, sd)?.max(0.0))
    };

    let damage_property = sample_damage(rng, profile.property_scale, 0.25, 0.08)?;
    let damage_crops = sample_damage(rng, profile.crop_scale, 0.5, 0.12)?;

    let injuries_direct = poisson_sample(rng, profile.injury_rate)?;
    let injuries_indirect = poisson_sample(rng, profile.injury_rate * 0.4)?;
    let deaths_direct = poisson_sample(rng, profile.death_rate)?;
    let deaths_indirect = poisson_sample(rng, profile.death_rate * 0.5)?;

    let state = profile.states[rng.gen_range(0..profile.states.len())];
    let county = COUNTIES[rng.gen_range(0..COUNTIES.len())];

    let coord = |on: bool, value: f64| {
        if on {
            format!("{value:.4}")
        } else {
            String::new()
        }
    };

    Ok(vec![
        format_timestamp(begin),
        format_timestamp(end),
        event_type,
        coord(begin_coords, begin_lat),
        coord(begin_coords, begin_lon),
        coord(end_coords, end_lat),
        coord(end_coords, end_lon),
        magnitude,
        damage_property,
        damage_crops,
        injuries_direct.to_string(),
        injuries_indirect.to_string(),
        deaths_direct.to_string(),
        deaths_indirect.to_string(),
        state.to_string(),
        county.to_string(),
    ])
}

fn sample_begin(rng: &mut StdRng, profile: &EventProfile) -> Result<NaiveDateTime, AppError> {
    let raw_month = normal_sample(rng, profile.peak_month, profile.month_spread)?.round() as i64;
    let month = ((raw_month - 1).rem_euclid(12) + 1) as u32;

    let year = rng.gen_range(2022..=2024);
    let day = rng.gen_range(1..=days_in_month(month).unwrap_or(28));
    let hour = normal_sample(rng, profile.peak_hour, profile.hour_spread)?
        .round()
        .clamp(0.0, 23.0) as u32;
    let minute = rng.gen_range(0..60u32);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| AppError::new(4, format!("Generated invalid date {year}-{month}-{day}.")))
}

/// Log-normal damage figure, rendered the way NOAA exports do: a K/M/B
/// suffix, a literal `0.00`, or an empty cell.
fn sample_damage(
    rng: &mut StdRng,
    scale: f64,
    zero_fraction: f64,
    missing_fraction: f64,
) -> Result<String, AppError> {
    let roll = rng.r#gen::<f64>();
    if roll < missing_fraction {
        return Ok(String::new());
    }
    if roll < missing_fraction + zero_fraction {
        return Ok("0.00".to_string());
    }
    let value = scale * normal_sample(rng, 0.0, 1.2)?.exp();
    Ok(format_damage(value))
}

fn format_damage(value: f64) -> String {
    if value <= 0.0 {
        "0.00".to_string()
    } else if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    // %b prints "Apr"; NOAA exports use "APR".
    ts.format(TIMESTAMP_FORMAT).to_string().to_uppercase()
}

fn normal_sample(rng: &mut StdRng, mean: f64, sd: f64) -> Result<f64, AppError> {
    let dist = Normal::new(mean, sd)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    Ok(dist.sample(rng))
}

fn poisson_sample(rng: &mut StdRng, rate: f64) -> Result<u32, AppError> {
    let dist = Poisson::new(rate.max(1e-6))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    Ok(dist.sample(rng) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::read_storm_csv;
    use std::path::PathBuf;

    fn config(count: usize, seed: u64) -> SampleConfig {
        SampleConfig {
            out_path: PathBuf::from("unused.csv"),
            count,
            seed,
        }
    }

    fn generate_bytes(count: usize, seed: u64) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_sample_csv(&mut buffer, &config(count, seed)).unwrap();
        buffer
    }

    #[test]
    fn zero_count_is_a_config_error() {
        let mut buffer = Vec::new();
        let err = write_sample_csv(&mut buffer, &config(0, 42)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn same_seed_reproduces_identical_bytes() {
        assert_eq!(generate_bytes(50, 42), generate_bytes(50, 42));
        assert_ne!(generate_bytes(50, 42), generate_bytes(50, 43));
    }

    #[test]
    fn generated_csv_passes_ingest_cleanly() {
        let bytes = generate_bytes(200, 42);
        let data = read_storm_csv(bytes.as_slice()).unwrap();

        assert_eq!(data.rows_read, 200);
        assert_eq!(data.rows_used, 200);
        assert!(data.row_errors.is_empty());
        assert!(data.stats.distinct_event_types >= 2);
        assert!(data.stats.with_track > 100);
    }

    #[test]
    fn sample_contains_fully_observed_rows() {
        let bytes = generate_bytes(200, 7);
        let data = read_storm_csv(bytes.as_slice()).unwrap();

        let complete = data
            .records
            .iter()
            .filter(|r| {
                r.event_type.is_some()
                    && r.begin_lat.is_some()
                    && r.end_lon.is_some()
                    && r.magnitude.is_some()
                    && r.damage_property.is_some()
                    && r.damage_crops.is_some()
                    && r.injuries_direct.is_some()
            })
            .count();
        // Enough complete rows survive for the outcome stage to train on.
        assert!(complete >= 50, "only {complete} complete rows");
    }

    #[test]
    fn summary_counts_match_written_labels() {
        let mut buffer = Vec::new();
        let summary = write_sample_csv(&mut buffer, &config(120, 11)).unwrap();

        assert_eq!(summary.rows_written, 120);
        let labeled: usize = summary.by_event.iter().map(|(_, n)| n).sum();
        assert!(labeled <= 120);

        let data = read_storm_csv(buffer.as_slice()).unwrap();
        let parsed_labeled = data
            .records
            .iter()
            .filter(|r| r.event_type.is_some())
            .count();
        assert_eq!(labeled, parsed_labeled);
    }

    #[test]
    fn damage_strings_render_with_suffixes() {
        assert_eq!(format_damage(0.0), "0.00");
        assert_eq!(format_damage(850.0), "850.00");
        assert_eq!(format_damage(1500.0), "1.50K");
        assert_eq!(format_damage(2_300_000.0), "2.30M");
        assert_eq!(format_damage(1.2e9), "1.20B");
    }
}
