//! Feature derivation from raw storm records.
//!
//! Turns a `StormRecord` into the derived columns the models consume:
//!
//! - begin/end month, day, hour
//! - duration in minutes (wall-clock difference, no timezone handling)
//! - great-circle distance, initial bearing, cardinal direction
//!
//! Damage strings are parsed here too (`parse_damage`), though ingest calls it
//! field-by-field while building records.

use chrono::{Datelike, Timelike};
use rayon::prelude::*;

use crate::domain::{CardinalDirection, DerivedFeatures, StormEvent, StormRecord};
use crate::math::geo::distance_and_bearing;

/// Parse a monetary damage field.
///
/// Accepts a trailing K/M/B unit suffix (scaling the numeric prefix by
/// 1e3/1e6/1e9) or plain numeric text, which passes through unchanged (this
/// also covers the "0.00" placeholder the source data uses for a genuine
/// zero). Anything else is `None`, meaning missing rather than zero. That
/// distinction decides whether a row is dropped from training, so it must not
/// be collapsed.
pub fn parse_damage(raw: &str) -> Option<f64> {
    let text = raw.trim().to_ascii_uppercase();
    if text.is_empty() {
        return None;
    }

    for (suffix, multiplier) in [("K", 1e3), ("M", 1e6), ("B", 1e9)] {
        if let Some(prefix) = text.strip_suffix(suffix) {
            let value = prefix.trim().parse::<f64>().ok()?;
            return Some(value * multiplier).filter(|v| v.is_finite());
        }
    }

    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Compute the derived columns for one record.
///
/// Geometry fields are `None` when any coordinate is missing; direction is the
/// bearing's compass bucket and inherits its missing-ness.
pub fn derive(record: &StormRecord) -> DerivedFeatures {
    let duration_minutes = (record.end - record.begin).num_seconds() as f64 / 60.0;

    let (distance_km, bearing_degrees) = match (
        record.begin_lat,
        record.begin_lon,
        record.end_lat,
        record.end_lon,
    ) {
        (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => {
            let (d, b) = distance_and_bearing(lat1, lon1, lat2, lon2);
            (Some(d), Some(b))
        }
        _ => (None, None),
    };

    let direction = bearing_degrees.and_then(CardinalDirection::from_bearing);

    DerivedFeatures {
        begin_month: record.begin.month(),
        begin_day: record.begin.day(),
        begin_hour: record.begin.hour(),
        end_month: record.end.month(),
        end_day: record.end.day(),
        end_hour: record.end.hour(),
        duration_minutes,
        distance_km,
        bearing_degrees,
        direction,
    }
}

/// Derive features for a whole dataset.
///
/// Rows are independent, so this is a parallel map; the indexed collect keeps
/// the original row order.
pub fn derive_all(records: Vec<StormRecord>) -> Vec<StormEvent> {
    records
        .into_par_iter()
        .map(|record| {
            let derived = derive(&record);
            StormEvent { record, derived }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordMeta;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn record(begin: NaiveDateTime, end: NaiveDateTime) -> StormRecord {
        StormRecord {
            event_type: Some("Tornado".to_string()),
            begin,
            end,
            begin_lat: Some(35.0),
            begin_lon: Some(-90.0),
            end_lat: Some(35.2),
            end_lon: Some(-89.8),
            magnitude: None,
            damage_property: None,
            damage_crops: None,
            injuries_direct: Some(0),
            injuries_indirect: Some(0),
            deaths_direct: Some(0),
            deaths_indirect: Some(0),
            meta: RecordMeta::default(),
        }
    }

    #[test]
    fn damage_suffixes_scale_the_prefix() {
        assert_eq!(parse_damage("1.5K"), Some(1500.0));
        assert_eq!(parse_damage("2M"), Some(2_000_000.0));
        assert_eq!(parse_damage("5.25B"), Some(5_250_000_000.0));
        // Trimming and case folding.
        assert_eq!(parse_damage("  3k "), Some(3000.0));
    }

    #[test]
    fn damage_zero_literal_and_numeric_passthrough() {
        assert_eq!(parse_damage("0.00"), Some(0.0));
        assert_eq!(parse_damage("1500"), Some(1500.0));
        assert_eq!(parse_damage("12.5"), Some(12.5));
    }

    #[test]
    fn damage_garbage_is_missing_not_zero() {
        assert_eq!(parse_damage("garbage"), None);
        assert_eq!(parse_damage(""), None);
        assert_eq!(parse_damage("   "), None);
        // A bare suffix has no numeric prefix.
        assert_eq!(parse_damage("K"), None);
        assert_eq!(parse_damage("1.2.3M"), None);
    }

    #[test]
    fn derive_decomposes_timestamps() {
        let r = record(ts(2024, 4, 12, 14, 30), ts(2024, 4, 12, 15, 0));
        let d = derive(&r);

        assert_eq!(d.begin_month, 4);
        assert_eq!(d.begin_day, 12);
        assert_eq!(d.begin_hour, 14);
        assert_eq!(d.end_hour, 15);
        assert!((d.duration_minutes - 30.0).abs() < 1e-12);
        assert!(d.distance_km.unwrap() > 0.0);
        assert!((0.0..360.0).contains(&d.bearing_degrees.unwrap()));
        assert!(d.direction.is_some());
    }

    #[test]
    fn same_instant_event_has_zero_duration() {
        let t = ts(2024, 7, 1, 9, 15);
        let d = derive(&record(t, t));
        assert_eq!(d.duration_minutes, 0.0);
    }

    #[test]
    fn missing_coordinates_leave_geometry_missing() {
        let mut r = record(ts(2024, 4, 12, 14, 30), ts(2024, 4, 12, 15, 0));
        r.end_lon = None;
        let d = derive(&r);

        assert_eq!(d.distance_km, None);
        assert_eq!(d.bearing_degrees, None);
        assert_eq!(d.direction, None);
    }

    #[test]
    fn derive_all_preserves_row_order() {
        let records: Vec<StormRecord> = (1..=6)
            .map(|mo| record(ts(2024, mo, 1, 0, 0), ts(2024, mo, 1, 1, 0)))
            .collect();
        let events = derive_all(records);

        let months: Vec<u32> = events.iter().map(|e| e.derived.begin_month).collect();
        assert_eq!(months, vec![1, 2, 3, 4, 5, 6]);
    }
}
