//! CSV ingest and normalization.
//!
//! Turns a storm-events CSV (NOAA Storm Events layout) into a clean set of
//! `StormRecord`s that are safe to derive features from.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Missing is not zero**: optional fields that are absent or unparseable
//!   stay `None`; downstream stages decide which rows they can use
//!
//! Coordinates are the exception to the soft treatment: a value that is
//! present but unparseable or out of range fails the row, because corrupt
//! coordinates would otherwise flow straight into the distance and bearing
//! targets.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::domain::{RecordMeta, StormRecord, TIMESTAMP_FORMAT};
use crate::error::AppError;
use crate::features::parse_damage;

const REQUIRED_COLUMNS: [&str; 3] = ["begin_date_time", "end_date_time", "event_type"];

/// Summary stats about the records that survived validation.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_records: usize,
    pub distinct_event_types: usize,
    pub first_begin: NaiveDateTime,
    pub last_begin: NaiveDateTime,
    /// Records with a full begin/end coordinate pair.
    pub with_track: usize,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub event_type: Option<String>,
    pub message: String,
}

/// Ingest output: validated records + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<StormRecord>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load and validate a storm-events CSV from disk.
pub fn load_storm_csv(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_storm_csv(file)
}

/// Reader-generic ingest, so tests can feed byte slices.
pub fn read_storm_csv<R: Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    event_type: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => records.push(row),
            Err(e) => row_errors.push(RowError {
                line,
                event_type: get_optional(&record, &header_map, "event_type")
                    .map(str::to_string),
                message: e,
            }),
        }
    }

    let rows_used = records.len();
    let stats = compute_stats(&records)
        .ok_or_else(|| AppError::new(3, "No usable rows remain after validation."))?;

    Ok(IngestedData {
        records,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿begin_date_time"). If we don't strip it, schema
    // validation will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::new(
                2,
                format!("Missing required column: `{name}`"),
            ));
        }
    }
    Ok(())
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<StormRecord, String> {
    let begin = parse_timestamp(
        get_required(record, header_map, "begin_date_time")?,
        "begin_date_time",
    )?;
    let end = parse_timestamp(
        get_required(record, header_map, "end_date_time")?,
        "end_date_time",
    )?;
    if end < begin {
        return Err("`end_date_time` precedes `begin_date_time`.".to_string());
    }

    // The column must exist; an empty value is a legal unlabeled row.
    let event_type = get_optional(record, header_map, "event_type").map(str::to_string);

    let begin_lat = parse_coordinate(record, header_map, "begin_lat", 90.0)?;
    let begin_lon = parse_coordinate(record, header_map, "begin_lon", 180.0)?;
    let end_lat = parse_coordinate(record, header_map, "end_lat", 90.0)?;
    let end_lon = parse_coordinate(record, header_map, "end_lon", 180.0)?;

    let magnitude = parse_opt_f64(get_optional(record, header_map, "magnitude"));
    let damage_property =
        get_optional(record, header_map, "damage_property").and_then(parse_damage);
    let damage_crops = get_optional(record, header_map, "damage_crops").and_then(parse_damage);

    let injuries_direct = parse_opt_u32(get_optional(record, header_map, "injuries_direct"));
    let injuries_indirect = parse_opt_u32(get_optional(record, header_map, "injuries_indirect"));
    let deaths_direct = parse_opt_u32(get_optional(record, header_map, "deaths_direct"));
    let deaths_indirect = parse_opt_u32(get_optional(record, header_map, "deaths_indirect"));

    let meta = RecordMeta {
        state: get_optional(record, header_map, "state").map(str::to_string),
        county: get_optional(record, header_map, "cz_name").map(str::to_string),
        episode_narrative: get_optional(record, header_map, "episode_narrative")
            .map(str::to_string),
        event_narrative: get_optional(record, header_map, "event_narrative").map(str::to_string),
    };

    Ok(StormRecord {
        event_type,
        begin,
        end,
        begin_lat,
        begin_lon,
        end_lat,
        end_lon,
        magnitude,
        damage_property,
        damage_crops,
        injuries_direct,
        injuries_indirect,
        deaths_direct,
        deaths_indirect,
        meta,
    })
}

fn parse_timestamp(raw: &str, name: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| {
        format!("Invalid `{name}` value '{raw}'. Expected DD-MON-YY HH:MM:SS (e.g. 12-APR-24 14:30:00).")
    })
}

/// Parse an optional coordinate; reject present values outside `[-bound, bound]`.
fn parse_coordinate(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
    bound: f64,
) -> Result<Option<f64>, String> {
    let Some(raw) = get_optional(record, header_map, name) else {
        return Ok(None);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{raw}'."))?;
    if !value.is_finite() || value.abs() > bound {
        return Err(format!("`{name}` out of range: {value}"));
    }
    Ok(Some(value))
}

fn compute_stats(records: &[StormRecord]) -> Option<DatasetStats> {
    let first = records.first()?;
    let mut first_begin = first.begin;
    let mut last_begin = first.begin;
    let mut with_track = 0usize;
    let mut event_types: Vec<&str> = Vec::new();

    for record in records {
        first_begin = first_begin.min(record.begin);
        last_begin = last_begin.max(record.begin);
        if record.begin_lat.is_some()
            && record.begin_lon.is_some()
            && record.end_lat.is_some()
            && record.end_lon.is_some()
        {
            with_track += 1;
        }
        if let Some(label) = record.event_type.as_deref() {
            if !event_types.contains(&label) {
                event_types.push(label);
            }
        }
    }

    Some(DatasetStats {
        n_records: records.len(),
        distinct_event_types: event_types.len(),
        first_begin,
        last_begin,
        with_track,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_opt_u32(s: Option<&str>) -> Option<u32> {
    s?.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "BEGIN_DATE_TIME,END_DATE_TIME,EVENT_TYPE,BEGIN_LAT,BEGIN_LON,END_LAT,END_LON,MAGNITUDE,DAMAGE_PROPERTY,DAMAGE_CROPS,INJURIES_DIRECT,INJURIES_INDIRECT,DEATHS_DIRECT,DEATHS_INDIRECT,STATE,CZ_NAME\n";

    fn ingest(body: &str) -> IngestedData {
        let csv = format!("{HEADER}{body}");
        read_storm_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn well_formed_rows_parse_into_records() {
        let data = ingest(
            "12-APR-24 14:30:00,12-APR-24 15:00:00,Tornado,35.0,-90.0,35.2,-89.8,2.5,1.5K,0.00,3,0,1,0,TENNESSEE,SHELBY\n",
        );

        assert_eq!(data.rows_read, 1);
        assert_eq!(data.rows_used, 1);
        assert!(data.row_errors.is_empty());

        let record = &data.records[0];
        assert_eq!(record.event_type.as_deref(), Some("Tornado"));
        assert_eq!(record.begin_lat, Some(35.0));
        assert_eq!(record.damage_property, Some(1500.0));
        assert_eq!(record.damage_crops, Some(0.0));
        assert_eq!(record.injuries_direct, Some(3));
        assert_eq!(record.meta.state.as_deref(), Some("TENNESSEE"));
        assert_eq!(data.stats.distinct_event_types, 1);
        assert_eq!(data.stats.with_track, 1);
    }

    #[test]
    fn missing_required_column_fails_with_exit_2() {
        let err = read_storm_csv("EVENT_TYPE,BEGIN_DATE_TIME\nHail,12-APR-24 14:30:00\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("end_date_time"));
    }

    #[test]
    fn header_names_are_case_insensitive_and_bom_tolerant() {
        let csv = "\u{feff}Begin_Date_Time,end_date_time,Event_Type\n12-APR-24 14:30:00,12-APR-24 15:00:00,Hail\n";
        let data = read_storm_csv(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 1);
        assert_eq!(data.records[0].event_type.as_deref(), Some("Hail"));
    }

    #[test]
    fn bad_timestamp_skips_the_row_with_a_line_number() {
        let data = ingest(
            "12-APR-24 14:30:00,12-APR-24 15:00:00,Tornado,,,,,,,,,,,,,\n\
             2024-04-12 14:30,12-APR-24 15:00:00,Hail,,,,,,,,,,,,,\n",
        );

        assert_eq!(data.rows_used, 1);
        assert_eq!(data.row_errors.len(), 1);
        let error = &data.row_errors[0];
        assert_eq!(error.line, 3);
        assert_eq!(error.event_type.as_deref(), Some("Hail"));
        assert!(error.message.contains("begin_date_time"));
    }

    #[test]
    fn end_before_begin_skips_the_row() {
        let data = ingest(
            "12-APR-24 15:00:00,12-APR-24 14:30:00,Tornado,,,,,,,,,,,,,\n\
             12-APR-24 14:30:00,12-APR-24 14:30:00,Hail,,,,,,,,,,,,,\n",
        );

        // Same-instant rows are legal; reversed ones are not.
        assert_eq!(data.rows_used, 1);
        assert!(data.row_errors[0].message.contains("precedes"));
    }

    #[test]
    fn out_of_range_coordinate_skips_the_row() {
        let data = ingest(
            "12-APR-24 14:30:00,12-APR-24 15:00:00,Tornado,95.0,-90.0,,,,,,,,,,,\n\
             12-APR-24 14:30:00,12-APR-24 15:00:00,Hail,45.0,-100.0,,,,,,,,,,,\n",
        );

        assert_eq!(data.rows_used, 1);
        assert!(data.row_errors[0].message.contains("begin_lat"));
    }

    #[test]
    fn unparseable_optional_fields_become_missing_not_errors() {
        let data = ingest(
            "12-APR-24 14:30:00,12-APR-24 15:00:00,Tornado,,,,,abc,garbage,,many,,,,,\n",
        );

        assert!(data.row_errors.is_empty());
        let record = &data.records[0];
        assert_eq!(record.magnitude, None);
        assert_eq!(record.damage_property, None);
        assert_eq!(record.injuries_direct, None);
    }

    #[test]
    fn empty_event_type_is_a_legal_unlabeled_row() {
        let data = ingest("12-APR-24 14:30:00,12-APR-24 15:00:00,,,,,,,,,,,,,,\n");
        assert_eq!(data.rows_used, 1);
        assert_eq!(data.records[0].event_type, None);
        assert_eq!(data.stats.distinct_event_types, 0);
    }

    #[test]
    fn all_rows_invalid_is_a_no_data_error() {
        let csv = format!("{HEADER}not-a-date,12-APR-24 15:00:00,Hail,,,,,,,,,,,,,\n");
        let err = read_storm_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn stats_track_date_range_and_coordinates() {
        let data = ingest(
            "12-APR-24 14:30:00,12-APR-24 15:00:00,Tornado,35.0,-90.0,35.2,-89.8,,,,,,,,,\n\
             01-JAN-24 08:00:00,01-JAN-24 09:00:00,Hail,,,,,,,,,,,,,\n\
             30-JUN-24 18:00:00,30-JUN-24 18:30:00,Tornado,40.0,-95.0,40.1,-95.1,,,,,,,,,\n",
        );

        assert_eq!(data.stats.n_records, 3);
        assert_eq!(data.stats.distinct_event_types, 2);
        assert_eq!(data.stats.with_track, 2);
        assert_eq!(
            data.stats.first_begin,
            NaiveDateTime::parse_from_str("01-JAN-24 08:00:00", TIMESTAMP_FORMAT).unwrap()
        );
        assert_eq!(
            data.stats.last_begin,
            NaiveDateTime::parse_from_str("30-JUN-24 18:00:00", TIMESTAMP_FORMAT).unwrap()
        );
    }
}
