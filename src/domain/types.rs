//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during training and inference
//! - persisted to JSON model artifacts
//! - reloaded later with identical prediction behavior

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the storm-details CSV extract (`12-APR-24 14:30:00`).
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%y %H:%M:%S";

/// One of the 8 compass points bucketing an initial bearing.
///
/// The bucket rule is fixed: offset the bearing by half a bucket (22.5°),
/// floor-divide by the 45° bucket width, and wrap modulo 8. North therefore
/// owns [337.5°, 360°) ∪ [0°, 22.5°).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardinalDirection {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl CardinalDirection {
    pub const ALL: [CardinalDirection; 8] = [
        CardinalDirection::N,
        CardinalDirection::Ne,
        CardinalDirection::E,
        CardinalDirection::Se,
        CardinalDirection::S,
        CardinalDirection::Sw,
        CardinalDirection::W,
        CardinalDirection::Nw,
    ];

    /// Bucket a bearing into a compass point.
    ///
    /// Returns `None` for non-finite input (the "unknown" sentinel); never
    /// panics. Finite input outside [0, 360) is wrapped by the modulo, so
    /// 360° maps back to `N`.
    pub fn from_bearing(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let idx = (((degrees + 22.5) / 45.0).floor() as i64).rem_euclid(8) as usize;
        Some(Self::ALL[idx])
    }

    /// Compass label, also the vocabulary the direction encoder is fit on.
    pub fn display_name(self) -> &'static str {
        match self {
            CardinalDirection::N => "N",
            CardinalDirection::Ne => "NE",
            CardinalDirection::E => "E",
            CardinalDirection::Se => "SE",
            CardinalDirection::S => "S",
            CardinalDirection::Sw => "SW",
            CardinalDirection::W => "W",
            CardinalDirection::Nw => "NW",
        }
    }
}

/// A raw storm event row (mostly optional fields).
///
/// This mirrors the storm-details CSV schema and allows us to:
/// - perform row-level validation with good error messages
/// - keep the missing-vs-zero distinction for damages and counts
#[derive(Debug, Clone)]
pub struct StormRecord {
    /// Event type label; `None` when the column value is empty.
    pub event_type: Option<String>,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,

    pub begin_lat: Option<f64>,
    pub begin_lon: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lon: Option<f64>,

    pub magnitude: Option<f64>,
    /// Parsed monetary amounts; `None` means missing or unparseable, never 0.
    pub damage_property: Option<f64>,
    pub damage_crops: Option<f64>,

    pub injuries_direct: Option<u32>,
    pub injuries_indirect: Option<u32>,
    pub deaths_direct: Option<u32>,
    pub deaths_indirect: Option<u32>,

    /// Identifiers and narratives (reporting only, unused by the models).
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Default)]
pub struct RecordMeta {
    pub state: Option<String>,
    pub county: Option<String>,
    pub episode_narrative: Option<String>,
    pub event_narrative: Option<String>,
}

/// Columns derived from a `StormRecord`, immutable once computed.
#[derive(Debug, Clone)]
pub struct DerivedFeatures {
    pub begin_month: u32,
    pub begin_day: u32,
    pub begin_hour: u32,
    pub end_month: u32,
    pub end_day: u32,
    pub end_hour: u32,

    /// Wall-clock difference in minutes; 0 for same-instant events.
    pub duration_minutes: f64,

    /// Great-circle geometry; `None` when any coordinate is missing.
    pub distance_km: Option<f64>,
    pub bearing_degrees: Option<f64>,
    /// `None` is the "unknown" direction sentinel.
    pub direction: Option<CardinalDirection>,
}

/// A storm record together with its derived columns.
#[derive(Debug, Clone)]
pub struct StormEvent {
    pub record: StormRecord,
    pub derived: DerivedFeatures,
}

impl StormEvent {
    /// The classifier's 5-feature row, or `None` if a feature is missing.
    pub fn classifier_features(&self) -> Option<[f64; 5]> {
        Some([
            f64::from(self.derived.begin_month),
            f64::from(self.derived.begin_day),
            f64::from(self.derived.begin_hour),
            self.record.begin_lat?,
            self.record.begin_lon?,
        ])
    }

    pub fn event_label(&self) -> Option<&str> {
        self.record.event_type.as_deref()
    }

    /// The 12 numeric outcome targets in fixed order (the 13th, the direction
    /// code, is appended after label encoding). `None` if any is missing.
    pub fn numeric_targets(&self) -> Option<[f64; 12]> {
        Some([
            f64::from(self.record.injuries_direct?),
            f64::from(self.record.injuries_indirect?),
            f64::from(self.record.deaths_direct?),
            f64::from(self.record.deaths_indirect?),
            self.record.damage_property?,
            self.record.damage_crops?,
            self.record.magnitude?,
            self.record.end_lat?,
            self.record.end_lon?,
            self.derived.duration_minutes,
            self.derived.distance_km?,
            self.derived.bearing_degrees?,
        ])
    }
}

/// The 13 regression targets, in the order the outcome model is fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    InjuriesDirect,
    InjuriesIndirect,
    DeathsDirect,
    DeathsIndirect,
    DamageProperty,
    DamageCrops,
    Magnitude,
    EndLat,
    EndLon,
    DurationMinutes,
    DistanceKm,
    BearingDegrees,
    DirectionCode,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 13] = [
        OutcomeKind::InjuriesDirect,
        OutcomeKind::InjuriesIndirect,
        OutcomeKind::DeathsDirect,
        OutcomeKind::DeathsIndirect,
        OutcomeKind::DamageProperty,
        OutcomeKind::DamageCrops,
        OutcomeKind::Magnitude,
        OutcomeKind::EndLat,
        OutcomeKind::EndLon,
        OutcomeKind::DurationMinutes,
        OutcomeKind::DistanceKm,
        OutcomeKind::BearingDegrees,
        OutcomeKind::DirectionCode,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in the target vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether predictions of this target are clamped at 0.
    ///
    /// End coordinates may be legitimately negative and bearing spans a
    /// circular range, so those three are never clamped.
    pub fn clamped_at_zero(self) -> bool {
        !matches!(
            self,
            OutcomeKind::EndLat | OutcomeKind::EndLon | OutcomeKind::BearingDegrees
        )
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            OutcomeKind::InjuriesDirect => "Direct injuries",
            OutcomeKind::InjuriesIndirect => "Indirect injuries",
            OutcomeKind::DeathsDirect => "Direct deaths",
            OutcomeKind::DeathsIndirect => "Indirect deaths",
            OutcomeKind::DamageProperty => "Property damage ($)",
            OutcomeKind::DamageCrops => "Crop damage ($)",
            OutcomeKind::Magnitude => "Magnitude",
            OutcomeKind::EndLat => "End latitude",
            OutcomeKind::EndLon => "End longitude",
            OutcomeKind::DurationMinutes => "Duration (minutes)",
            OutcomeKind::DistanceKm => "Distance (km)",
            OutcomeKind::BearingDegrees => "Bearing (degrees)",
            OutcomeKind::DirectionCode => "Direction code",
        }
    }
}

/// Output of the full pipeline for one query.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub event_type: String,
    /// Clamped outcome values, indexed by `OutcomeKind::ALL` order.
    pub outcomes: [f64; OutcomeKind::COUNT],
}

impl PredictionResult {
    pub fn outcome(&self, kind: OutcomeKind) -> f64 {
        self.outcomes[kind.index()]
    }
}

/// Day count per month under the non-leap-year convention used for input
/// validation (February is always 28).
pub fn days_in_month(month: u32) -> Option<u32> {
    const DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if (1..=12).contains(&month) {
        Some(DAYS[(month - 1) as usize])
    } else {
        None
    }
}

/// A validated prediction query (what the front end hands the pipeline).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventQuery {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub lat: f64,
    pub lon: f64,
}

impl EventQuery {
    /// Range-check the query. Returns a message suitable for exit-code-2
    /// wrapping at the CLI boundary.
    pub fn validate(&self) -> Result<(), String> {
        let Some(max_day) = days_in_month(self.month) else {
            return Err(format!("Month must be 1-12 (got {}).", self.month));
        };
        if self.day < 1 || self.day > max_day {
            return Err(format!(
                "Day must be 1-{max_day} for month {} (got {}).",
                self.month, self.day
            ));
        }
        if self.hour > 23 {
            return Err(format!("Hour must be 0-23 (got {}).", self.hour));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("Latitude must be in [-90, 90] (got {}).", self.lat));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(format!("Longitude must be in [-180, 180] (got {}).", self.lon));
        }
        Ok(())
    }

    /// The classifier's feature row for this query.
    pub fn features(&self) -> [f64; 5] {
        [
            f64::from(self.month),
            f64::from(self.day),
            f64::from(self.hour),
            self.lat,
            self.lon,
        ]
    }
}

/// A training run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub csv_path: PathBuf,
    pub model_dir: PathBuf,
    /// Seed for the evaluation splits only; the deployed fits are seed-free.
    pub seed: u64,
    /// How many skipped-row diagnostics to show in the training summary.
    pub max_row_errors: usize,
}

/// Configuration for synthetic sample generation.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out_path: PathBuf,
    pub count: usize,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_buckets_cover_the_circle() {
        // Every bearing in [0,360) maps to one of the 8 points.
        for deg in 0..360 {
            assert!(CardinalDirection::from_bearing(f64::from(deg)).is_some());
        }
        assert_eq!(CardinalDirection::from_bearing(f64::NAN), None);
    }

    #[test]
    fn cardinal_bucket_boundaries() {
        assert_eq!(
            CardinalDirection::from_bearing(0.0),
            Some(CardinalDirection::N)
        );
        assert_eq!(
            CardinalDirection::from_bearing(22.4999),
            Some(CardinalDirection::N)
        );
        assert_eq!(
            CardinalDirection::from_bearing(22.5),
            Some(CardinalDirection::Ne)
        );
        assert_eq!(
            CardinalDirection::from_bearing(337.5),
            Some(CardinalDirection::N)
        );
        // 360 wraps back to north.
        assert_eq!(
            CardinalDirection::from_bearing(360.0),
            Some(CardinalDirection::N)
        );
        assert_eq!(
            CardinalDirection::from_bearing(180.0),
            Some(CardinalDirection::S)
        );
    }

    #[test]
    fn outcome_order_is_stable() {
        assert_eq!(OutcomeKind::COUNT, 13);
        assert_eq!(OutcomeKind::InjuriesDirect.index(), 0);
        assert_eq!(OutcomeKind::Magnitude.index(), 6);
        assert_eq!(OutcomeKind::DirectionCode.index(), 12);
    }

    #[test]
    fn clamping_exempts_end_coordinates_and_bearing() {
        let unclamped: Vec<OutcomeKind> = OutcomeKind::ALL
            .iter()
            .copied()
            .filter(|k| !k.clamped_at_zero())
            .collect();
        assert_eq!(
            unclamped,
            vec![
                OutcomeKind::EndLat,
                OutcomeKind::EndLon,
                OutcomeKind::BearingDegrees
            ]
        );
    }

    #[test]
    fn query_validation_rejects_out_of_range() {
        let base = EventQuery {
            month: 4,
            day: 12,
            hour: 14,
            lat: 35.0,
            lon: -90.0,
        };
        assert!(base.validate().is_ok());

        assert!(EventQuery { month: 13, ..base }.validate().is_err());
        assert!(EventQuery { day: 31, month: 2, ..base }.validate().is_err());
        // Non-leap-year convention: Feb 29 is invalid.
        assert!(EventQuery { day: 29, month: 2, ..base }.validate().is_err());
        assert!(EventQuery { hour: 24, ..base }.validate().is_err());
        assert!(EventQuery { lat: 91.0, ..base }.validate().is_err());
        assert!(
            EventQuery {
                lon: f64::NAN,
                ..base
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn month_lengths_follow_non_leap_convention() {
        assert_eq!(days_in_month(2), Some(28));
        assert_eq!(days_in_month(4), Some(30));
        assert_eq!(days_in_month(12), Some(31));
        assert_eq!(days_in_month(0), None);
        assert_eq!(days_in_month(13), None);
    }
}
