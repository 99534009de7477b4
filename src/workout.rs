use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkoutError;

/// Number of trailing epoch-millisecond digits kept in a workout id
const ID_DIGITS: usize = 10;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    /// Capitalized name used in descriptions
    pub fn label(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }

    /// Name of the kind-specific extra input
    pub fn extra_field(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "cadence",
            WorkoutKind::Cycling => "elevation",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            WorkoutKind::Running => WorkoutKind::Cycling,
            WorkoutKind::Cycling => WorkoutKind::Running,
        }
    }
}

/// Latitude/longitude pair, stored as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> Result<(), WorkoutError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(WorkoutError::Validation {
                field: "latitude",
                requirement: "between -90 and 90",
                value: self.lat,
            });
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(WorkoutError::Validation {
                field: "longitude",
                requirement: "between -180 and 180",
                value: self.lng,
            });
        }
        Ok(())
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(v: [f64; 2]) -> Self {
        Coordinate { lat: v[0], lng: v[1] }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new(id: impl Into<String>) -> Self {
        WorkoutId(id.into())
    }

    /// Keeps the trailing digits of the epoch milliseconds
    pub fn from_timestamp(millis: i64) -> Self {
        let digits = millis.to_string();
        let start = digits.len().saturating_sub(ID_DIGITS);
        WorkoutId(digits[start..].to_string())
    }

    /// Next id in sequence, for two workouts created within the same millisecond
    pub fn successor(&self) -> Self {
        match self.0.parse::<u64>() {
            Ok(n) => WorkoutId(format!("{:0width$}", n + 1, width = self.0.len())),
            Err(_) => WorkoutId(format!("{}-1", self.0)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific fields and the metric derived from distance and duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Running {
        #[serde(rename = "cadence")]
        cadence_spm: f64,
        #[serde(rename = "pace")]
        pace_min_per_km: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain_m: f64,
        #[serde(rename = "speed")]
        speed_kmh: f64,
    },
}

impl Activity {
    fn new(kind: WorkoutKind, distance_km: f64, duration_min: f64, extra: f64) -> Self {
        match kind {
            WorkoutKind::Running => Activity::Running {
                cadence_spm: extra,
                pace_min_per_km: pace(distance_km, duration_min),
            },
            WorkoutKind::Cycling => Activity::Cycling {
                elevation_gain_m: extra,
                speed_kmh: speed(distance_km, duration_min),
            },
        }
    }

    pub fn kind(&self) -> WorkoutKind {
        match self {
            Activity::Running { .. } => WorkoutKind::Running,
            Activity::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    pub fn extra(&self) -> f64 {
        match self {
            Activity::Running { cadence_spm, .. } => *cadence_spm,
            Activity::Cycling {
                elevation_gain_m, ..
            } => *elevation_gain_m,
        }
    }
}

pub fn pace(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

pub fn speed(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / 60.0)
}

fn require_positive(field: &'static str, value: f64) -> Result<f64, WorkoutError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(WorkoutError::Validation {
            field,
            requirement: "a positive number",
            value,
        })
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<f64, WorkoutError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WorkoutError::Validation {
            field,
            requirement: "a number",
            value,
        })
    }
}

/// Checks the numeric inputs shared by creation and edits.
/// Elevation gain may be zero or negative (descents), cadence may not.
fn validate_inputs(
    kind: WorkoutKind,
    distance_km: f64,
    duration_min: f64,
    extra: f64,
) -> Result<(), WorkoutError> {
    require_positive("distance", distance_km)?;
    require_positive("duration", duration_min)?;
    match kind {
        WorkoutKind::Running => require_positive("cadence", extra)?,
        WorkoutKind::Cycling => require_finite("elevation", extra)?,
    };
    Ok(())
}

fn description_for(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    format!(
        "{} on {}",
        kind.label(),
        created_at.with_timezone(&Local).format("%B %-d")
    )
}

/// A single recorded workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    id: WorkoutId,
    #[serde(rename = "date")]
    created_at: DateTime<Utc>,
    #[serde(rename = "coord")]
    coordinate: Coordinate,
    #[serde(rename = "distance")]
    distance_km: f64,
    #[serde(rename = "duration")]
    duration_min: f64,
    description: String,
    #[serde(flatten)]
    activity: Activity,
}

impl Workout {
    pub fn create(
        kind: WorkoutKind,
        coordinate: Coordinate,
        distance_km: f64,
        duration_min: f64,
        extra: f64,
    ) -> Result<Self, WorkoutError> {
        Self::create_at(Utc::now(), kind, coordinate, distance_km, duration_min, extra)
    }

    pub fn create_at(
        created_at: DateTime<Utc>,
        kind: WorkoutKind,
        coordinate: Coordinate,
        distance_km: f64,
        duration_min: f64,
        extra: f64,
    ) -> Result<Self, WorkoutError> {
        coordinate.validate()?;
        validate_inputs(kind, distance_km, duration_min, extra)?;

        Ok(Self {
            id: WorkoutId::from_timestamp(created_at.timestamp_millis()),
            created_at,
            coordinate,
            distance_km,
            duration_min,
            description: description_for(kind, created_at),
            activity: Activity::new(kind, distance_km, duration_min, extra),
        })
    }

    /// Description fixed at creation time; edits never change it
    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Replace distance, duration and the kind-specific extra, then recompute
    /// the derived metric. Nothing changes if validation fails.
    pub fn apply_edit(
        &mut self,
        distance_km: f64,
        duration_min: f64,
        extra: f64,
    ) -> Result<(), WorkoutError> {
        validate_inputs(self.kind(), distance_km, duration_min, extra)?;

        self.distance_km = distance_km;
        self.duration_min = duration_min;
        self.activity = Activity::new(self.kind(), distance_km, duration_min, extra);
        Ok(())
    }

    /// Validates a record read back from storage and recomputes its metric
    pub(crate) fn revalidate(mut self) -> Result<Self, WorkoutError> {
        self.coordinate.validate()?;
        let extra = self.activity.extra();
        self.apply_edit(self.distance_km, self.duration_min, extra)?;
        Ok(self)
    }

    pub(crate) fn reassign_id(&mut self, id: WorkoutId) {
        self.id = id;
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn icon(&self) -> &'static str {
        self.kind().icon()
    }

    pub fn pace_min_per_km(&self) -> Option<f64> {
        match self.activity {
            Activity::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            Activity::Cycling { .. } => None,
        }
    }

    pub fn speed_kmh(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { speed_kmh, .. } => Some(speed_kmh),
            Activity::Running { .. } => None,
        }
    }

    pub fn cadence_spm(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { cadence_spm, .. } => Some(cadence_spm),
            Activity::Cycling { .. } => None,
        }
    }

    pub fn elevation_gain_m(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling {
                elevation_gain_m, ..
            } => Some(elevation_gain_m),
            Activity::Running { .. } => None,
        }
    }

    /// Pace or speed with its unit, one decimal place
    pub fn metric_display(&self) -> (String, &'static str) {
        match self.activity {
            Activity::Running {
                pace_min_per_km, ..
            } => (format!("{pace_min_per_km:.1}"), "min/km"),
            Activity::Cycling { speed_kmh, .. } => (format!("{speed_kmh:.1}"), "km/h"),
        }
    }
}
