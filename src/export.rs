use serde::Serialize;
use std::io::Write;

use crate::workout::{Workout, WorkoutKind};

/// One CSV line per workout; fields that do not apply to the kind stay empty
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: WorkoutKind,
    date: String,
    description: &'a str,
    lat: f64,
    lng: f64,
    distance_km: f64,
    duration_min: f64,
    pace_min_per_km: Option<f64>,
    speed_kmh: Option<f64>,
    cadence_spm: Option<f64>,
    elevation_gain_m: Option<f64>,
}

impl<'a> From<&'a Workout> for ExportRow<'a> {
    fn from(w: &'a Workout) -> Self {
        Self {
            id: w.id().as_str(),
            kind: w.kind(),
            date: w.created_at().to_rfc3339(),
            description: w.describe(),
            lat: w.coordinate().lat,
            lng: w.coordinate().lng,
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            pace_min_per_km: w.pace_min_per_km(),
            speed_kmh: w.speed_kmh(),
            cadence_spm: w.cadence_spm(),
            elevation_gain_m: w.elevation_gain_m(),
        }
    }
}

pub fn write_csv<W: Write>(workouts: &[&Workout], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for w in workouts {
        writer.serialize(ExportRow::from(*w))?;
    }
    writer.flush()?;
    Ok(())
}
