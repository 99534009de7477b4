use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::WorkoutError;
use crate::workout::{Workout, WorkoutId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    Distance,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Cycles creation order -> distance asc/desc -> duration asc/desc -> creation order
    pub fn cycle(current: Option<SortOrder>) -> Option<SortOrder> {
        use SortDirection::*;
        use SortKey::*;
        match current.map(|o| (o.key, o.direction)) {
            None => Some(SortOrder::new(Distance, Ascending)),
            Some((Distance, Ascending)) => Some(SortOrder::new(Distance, Descending)),
            Some((Distance, Descending)) => Some(SortOrder::new(Duration, Ascending)),
            Some((Duration, Ascending)) => Some(SortOrder::new(Duration, Descending)),
            Some((Duration, Descending)) => None,
        }
    }

    pub fn label(current: Option<SortOrder>) -> String {
        match current {
            None => "newest last".to_string(),
            Some(o) => {
                let arrow = match o.direction {
                    SortDirection::Ascending => "↑",
                    SortDirection::Descending => "↓",
                };
                format!("{} {}", o.key, arrow)
            }
        }
    }
}

/// Ordered workouts plus one marker handle per workout, keyed by id.
///
/// The two are only ever changed together: a workout without a marker (or a
/// marker without a workout) cannot be observed from outside.
#[derive(Debug)]
pub struct Collection<H> {
    records: Vec<Workout>,
    markers: HashMap<WorkoutId, H>,
}

impl<H> Default for Collection<H> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            markers: HashMap::new(),
        }
    }
}

impl<H> Collection<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Workouts in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Workout> {
        self.records.iter()
    }

    pub fn get(&self, id: &WorkoutId) -> Option<&Workout> {
        self.records.iter().find(|w| w.id() == id)
    }

    pub fn contains(&self, id: &WorkoutId) -> bool {
        self.markers.contains_key(id)
    }

    pub fn marker(&self, id: &WorkoutId) -> Option<&H> {
        self.markers.get(id)
    }

    pub fn add(&mut self, record: Workout, marker: H) -> Result<(), WorkoutError> {
        if self.contains(record.id()) {
            return Err(WorkoutError::DuplicateId(record.id().clone()));
        }
        self.markers.insert(record.id().clone(), marker);
        self.records.push(record);
        Ok(())
    }

    pub fn remove(&mut self, id: &WorkoutId) -> Result<(Workout, H), WorkoutError> {
        let pos = self
            .records
            .iter()
            .position(|w| w.id() == id)
            .ok_or_else(|| WorkoutError::NotFound(id.clone()))?;
        let marker = self
            .markers
            .remove(id)
            .ok_or_else(|| WorkoutError::NotFound(id.clone()))?;
        Ok((self.records.remove(pos), marker))
    }

    pub fn edit(
        &mut self,
        id: &WorkoutId,
        distance_km: f64,
        duration_min: f64,
        extra: f64,
    ) -> Result<&Workout, WorkoutError> {
        let record = self
            .records
            .iter_mut()
            .find(|w| w.id() == id)
            .ok_or_else(|| WorkoutError::NotFound(id.clone()))?;
        record.apply_edit(distance_km, duration_min, extra)?;
        Ok(record)
    }

    /// Empties the collection, handing back the released markers in record order
    pub fn clear(&mut self) -> Vec<H> {
        let markers = self
            .records
            .drain(..)
            .filter_map(|w| self.markers.remove(w.id()))
            .collect();
        self.markers.clear();
        markers
    }

    /// Display ordering by the given key. Stable for equal keys in both
    /// directions; stored order and marker associations are untouched.
    pub fn sort_by(&self, key: SortKey, direction: SortDirection) -> Vec<&Workout> {
        let value = |w: &Workout| match key {
            SortKey::Distance => w.distance_km(),
            SortKey::Duration => w.duration_min(),
        };
        self.records
            .iter()
            .sorted_by(|a, b| {
                let cmp = value(a).total_cmp(&value(b));
                match direction {
                    SortDirection::Ascending => cmp,
                    SortDirection::Descending => cmp.reverse(),
                }
            })
            .collect()
    }

    /// Display ordering for an optional sort; `None` keeps creation order
    pub fn ordered(&self, order: Option<SortOrder>) -> Vec<&Workout> {
        match order {
            Some(o) => self.sort_by(o.key, o.direction),
            None => self.records.iter().collect(),
        }
    }

    pub fn to_serializable(&self) -> Value {
        Value::Array(
            self.records
                .iter()
                .filter_map(|w| match serde_json::to_value(w) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        log::error!("failed to encode workout {}: {}", w.id(), e);
                        None
                    }
                })
                .collect(),
        )
    }

    /// Rebuilds a collection from its serialized form. Marker handles are
    /// created fresh through `place`. Anything other than an array yields an
    /// empty collection; unreadable or duplicate entries are skipped.
    pub fn from_serializable<F>(data: Option<&Value>, mut place: F) -> Self
    where
        F: FnMut(&Workout) -> H,
    {
        let mut collection = Self::new();

        let entries = match data {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                log::warn!("ignoring saved workouts: expected an array, found {}", kind_of(other));
                return collection;
            }
            None => return collection,
        };

        for entry in entries {
            let workout = match serde_json::from_value::<Workout>(entry.clone())
                .map_err(|e| e.to_string())
                .and_then(|w| w.revalidate().map_err(|e| e.to_string()))
            {
                Ok(w) => w,
                Err(e) => {
                    log::warn!("skipping unreadable saved workout: {e}");
                    continue;
                }
            };

            if collection.contains(workout.id()) {
                log::warn!("skipping saved workout with duplicate id {}", workout.id());
                continue;
            }

            let marker = place(&workout);
            collection.markers.insert(workout.id().clone(), marker);
            collection.records.push(workout);
        }

        collection
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
