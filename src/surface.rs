//! Collaborator contracts the controller talks to, plus headless
//! implementations used by the CLI subcommands.

use crate::error::LocateError;
use crate::workout::{Coordinate, Workout, WorkoutId, WorkoutKind};

/// How a view change should be presented
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub animate: bool,
    pub pan_duration_secs: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            animate: false,
            pan_duration_secs: 0.0,
        }
    }
}

impl ViewOptions {
    pub fn animated() -> Self {
        Self {
            animate: true,
            pan_duration_secs: 1.0,
        }
    }
}

/// Popup shown next to a marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLabel {
    pub kind: WorkoutKind,
    pub text: String,
}

impl MarkerLabel {
    pub fn for_workout(workout: &Workout) -> Self {
        Self {
            kind: workout.kind(),
            text: format!("{} {}", workout.icon(), workout.describe()),
        }
    }
}

pub trait MapSurface {
    type Handle;

    fn set_view(&mut self, center: Coordinate, zoom: u8, options: ViewOptions);
    fn add_marker(&mut self, coordinate: Coordinate, label: MarkerLabel) -> Self::Handle;
    fn remove_marker(&mut self, handle: Self::Handle);
}

/// Rendered list of workouts, addressed by workout id
pub trait ListSink {
    /// Append a row for the workout
    fn render(&mut self, workout: &Workout);
    /// Refresh the row's values after an edit
    fn update(&mut self, workout: &Workout);
    fn remove(&mut self, id: &WorkoutId);
    fn set_editing(&mut self, id: &WorkoutId, editing: bool);
    fn clear(&mut self);
}

pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// Source of the user's current position
pub trait Locator {
    fn locate(&self) -> Result<Coordinate, LocateError>;
}

/// Locator backed by a configured position, if any
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocator {
    position: Option<Coordinate>,
}

impl FixedLocator {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }
}

impl Locator for FixedLocator {
    fn locate(&self) -> Result<Coordinate, LocateError> {
        self.position.ok_or(LocateError::Unavailable)
    }
}

/// Map surface with no display; hands out sequential marker ids
#[derive(Debug, Default)]
pub struct DetachedMap {
    next_marker: u64,
    markers: usize,
}

impl DetachedMap {
    pub fn marker_count(&self) -> usize {
        self.markers
    }
}

impl MapSurface for DetachedMap {
    type Handle = u64;

    fn set_view(&mut self, _center: Coordinate, _zoom: u8, _options: ViewOptions) {}

    fn add_marker(&mut self, _coordinate: Coordinate, _label: MarkerLabel) -> u64 {
        self.next_marker += 1;
        self.markers += 1;
        self.next_marker
    }

    fn remove_marker(&mut self, _handle: u64) {
        self.markers = self.markers.saturating_sub(1);
    }
}

/// List sink that renders nothing
#[derive(Debug, Default)]
pub struct NullList;

impl ListSink for NullList {
    fn render(&mut self, _workout: &Workout) {}
    fn update(&mut self, _workout: &Workout) {}
    fn remove(&mut self, _id: &WorkoutId) {}
    fn set_editing(&mut self, _id: &WorkoutId, _editing: bool) {}
    fn clear(&mut self) {}
}

/// Notifier for non-interactive runs: alerts go to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&mut self, message: &str) {
        log::warn!("{message}");
    }
}
