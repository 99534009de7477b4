use std::collections::BTreeMap;

use assert_matches::assert_matches;
use mapty::{
    collection::{SortDirection, SortKey, SortOrder},
    controller::{Controller, EditInput, FormInput, FormState},
    error::WorkoutError,
    persistence::{BlobStore, MemoryBlobStore, WORKOUTS_KEY},
    surface::{FixedLocator, ListSink, MapSurface, MarkerLabel, Notifier, ViewOptions},
    workout::{Coordinate, Workout, WorkoutId, WorkoutKind},
};

// Collaborators that record what the controller asked of them

#[derive(Debug, Default)]
struct RecordingMap {
    next: u32,
    live: BTreeMap<u32, (Coordinate, MarkerLabel)>,
    views: Vec<(Coordinate, u8, ViewOptions)>,
}

impl MapSurface for RecordingMap {
    type Handle = u32;

    fn set_view(&mut self, center: Coordinate, zoom: u8, options: ViewOptions) {
        self.views.push((center, zoom, options));
    }

    fn add_marker(&mut self, coordinate: Coordinate, label: MarkerLabel) -> u32 {
        self.next += 1;
        self.live.insert(self.next, (coordinate, label));
        self.next
    }

    fn remove_marker(&mut self, handle: u32) {
        assert!(self.live.remove(&handle).is_some(), "unknown marker {handle}");
    }
}

#[derive(Debug, Default)]
struct RecordingList {
    rows: Vec<(WorkoutId, f64)>,
    editing: Option<WorkoutId>,
}

impl RecordingList {
    fn ids(&self) -> Vec<WorkoutId> {
        self.rows.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl ListSink for RecordingList {
    fn render(&mut self, workout: &Workout) {
        self.rows.push((workout.id().clone(), workout.distance_km()));
    }

    fn update(&mut self, workout: &Workout) {
        if let Some(row) = self.rows.iter_mut().find(|(id, _)| id == workout.id()) {
            row.1 = workout.distance_km();
        }
    }

    fn remove(&mut self, id: &WorkoutId) {
        self.rows.retain(|(row, _)| row != id);
    }

    fn set_editing(&mut self, id: &WorkoutId, editing: bool) {
        if editing {
            self.editing = Some(id.clone());
        } else if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

#[derive(Debug, Default)]
struct RecordingNotifier {
    alerts: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

type TestController = Controller<RecordingMap, RecordingList, MemoryBlobStore, RecordingNotifier>;

const HOME: Coordinate = Coordinate {
    lat: 51.5,
    lng: -0.1,
};

fn started(blobs: MemoryBlobStore) -> TestController {
    let mut c = Controller::new(
        RecordingMap::default(),
        RecordingList::default(),
        blobs,
        RecordingNotifier::default(),
    );
    c.start(&FixedLocator::new(Some(HOME)));
    c
}

fn running(distance: &str, duration: &str, cadence: &str) -> FormInput {
    FormInput {
        kind: WorkoutKind::Running,
        distance: distance.into(),
        duration: duration.into(),
        cadence: cadence.into(),
        elevation: String::new(),
    }
}

fn cycling(distance: &str, duration: &str, elevation: &str) -> FormInput {
    FormInput {
        kind: WorkoutKind::Cycling,
        distance: distance.into(),
        duration: duration.into(),
        cadence: String::new(),
        elevation: elevation.into(),
    }
}

fn add(c: &mut TestController, at: Coordinate, input: &FormInput) -> WorkoutId {
    c.on_map_click(at);
    c.submit(input).unwrap()
}

fn saved_count(blobs: &MemoryBlobStore) -> usize {
    let raw = blobs.get(WORKOUTS_KEY).unwrap().unwrap_or_else(|| "[]".into());
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    value.as_array().map(|a| a.len()).unwrap_or(0)
}

#[test]
fn start_without_saved_workouts_centers_on_position() {
    let c = started(MemoryBlobStore::new());
    assert!(c.store().is_empty());
    assert_eq!(c.map().views, vec![(HOME, 13, ViewOptions::default())]);
    assert!(c.notifier().alerts.is_empty());
    assert_eq!(c.form(), FormState::Hidden);
}

#[test]
fn submit_adds_record_marker_row_and_saves() {
    let mut c = started(MemoryBlobStore::new());
    let at = Coordinate::new(51.52, -0.12);
    c.on_map_click(at);
    assert_eq!(c.form(), FormState::Open { at });

    let id = c.submit(&running("5", "25", "180")).unwrap();

    let w = c.store().get(&id).unwrap();
    assert_eq!(w.pace_min_per_km(), Some(5.0));
    assert_eq!(w.coordinate(), at);
    assert_eq!(c.form(), FormState::Hidden);
    assert_eq!(c.map().live.len(), 1);
    assert_eq!(c.store().marker_count(), 1);
    let (_, label) = c.map().live.values().next().unwrap();
    assert!(label.text.starts_with("🏃‍♂️ Running on "));
    assert_eq!(c.list().ids(), vec![id]);
    assert_eq!(saved_count(c.blob_store()), 1);
}

#[test]
fn invalid_submit_alerts_and_keeps_form_open() {
    let mut c = started(MemoryBlobStore::new());
    let at = Coordinate::new(10.0, 10.0);
    c.on_map_click(at);

    let err = c.submit(&running("0", "25", "180")).unwrap_err();
    assert_matches!(err, WorkoutError::Validation { field: "distance", .. });
    let err = c.submit(&running("5", "25", "")).unwrap_err();
    assert_matches!(err, WorkoutError::Validation { field: "cadence", .. });

    assert_eq!(c.form(), FormState::Open { at });
    assert!(c.notifier().alerts[0].starts_with("Invalid input"));
    assert!(c.map().live.is_empty());
    assert!(c.list().rows.is_empty());
    assert_eq!(c.blob_store().get(WORKOUTS_KEY).unwrap(), None);
}

#[test]
fn non_numeric_input_is_rejected() {
    let mut c = started(MemoryBlobStore::new());
    c.on_map_click(HOME);
    let err = c.submit(&running("abc", "25", "180")).unwrap_err();
    assert_matches!(err, WorkoutError::Validation { field: "distance", .. });
    let err = c.submit(&cycling("20", "60", "steep")).unwrap_err();
    assert_matches!(err, WorkoutError::Validation { field: "elevation", .. });
    assert_eq!(c.notifier().alerts.len(), 2);
    assert!(c.store().is_empty());
}

#[test]
fn submit_without_open_form_is_refused() {
    let mut c = started(MemoryBlobStore::new());
    assert_eq!(
        c.submit(&running("5", "25", "180")),
        Err(WorkoutError::FormClosed)
    );
    assert!(c.store().is_empty());
}

#[test]
fn workouts_created_together_get_distinct_ids() {
    let mut c = started(MemoryBlobStore::new());
    let a = add(&mut c, HOME, &running("5", "25", "180"));
    let b = add(&mut c, HOME, &running("6", "30", "175"));
    let d = add(&mut c, HOME, &cycling("20", "60", "0"));
    assert_ne!(a, b);
    assert_ne!(b, d);
    assert_ne!(a, d);
    assert_eq!(c.store().len(), 3);
    assert_eq!(c.map().live.len(), 3);
}

#[test]
fn delete_removes_marker_row_and_saved_entry() {
    let mut c = started(MemoryBlobStore::new());
    let keep = add(&mut c, HOME, &running("5", "25", "180"));
    let gone = add(&mut c, Coordinate::new(48.8, 2.3), &cycling("30", "90", "-15"));

    c.delete(&gone).unwrap();

    assert!(!c.store().contains(&gone));
    assert_eq!(c.map().live.len(), 1);
    assert_eq!(c.list().ids(), vec![keep]);
    assert_eq!(saved_count(c.blob_store()), 1);

    assert_eq!(c.delete(&gone), Err(WorkoutError::NotFound(gone)));
}

#[test]
fn edit_recomputes_derived_metric() {
    let mut c = started(MemoryBlobStore::new());
    let id = add(&mut c, HOME, &running("5", "25", "180"));
    let markers_before: Vec<u32> = c.map().live.keys().copied().collect();

    c.begin_edit(&id).unwrap();
    assert_eq!(c.editing(), Some(&id));
    assert_eq!(c.list().editing, Some(id.clone()));

    let input = EditInput {
        distance: "10".into(),
        duration: "50".into(),
        extra: "190".into(),
    };
    c.confirm_edit(&id, &input).unwrap();

    let w = c.store().get(&id).unwrap();
    assert_eq!(w.distance_km(), 10.0);
    assert_eq!(w.pace_min_per_km(), Some(5.0));
    assert_eq!(w.cadence_spm(), Some(190.0));
    assert_eq!(c.editing(), None);
    assert_eq!(c.list().editing, None);
    assert_eq!(c.list().rows, vec![(id.clone(), 10.0)]);
    assert_eq!(c.map().live.keys().copied().collect::<Vec<_>>(), markers_before);

    let reloaded = started(c.blob_store().clone());
    assert_eq!(reloaded.store().get(&id).unwrap().distance_km(), 10.0);
}

#[test]
fn invalid_edit_leaves_workout_unchanged() {
    let mut c = started(MemoryBlobStore::new());
    let id = add(&mut c, HOME, &cycling("30", "90", "120"));
    c.begin_edit(&id).unwrap();

    let input = EditInput {
        distance: "-3".into(),
        duration: "90".into(),
        extra: "120".into(),
    };
    let err = c.confirm_edit(&id, &input).unwrap_err();
    assert!(err.is_validation());

    let w = c.store().get(&id).unwrap();
    assert_eq!(w.distance_km(), 30.0);
    assert_eq!(w.speed_kmh(), Some(20.0));
    assert_eq!(c.editing(), Some(&id));
    assert_eq!(c.notifier().alerts.len(), 1);

    c.cancel_edit(&id);
    assert_eq!(c.editing(), None);
    assert_eq!(c.list().editing, None);
}

#[test]
fn edit_of_unknown_workout_is_not_found() {
    let mut c = started(MemoryBlobStore::new());
    let ghost = WorkoutId::new("0000000001");
    assert_eq!(c.begin_edit(&ghost), Err(WorkoutError::NotFound(ghost.clone())));
    let input = EditInput {
        distance: "1".into(),
        duration: "1".into(),
        extra: "1".into(),
    };
    assert_eq!(
        c.confirm_edit(&ghost, &input),
        Err(WorkoutError::NotFound(ghost))
    );
    assert!(c.notifier().alerts.is_empty());
}

#[test]
fn sort_reorders_rows_without_touching_markers() {
    let mut c = started(MemoryBlobStore::new());
    let five = add(&mut c, HOME, &running("5", "25", "180"));
    let two = add(&mut c, HOME, &running("2", "40", "170"));
    let eight = add(&mut c, HOME, &cycling("8", "20", "10"));
    let markers: Vec<u32> = c.map().live.keys().copied().collect();

    c.sort(Some(SortOrder::new(SortKey::Distance, SortDirection::Ascending)));
    assert_eq!(c.list().ids(), vec![two.clone(), five.clone(), eight.clone()]);

    c.sort(Some(SortOrder::new(SortKey::Duration, SortDirection::Descending)));
    assert_eq!(c.list().ids(), vec![two.clone(), five.clone(), eight.clone()]);

    c.sort(Some(SortOrder::new(SortKey::Distance, SortDirection::Descending)));
    assert_eq!(c.list().ids(), vec![eight.clone(), five.clone(), two.clone()]);

    c.sort(None);
    assert_eq!(c.list().ids(), vec![five, two, eight]);
    assert_eq!(c.map().live.keys().copied().collect::<Vec<_>>(), markers);
}

#[test]
fn new_workout_lands_in_sorted_position() {
    let mut c = started(MemoryBlobStore::new());
    add(&mut c, HOME, &running("5", "25", "180"));
    c.sort(Some(SortOrder::new(SortKey::Distance, SortDirection::Ascending)));
    let short = add(&mut c, HOME, &running("1", "8", "180"));
    assert_eq!(c.list().ids()[0], short);
    assert_eq!(c.list().rows.len(), 2);
}

#[test]
fn delete_all_needs_confirmation() {
    let mut c = started(MemoryBlobStore::new());
    add(&mut c, HOME, &running("5", "25", "180"));
    add(&mut c, HOME, &cycling("30", "90", "0"));

    assert_eq!(c.delete_all(false), 0);
    assert_eq!(c.store().len(), 2);

    assert_eq!(c.delete_all(true), 2);
    assert!(c.store().is_empty());
    assert!(c.map().live.is_empty());
    assert!(c.list().rows.is_empty());
    assert_eq!(saved_count(c.blob_store()), 0);
}

#[test]
fn reset_wipes_storage() {
    let mut c = started(MemoryBlobStore::new());
    add(&mut c, HOME, &running("5", "25", "180"));
    assert_eq!(c.reset(), 1);
    assert_eq!(c.blob_store().get(WORKOUTS_KEY).unwrap(), None);
}

#[test]
fn restart_restores_workouts_and_markers() {
    let mut first = started(MemoryBlobStore::new());
    let run = add(&mut first, Coordinate::new(51.5, -0.1), &running("5", "25", "180"));
    let ride = add(&mut first, Coordinate::new(48.8, 2.3), &cycling("30", "90", "-15"));
    let saved = first.blob_store().clone();

    let second = started(saved);
    assert_eq!(second.store().len(), 2);
    assert_eq!(second.map().live.len(), 2);
    assert_eq!(second.list().ids(), vec![run.clone(), ride.clone()]);
    assert_eq!(
        second.store().get(&run).unwrap(),
        first.store().get(&run).unwrap()
    );
    assert_eq!(second.store().get(&ride).unwrap().speed_kmh(), Some(20.0));
}

#[test]
fn geolocation_failure_alerts_and_centers_on_latest_workout() {
    let mut first = started(MemoryBlobStore::new());
    add(&mut first, HOME, &running("5", "25", "180"));
    let latest = Coordinate::new(40.4, -3.7);
    add(&mut first, latest, &cycling("30", "90", "50"));

    let mut c = Controller::new(
        RecordingMap::default(),
        RecordingList::default(),
        first.blob_store().clone(),
        RecordingNotifier::default(),
    );
    c.start(&FixedLocator::default());

    assert_eq!(c.notifier().alerts, vec!["Could not get your location".to_string()]);
    assert_eq!(c.map().views.last().map(|v| v.0), Some(latest));
    assert_eq!(c.store().len(), 2);
}

#[test]
fn corrupt_saved_entries_are_skipped() {
    let mut blobs = MemoryBlobStore::new();
    blobs
        .set(
            WORKOUTS_KEY,
            r#"[
                {"id":"0000000042","date":"2024-04-14T09:30:00Z","coord":[51.5,-0.1],
                 "distance":5,"duration":25,"description":"Running on April 14",
                 "type":"running","cadence":180,"pace":99},
                {"id":"0000000043","type":"swimming"},
                {"id":"0000000044","date":"2024-04-15T09:30:00Z","coord":[51.5,-0.1],
                 "distance":-1,"duration":25,"description":"Running on April 15",
                 "type":"running","cadence":180,"pace":5}
            ]"#,
        )
        .unwrap();

    let c = started(blobs);
    assert_eq!(c.store().len(), 1);
    assert_eq!(c.map().live.len(), 1);
    let w = c.store().get(&WorkoutId::new("0000000042")).unwrap();
    assert_eq!(w.describe(), "Running on April 14");
    assert_eq!(w.pace_min_per_km(), Some(5.0));
}

#[test]
fn focus_pans_with_animation() {
    let mut c = started(MemoryBlobStore::new());
    let at = Coordinate::new(35.7, 139.7);
    let id = add(&mut c, at, &cycling("12", "30", "5"));
    c.focus(&id).unwrap();
    assert_eq!(
        c.map().views.last(),
        Some(&(at, 13, ViewOptions::animated()))
    );
    assert_matches!(
        c.focus(&WorkoutId::new("nope")),
        Err(WorkoutError::NotFound(_))
    );
}

#[test]
fn focus_on_unknown_workout_keeps_view() {
    let mut c = started(MemoryBlobStore::new());
    add(&mut c, Coordinate::new(35.7, 139.7), &cycling("12", "30", "5"));
    let views = c.map().views.len();

    let missing = WorkoutId::new("1700000000");
    assert_matches!(c.focus(&missing), Err(WorkoutError::NotFound(id)) if id == missing);
    assert_eq!(c.map().views.len(), views);
    assert!(c.notifier().alerts.is_empty());
}
