use crate::collection::{Collection, SortOrder};
use crate::error::WorkoutError;
use crate::persistence::{BlobStore, PersistenceBridge};
use crate::surface::{ListSink, Locator, MapSurface, MarkerLabel, Notifier, ViewOptions};
use crate::workout::{Coordinate, Workout, WorkoutId, WorkoutKind};

/// Default map zoom when centering on a position
pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormState {
    Hidden,
    /// Open for a workout at the clicked coordinate
    Open { at: Coordinate },
}

/// Raw text of the new-workout form
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl FormInput {
    pub fn new(kind: WorkoutKind) -> Self {
        Self {
            kind,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
        }
    }

    /// Text of the field that applies to the selected kind
    pub fn extra(&self) -> &str {
        match self.kind {
            WorkoutKind::Running => &self.cadence,
            WorkoutKind::Cycling => &self.elevation,
        }
    }
}

/// Raw text of an inline edit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditInput {
    pub distance: String,
    pub duration: String,
    /// cadence or elevation, depending on the workout
    pub extra: String,
}

impl EditInput {
    /// Prefilled with the workout's current values
    pub fn for_workout(workout: &Workout) -> Self {
        Self {
            distance: workout.distance_km().to_string(),
            duration: workout.duration_min().to_string(),
            extra: workout.activity().extra().to_string(),
        }
    }
}

/// Reads a numeric field. Blank reads as zero and anything unparsable as NaN,
/// both of which fail validation downstream.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        0.0
    } else {
        text.parse().unwrap_or(f64::NAN)
    }
}

/// Turns user actions into collection changes and keeps the map, the list and
/// the blob store in step with the collection.
pub struct Controller<M: MapSurface, L, B, N> {
    store: Collection<M::Handle>,
    bridge: PersistenceBridge<B>,
    map: M,
    list: L,
    notifier: N,
    form: FormState,
    order: Option<SortOrder>,
    editing: Option<WorkoutId>,
    zoom: u8,
}

impl<M, L, B, N> Controller<M, L, B, N>
where
    M: MapSurface,
    L: ListSink,
    B: BlobStore,
    N: Notifier,
{
    pub fn new(map: M, list: L, blobs: B, notifier: N) -> Self {
        Self {
            store: Collection::new(),
            bridge: PersistenceBridge::new(blobs),
            map,
            list,
            notifier,
            form: FormState::Hidden,
            order: None,
            editing: None,
            zoom: DEFAULT_ZOOM,
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Load saved workouts, place their markers and list rows, then center
    /// the map on the user if a position is available.
    pub fn start(&mut self, locator: &dyn Locator) {
        for handle in self.store.clear() {
            self.map.remove_marker(handle);
        }
        self.list.clear();
        self.editing = None;

        let map = &mut self.map;
        self.store = self
            .bridge
            .load(|w| map.add_marker(w.coordinate(), MarkerLabel::for_workout(w)));
        self.render_list();
        log::info!("loaded {} saved workouts", self.store.len());

        match locator.locate() {
            Ok(here) => self.map.set_view(here, self.zoom, ViewOptions::default()),
            Err(e) => {
                log::warn!("geolocation failed: {e}");
                self.notifier.alert(&e.to_string());
                if let Some(latest) = self.store.iter().last() {
                    self.map
                        .set_view(latest.coordinate(), self.zoom, ViewOptions::default());
                }
            }
        }
    }

    pub fn on_map_click(&mut self, at: Coordinate) {
        log::debug!("map clicked at {at}");
        self.form = FormState::Open { at };
    }

    pub fn cancel_form(&mut self) {
        self.form = FormState::Hidden;
    }

    pub fn submit(&mut self, input: &FormInput) -> Result<WorkoutId, WorkoutError> {
        let at = match self.form {
            FormState::Open { at } => at,
            FormState::Hidden => {
                log::debug!("submit ignored: form is hidden");
                return Err(WorkoutError::FormClosed);
            }
        };

        let created = Workout::create(
            input.kind,
            at,
            parse_number(&input.distance),
            parse_number(&input.duration),
            parse_number(input.extra()),
        );
        let mut workout = match created {
            Ok(w) => w,
            Err(e) => {
                self.notifier.alert(&format!("Invalid input: {e}"));
                return Err(e);
            }
        };

        while self.store.contains(workout.id()) {
            let next = workout.id().successor();
            workout.reassign_id(next);
        }

        let id = workout.id().clone();
        let marker = self
            .map
            .add_marker(workout.coordinate(), MarkerLabel::for_workout(&workout));
        if let Err(e) = self.store.add(workout, marker) {
            log::error!("new workout rejected: {e}");
            return Err(e);
        }

        self.form = FormState::Hidden;
        self.persist();
        if self.order.is_some() {
            self.render_list();
        } else if let Some(w) = self.store.get(&id) {
            self.list.render(w);
        }
        log::info!("added workout {id}");
        Ok(id)
    }

    pub fn delete(&mut self, id: &WorkoutId) -> Result<(), WorkoutError> {
        let (_, marker) = self.store.remove(id).inspect_err(|e| {
            log::error!("delete failed: {e}");
        })?;
        self.map.remove_marker(marker);
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        self.persist();
        self.list.remove(id);
        log::info!("deleted workout {id}");
        Ok(())
    }

    pub fn begin_edit(&mut self, id: &WorkoutId) -> Result<(), WorkoutError> {
        if !self.store.contains(id) {
            log::error!("edit requested for unknown workout {id}");
            return Err(WorkoutError::NotFound(id.clone()));
        }
        if let Some(previous) = self.editing.take() {
            self.list.set_editing(&previous, false);
        }
        self.list.set_editing(id, true);
        self.editing = Some(id.clone());
        Ok(())
    }

    pub fn cancel_edit(&mut self, id: &WorkoutId) {
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        self.list.set_editing(id, false);
    }

    pub fn confirm_edit(&mut self, id: &WorkoutId, input: &EditInput) -> Result<(), WorkoutError> {
        let edited = self.store.edit(
            id,
            parse_number(&input.distance),
            parse_number(&input.duration),
            parse_number(&input.extra),
        );
        let updated = match edited {
            Ok(w) => w.clone(),
            Err(e) if e.is_validation() => {
                self.notifier.alert(&format!("Invalid input: {e}"));
                return Err(e);
            }
            Err(e) => {
                log::error!("edit failed: {e}");
                return Err(e);
            }
        };

        self.persist();
        self.editing = None;
        if self.order.is_some() {
            self.render_list();
        } else {
            self.list.update(&updated);
            self.list.set_editing(id, false);
        }
        log::info!("edited workout {id}");
        Ok(())
    }

    /// Re-render the list in the given order. Markers are not touched.
    pub fn sort(&mut self, order: Option<SortOrder>) {
        self.order = order;
        self.render_list();
    }

    /// Remove every workout once the user has confirmed. Returns how many went.
    pub fn delete_all(&mut self, confirmed: bool) -> usize {
        if !confirmed {
            return 0;
        }
        let markers = self.store.clear();
        let removed = markers.len();
        for handle in markers {
            self.map.remove_marker(handle);
        }
        self.editing = None;
        self.persist();
        self.list.clear();
        log::info!("deleted all {removed} workouts");
        removed
    }

    /// Wipe the blob store and everything shown
    pub fn reset(&mut self) -> usize {
        let removed = self.delete_all(true);
        if let Err(e) = self.bridge.reset() {
            log::warn!("could not reset storage: {e}");
        }
        removed
    }

    /// Pan the map to a workout
    pub fn focus(&mut self, id: &WorkoutId) -> Result<(), WorkoutError> {
        let at = self
            .store
            .get(id)
            .map(|w| w.coordinate())
            .ok_or_else(|| WorkoutError::NotFound(id.clone()))
            .inspect_err(|e| {
                log::error!("focus failed: {e}");
            })?;
        self.map.set_view(at, self.zoom, ViewOptions::animated());
        Ok(())
    }

    fn render_list(&mut self) {
        self.list.clear();
        for w in self.store.ordered(self.order) {
            self.list.render(w);
        }
        if let Some(id) = &self.editing {
            self.list.set_editing(id, true);
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.bridge.save(&self.store) {
            log::warn!("could not save workouts: {e}");
        }
    }

    /// Workouts in the current display order
    pub fn workouts(&self) -> Vec<&Workout> {
        self.store.ordered(self.order)
    }

    pub fn store(&self) -> &Collection<M::Handle> {
        &self.store
    }

    pub fn blob_store(&self) -> &B {
        self.bridge.store()
    }

    pub fn form(&self) -> FormState {
        self.form
    }

    pub fn order(&self) -> Option<SortOrder> {
        self.order
    }

    pub fn editing(&self) -> Option<&WorkoutId> {
        self.editing.as_ref()
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}
