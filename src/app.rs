use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use std::time::Duration;
use webbrowser::Browser;

use crate::collection::SortOrder;
use crate::controller::{Controller, EditInput, FormInput, FormState};
use crate::error::WorkoutError;
use crate::persistence::BlobStore;
use crate::runtime::AppEvent;
use crate::surface::{Locator, Notifier};
use crate::ui::{self, list::TerminalList, map::TerminalMap, overlay::TerminalNotifier};
use crate::workout::{Coordinate, Workout, WorkoutId, WorkoutKind};

pub type TerminalController =
    Controller<TerminalMap, TerminalList, Box<dyn BlobStore>, TerminalNotifier>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Map,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Kind,
    Distance,
    Duration,
    Extra,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Kind => FormField::Distance,
            FormField::Distance => FormField::Duration,
            FormField::Duration => FormField::Extra,
            FormField::Extra => FormField::Kind,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Kind => FormField::Extra,
            FormField::Distance => FormField::Kind,
            FormField::Duration => FormField::Distance,
            FormField::Extra => FormField::Duration,
        }
    }
}

/// Text typed into the new-workout form
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub input: FormInput,
    pub field: FormField,
}

impl FormDraft {
    pub fn new(kind: WorkoutKind) -> Self {
        Self {
            input: FormInput::new(kind),
            field: FormField::Distance,
        }
    }

    /// Swap between the cadence and elevation fields
    pub fn toggle_kind(&mut self) {
        self.input.kind = self.input.kind.toggle();
    }

    /// Empty every value but keep the selected kind
    pub fn clear_values(&mut self) {
        *self = Self::new(self.input.kind);
    }

    fn active_text(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Kind => None,
            FormField::Distance => Some(&mut self.input.distance),
            FormField::Duration => Some(&mut self.input.duration),
            FormField::Extra => Some(match self.input.kind {
                WorkoutKind::Running => &mut self.input.cadence,
                WorkoutKind::Cycling => &mut self.input.elevation,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Distance,
    Duration,
    Extra,
}

/// Inline edit of one list row
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    pub id: WorkoutId,
    pub input: EditInput,
    pub field: EditField,
}

impl EditDraft {
    fn active_text(&mut self) -> &mut String {
        match self.field {
            EditField::Distance => &mut self.input.distance,
            EditField::Duration => &mut self.input.duration,
            EditField::Extra => &mut self.input.extra,
        }
    }

    fn cycle(&mut self, forward: bool) {
        use EditField::*;
        self.field = match (self.field, forward) {
            (Distance, true) | (Extra, false) => Duration,
            (Duration, true) | (Distance, false) => Extra,
            (Extra, true) | (Duration, false) => Distance,
        };
    }
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}

/// OpenStreetMap link for a coordinate
pub fn osm_url(at: Coordinate, zoom: u8) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat:.5}&mlon={lng:.5}#map={zoom}/{lat:.5}/{lng:.5}",
        lat = at.lat,
        lng = at.lng,
    )
}

/// Terminal front end state: controller plus the input state around it
pub struct App {
    pub controller: TerminalController,
    pub focus: Focus,
    pub form: FormDraft,
    pub edit: Option<EditDraft>,
    pub selected: usize,
    pub confirming_delete_all: bool,
    /// Terminal area of the last draw, used to place mouse clicks
    pub viewport: Rect,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: TerminalController, default_kind: WorkoutKind) -> Self {
        Self {
            controller,
            focus: Focus::Map,
            form: FormDraft::new(default_kind),
            edit: None,
            selected: 0,
            confirming_delete_all: false,
            viewport: Rect::default(),
            should_quit: false,
        }
    }

    pub fn start(&mut self, locator: &dyn Locator) {
        self.controller.start(locator);
        self.selected = 0;
        if !self.controller.list().is_empty() {
            self.focus = Focus::List;
        }
    }

    pub fn is_form_open(&self) -> bool {
        matches!(self.controller.form(), FormState::Open { .. })
    }

    pub fn selected_id(&self) -> Option<WorkoutId> {
        self.controller
            .list()
            .rows()
            .get(self.selected)
            .map(|r| r.id.clone())
    }

    pub fn selected_workout(&self) -> Option<&Workout> {
        let id = self.selected_id()?;
        self.controller.store().get(&id)
    }

    fn select(&mut self, id: &WorkoutId) {
        if let Some(pos) = self.controller.list().position(id) {
            self.selected = pos;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.list().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn on_event(&mut self, event: AppEvent, tick: Duration) {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Mouse(mouse) => self.on_mouse(mouse),
            AppEvent::Resize => {}
            AppEvent::Tick => self.on_tick(tick),
        }
    }

    pub fn on_tick(&mut self, dt: Duration) {
        self.controller.map_mut().advance(dt);
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.controller.notifier_mut().dismiss() {
            return;
        }
        if self.confirming_delete_all {
            self.confirming_delete_all = false;
            let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
            self.controller.delete_all(confirmed);
            self.edit = None;
            self.clamp_selection();
            return;
        }
        if self.is_form_open() {
            self.on_form_key(key);
            return;
        }
        if self.edit.is_some() {
            self.on_edit_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Map => Focus::List,
                    Focus::List => Focus::Map,
                }
            }
            KeyCode::Char('s') => {
                let keep = self.selected_id();
                self.controller
                    .sort(SortOrder::cycle(self.controller.order()));
                match keep {
                    Some(id) => self.select(&id),
                    None => self.selected = 0,
                }
            }
            KeyCode::Char('D') => {
                if !self.controller.store().is_empty() {
                    self.confirming_delete_all = true;
                }
            }
            _ => match self.focus {
                Focus::Map => self.on_map_key(key),
                Focus::List => self.on_list_key(key),
            },
        }
    }

    fn on_map_key(&mut self, key: KeyEvent) {
        let map = self.controller.map_mut();
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => map.move_cursor(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => map.move_cursor(1, 0),
            KeyCode::Up | KeyCode::Char('k') => map.move_cursor(0, 1),
            KeyCode::Down | KeyCode::Char('j') => map.move_cursor(0, -1),
            KeyCode::Char('+') | KeyCode::Char('=') => map.zoom_in(),
            KeyCode::Char('-') => map.zoom_out(),
            KeyCode::Enter | KeyCode::Char('a') => {
                let at = map.cursor();
                self.controller.on_map_click(at);
            }
            _ => {}
        }
    }

    fn on_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    let _ = self.controller.focus(&id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    let _ = self.controller.delete(&id);
                    self.clamp_selection();
                }
            }
            KeyCode::Char('e') => {
                let Some(workout) = self.selected_workout() else {
                    return;
                };
                let draft = EditDraft {
                    id: workout.id().clone(),
                    input: EditInput::for_workout(workout),
                    field: EditField::Distance,
                };
                if self.controller.begin_edit(&draft.id).is_ok() {
                    self.edit = Some(draft);
                }
            }
            KeyCode::Char('o') => self.open_selected_in_browser(),
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.controller.cancel_form();
                self.form.clear_values();
            }
            KeyCode::Enter => {
                if let Ok(id) = self.controller.submit(&self.form.input) {
                    self.form.clear_values();
                    self.focus = Focus::List;
                    self.select(&id);
                }
            }
            KeyCode::Tab | KeyCode::Down => self.form.field = self.form.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.field = self.form.field.prev(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if self.form.field == FormField::Kind =>
            {
                self.form.toggle_kind()
            }
            KeyCode::Char(c) if is_numeric_char(c) => {
                if let Some(text) = self.form.active_text() {
                    text.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(text) = self.form.active_text() {
                    text.pop();
                }
            }
            _ => {}
        }
    }

    fn on_edit_key(&mut self, key: KeyEvent) {
        let Some(draft) = self.edit.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                let id = draft.id.clone();
                self.controller.cancel_edit(&id);
                self.edit = None;
            }
            KeyCode::Enter => {
                let id = draft.id.clone();
                match self.controller.confirm_edit(&id, &draft.input) {
                    Ok(()) => {
                        self.edit = None;
                        self.select(&id);
                    }
                    Err(WorkoutError::NotFound(_)) => self.edit = None,
                    Err(_) => {}
                }
            }
            KeyCode::Tab | KeyCode::Right => draft.cycle(true),
            KeyCode::BackTab | KeyCode::Left => draft.cycle(false),
            KeyCode::Char(c) if is_numeric_char(c) => draft.active_text().push(c),
            KeyCode::Backspace => {
                draft.active_text().pop();
            }
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        let map_area = ui::map_inner(ui::layout(self.viewport, self.is_form_open()).map);
        let Some(at) = self
            .controller
            .map()
            .coordinate_at(map_area, mouse.column, mouse.row)
        else {
            return;
        };

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.controller.notifier_mut().dismiss()
                    || self.confirming_delete_all
                    || self.edit.is_some()
                {
                    return;
                }
                self.focus = Focus::Map;
                self.controller.map_mut().set_cursor(at);
                self.controller.on_map_click(at);
            }
            MouseEventKind::ScrollUp => self.controller.map_mut().zoom_in(),
            MouseEventKind::ScrollDown => self.controller.map_mut().zoom_out(),
            _ => {}
        }
    }

    fn open_selected_in_browser(&mut self) {
        let Some(at) = self.selected_workout().map(|w| w.coordinate()) else {
            return;
        };
        let url = osm_url(at, self.controller.zoom());
        if !Browser::is_available() {
            self.controller
                .notifier_mut()
                .alert(&format!("No browser available for {url}"));
            return;
        }
        if let Err(e) = webbrowser::open(&url) {
            log::warn!("could not open {url}: {e}");
            self.controller
                .notifier_mut()
                .alert(&format!("Could not open browser: {e}"));
        }
    }
}
