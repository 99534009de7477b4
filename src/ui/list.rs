use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, List, ListItem, ListState, StatefulWidget},
};
use unicode_width::UnicodeWidthChar;

use crate::app::{EditDraft, EditField};
use crate::surface::ListSink;
use crate::ui::map::kind_color;
use crate::workout::{Workout, WorkoutId, WorkoutKind};

/// Display values of one workout row
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub id: WorkoutId,
    pub kind: WorkoutKind,
    pub title: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub metric: String,
    pub metric_unit: &'static str,
    pub extra: f64,
    pub editing: bool,
}

impl ListRow {
    fn from_workout(workout: &Workout) -> Self {
        let (metric, metric_unit) = workout.metric_display();
        Self {
            id: workout.id().clone(),
            kind: workout.kind(),
            title: workout.describe().to_string(),
            distance_km: workout.distance_km(),
            duration_min: workout.duration_min(),
            metric,
            metric_unit,
            extra: workout.activity().extra(),
            editing: false,
        }
    }
}

/// Rows in display order, addressed by workout id
#[derive(Debug, Default)]
pub struct TerminalList {
    rows: Vec<ListRow>,
}

impl TerminalList {
    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, id: &WorkoutId) -> Option<usize> {
        self.rows.iter().position(|r| &r.id == id)
    }

    fn row_mut(&mut self, id: &WorkoutId) -> Option<&mut ListRow> {
        self.rows.iter_mut().find(|r| &r.id == id)
    }
}

impl ListSink for TerminalList {
    fn render(&mut self, workout: &Workout) {
        self.rows.push(ListRow::from_workout(workout));
    }

    fn update(&mut self, workout: &Workout) {
        match self.row_mut(workout.id()) {
            Some(row) => {
                let editing = row.editing;
                *row = ListRow::from_workout(workout);
                row.editing = editing;
            }
            None => log::warn!("no list row for workout {}", workout.id()),
        }
    }

    fn remove(&mut self, id: &WorkoutId) {
        self.rows.retain(|r| &r.id != id);
    }

    fn set_editing(&mut self, id: &WorkoutId, editing: bool) {
        if let Some(row) = self.row_mut(id) {
            row.editing = editing;
        }
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Cut `text` to at most `max` terminal columns
pub fn fit_width(text: &str, max: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

fn format_amount(v: f64) -> String {
    if (v - v.round()).abs() < f64::EPSILON {
        format!("{}", v.round())
    } else {
        format!("{v:.2}")
    }
}

fn extra_parts(kind: WorkoutKind) -> (&'static str, &'static str) {
    match kind {
        WorkoutKind::Running => ("🦶🏼", "spm"),
        WorkoutKind::Cycling => ("⛰", "m"),
    }
}

fn field_span(text: &str, active: bool) -> Span<'static> {
    let style = if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };
    Span::styled(format!("{text:<6}"), style)
}

fn row_lines(row: &ListRow, edit: Option<&EditDraft>, width: usize) -> Vec<Line<'static>> {
    let color = kind_color(row.kind);
    let title = Line::from(Span::styled(
        fit_width(&row.title, width),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    let (extra_icon, extra_unit) = extra_parts(row.kind);

    let details = match edit.filter(|d| d.id == row.id && row.editing) {
        Some(draft) => Line::from(vec![
            Span::raw(format!("{} ", row.kind.icon())),
            field_span(&draft.input.distance, draft.field == EditField::Distance),
            Span::raw(" km  ⏱ "),
            field_span(&draft.input.duration, draft.field == EditField::Duration),
            Span::raw(format!(" min  {extra_icon} ")),
            field_span(&draft.input.extra, draft.field == EditField::Extra),
            Span::raw(format!(" {extra_unit}")),
        ]),
        None => Line::from(vec![
            Span::raw(format!(
                "{} {} km  ⏱ {} min  ⚡️ {} {}  {} {} {}",
                row.kind.icon(),
                format_amount(row.distance_km),
                format_amount(row.duration_min),
                row.metric,
                row.metric_unit,
                extra_icon,
                format_amount(row.extra),
                extra_unit,
            )),
        ]),
    };

    vec![title, details, Line::raw("")]
}

/// Workout list with selection and inline editing
pub struct ListView<'a> {
    pub list: &'a TerminalList,
    pub selected: Option<usize>,
    pub edit: Option<&'a EditDraft>,
    pub title: String,
    pub focused: bool,
}

impl ListView<'_> {
    pub fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .list
            .rows()
            .iter()
            .map(|row| ListItem::new(row_lines(row, self.edit, width)))
            .collect();

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let list = List::new(items)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(border_style)
                    .title(self.title),
            )
            .highlight_symbol("▌")
            .highlight_style(Style::default().bg(Color::Rgb(45, 52, 57)));

        let mut state = ListState::default().with_selected(self.selected);
        StatefulWidget::render(list, area, buf, &mut state);
    }
}
