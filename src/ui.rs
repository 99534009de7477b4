pub mod form;
pub mod list;
pub mod map;
pub mod overlay;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};

use crate::{
    app::{App, Focus},
    collection::SortOrder,
    controller::FormState,
    ui::{
        form::{FormView, FORM_HEIGHT},
        list::ListView,
        map::MapView,
        overlay::Popup,
    },
};

/// Screen regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub form: Option<Rect>,
    pub list: Rect,
    pub map: Rect,
    pub help: Rect,
}

pub fn layout(area: Rect, form_open: bool) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Min(20)])
        .split(rows[0]);

    let (form, list) = if form_open {
        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FORM_HEIGHT), Constraint::Min(0)])
            .split(columns[0]);
        (Some(sidebar[0]), sidebar[1])
    } else {
        (None, columns[0])
    };

    AppLayout {
        form,
        list,
        map: columns[1],
        help: rows[1],
    }
}

/// Drawable part of the map block, inside its border
pub fn map_inner(map: Rect) -> Rect {
    map.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

pub fn draw(app: &mut App, f: &mut Frame) {
    app.viewport = f.area();
    f.render_widget(&*app, f.area());
}

fn help_text(app: &App) -> &'static str {
    if app.is_form_open() {
        "tab next field · ←/→ workout type · enter save · esc cancel"
    } else if app.edit.is_some() {
        "tab next field · enter save · esc cancel"
    } else {
        match app.focus {
            Focus::Map => {
                "arrows move · enter/click add workout · +/- zoom · tab list · s sort · D delete all · q quit"
            }
            Focus::List => {
                "↑/↓ select · enter show on map · e edit · d delete · o browser · s sort · D delete all · tab map · q quit"
            }
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let form_open = self.is_form_open();
        let regions = layout(area, form_open);
        let controller = &self.controller;

        if let (Some(rect), FormState::Open { at }) = (regions.form, controller.form()) {
            FormView {
                draft: &self.form,
                at,
            }
            .render(rect, buf);
        }

        let list = controller.list();
        ListView {
            list,
            selected: if list.is_empty() {
                None
            } else {
                Some(self.selected)
            },
            edit: self.edit.as_ref(),
            title: format!(
                " workouts ({}) · {} ",
                list.len(),
                SortOrder::label(controller.order())
            ),
            focused: self.focus == Focus::List && !form_open,
        }
        .render(regions.list, buf);

        if list.is_empty() {
            Paragraph::new(Span::styled(
                "No workouts yet. Pick a spot on the map and press enter.",
                Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(
                regions.list.inner(Margin {
                    vertical: 2,
                    horizontal: 2,
                }),
                buf,
            );
        }

        MapView {
            map: controller.map(),
            focused: self.focus == Focus::Map && !form_open,
        }
        .render(regions.map, buf);

        Paragraph::new(Span::styled(
            help_text(self),
            Style::default().fg(Color::DarkGray),
        ))
        .render(regions.help, buf);

        if self.confirming_delete_all {
            Popup {
                title: " delete all ",
                message: "Are you sure you want to delete all workouts?",
                hint: "y to confirm · any other key to cancel",
                color: Color::Red,
            }
            .render(area, buf);
        }

        if let Some(message) = controller.notifier().current() {
            Popup {
                title: " alert ",
                message,
                hint: "press any key",
                color: Color::Yellow,
            }
            .render(area, buf);
        }
    }
}
