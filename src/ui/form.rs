use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::app::{FormDraft, FormField};
use crate::ui::map::kind_color;
use crate::workout::{Coordinate, WorkoutKind};

/// Height of the form including borders
pub const FORM_HEIGHT: u16 = 6;

/// New-workout form; only the extra field matching the kind is shown
pub struct FormView<'a> {
    pub draft: &'a FormDraft,
    pub at: Coordinate,
}

fn label_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn value_span(value: &str, active: bool) -> Span<'static> {
    let shown = if value.is_empty() && !active {
        "--".to_string()
    } else if active {
        format!("{value}▏")
    } else {
        value.to_string()
    };
    let style = if active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Span::styled(format!("{shown:<8}"), style)
}

impl Widget for FormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let draft = self.draft;
        let input = &draft.input;
        let kind = input.kind;
        let (extra_label, extra_value, extra_unit) = match kind {
            WorkoutKind::Running => ("Cadence ", &input.cadence, "step/min"),
            WorkoutKind::Cycling => ("Elev Gain", &input.elevation, "meters"),
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Type     ", label_style(draft.field == FormField::Kind)),
                Span::styled(
                    format!("◂ {} ▸", kind.label()),
                    Style::default().fg(kind_color(kind)).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Distance ", label_style(draft.field == FormField::Distance)),
                value_span(&input.distance, draft.field == FormField::Distance),
                Span::raw(" km"),
            ]),
            Line::from(vec![
                Span::styled("Duration ", label_style(draft.field == FormField::Duration)),
                value_span(&input.duration, draft.field == FormField::Duration),
                Span::raw(" min"),
            ]),
            Line::from(vec![
                Span::styled(
                    format!("{extra_label:<9}"),
                    label_style(draft.field == FormField::Extra),
                ),
                value_span(extra_value, draft.field == FormField::Extra),
                Span::raw(format!(" {extra_unit}")),
            ]),
        ];

        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(format!(" new workout at {} ", self.at)),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(draft: &FormDraft) -> String {
        let area = Rect::new(0, 0, 50, FORM_HEIGHT);
        let mut buf = Buffer::empty(area);
        FormView {
            draft,
            at: Coordinate::new(51.5, -0.1),
        }
        .render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn kind_selects_extra_field() {
        let mut draft = FormDraft::new(WorkoutKind::Running);
        assert!(rendered(&draft).contains("Cadence"));
        assert!(!rendered(&draft).contains("Elev Gain"));

        draft.toggle_kind();
        assert!(rendered(&draft).contains("Elev Gain"));
        assert!(!rendered(&draft).contains("Cadence"));
    }
}
