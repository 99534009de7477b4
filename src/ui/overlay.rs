use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Clear, Paragraph, Widget, Wrap},
};

use crate::surface::Notifier;

/// Holds the alert currently shown over the UI until a key dismisses it
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    current: Option<String>,
}

impl TerminalNotifier {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }
}

impl Notifier for TerminalNotifier {
    fn alert(&mut self, message: &str) {
        log::debug!("alert: {message}");
        self.current = Some(message.to_string());
    }
}

/// Rect of the given size centered in `area`, shrunk to fit
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Modal box with a message and a hint line
pub struct Popup<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub hint: &'a str,
    pub color: Color,
}

impl Widget for Popup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rect = centered(area, 52, 7);
        Clear.render(rect, buf);
        Paragraph::new(vec![
            Line::raw(self.message),
            Line::raw(""),
            Line::styled(self.hint, Style::default().add_modifier(Modifier::DIM)),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::bordered()
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(self.color))
                .title(self.title),
        )
        .render(rect, buf);
    }
}
