use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::profile::ClearAction;

/// Modal confirmation shown before a clear runs
pub struct ConfirmDialog {
    action: ClearAction,
}

impl ConfirmDialog {
    pub fn new(action: ClearAction) -> Self {
        Self { action }
    }

    fn buttons(&self) -> String {
        format!("(y) {}   (n) Cancel", self.action.confirm_label())
    }

    /// Smallest box holding the title, message and buttons, clamped to `area`
    fn bounds(&self, area: Rect) -> Rect {
        let content_width = [
            self.action.title().width(),
            self.action.message().width(),
            self.buttons().width(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0) as u16;

        let width = (content_width + 4).min(area.width);
        let height = 7u16.min(area.height);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Widget for ConfirmDialog {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bounds = self.bounds(area);
        let accent = if self.action.is_destructive() {
            Color::Red
        } else {
            Color::Yellow
        };

        Clear.render(bounds, buf);
        Paragraph::new(vec![
            Line::from(""),
            Line::from(self.action.message()),
            Line::from(""),
            Line::from(Span::styled(
                self.buttons(),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .title(self.action.title()),
        )
        .render(bounds, buf);
    }
}
