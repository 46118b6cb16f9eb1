pub mod dialog;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{
    profile::{present_card, ProfileScreen, EMPTY_SCORES_MESSAGE, THANK_YOU_MESSAGE},
    ui::dialog::ConfirmDialog,
    App,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
/// Four text lines plus the border
const CARD_HEIGHT: u16 = 6;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Score cards
                Constraint::Length(5), // Statistics
                Constraint::Length(1), // Key hints
            ])
            .split(area);

        Paragraph::new(vec![
            Line::from(Span::styled("Profile", bold_style.fg(Color::Cyan))),
            Line::from("You are logged in to MathOff."),
            Line::from(Span::styled("Score history", bold_style)),
        ])
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        render_cards(self, chunks[1], buf);

        let stats = self.stats();
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(stats.total_games.to_string(), bold_style.fg(Color::Yellow)),
                Span::raw(" Games    "),
                Span::styled(stats.high_score.to_string(), bold_style.fg(Color::Yellow)),
                Span::raw(" High score"),
            ]),
            Line::from(""),
            Line::from(Span::styled(THANK_YOU_MESSAGE, dim_style)),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Your statistics"),
        )
        .render(chunks[2], buf);

        let hints = if ProfileScreen::clear_available(&self.scores) {
            "(r)clear list / (x)clear all / (l)og out / (q)uit"
        } else {
            "(l)og out / (q)uit"
        };
        Paragraph::new(Span::styled(hints, Style::default().add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        if let Some(action) = self.profile.pending {
            ConfirmDialog::new(action).render(area, buf);
        }
    }
}

fn render_cards(app: &App, area: Rect, buf: &mut Buffer) {
    let visible = app.scores.visible();

    if visible.is_empty() {
        Paragraph::new(EMPTY_SCORES_MESSAGE)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(area, buf);
        return;
    }

    let capacity = (area.height / CARD_HEIGHT).max(1) as usize;
    let offset = app.profile.scroll_offset.min(visible.len().saturating_sub(1));

    let cards: Vec<Rect> = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); capacity])
        .split(area)
        .to_vec();

    for (slot, (index, entry)) in cards
        .iter()
        .zip(visible.iter().enumerate().skip(offset))
    {
        let card = present_card(index, entry);
        Paragraph::new(vec![
            Line::from(card.detail),
            Line::from(card.operation),
            Line::from(Span::styled(
                card.score,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(card.title))
        .render(*slot, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ClearAction;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn rendered(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);

        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn test_app() -> App {
        App::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_renders_empty_profile() {
        let app = test_app();
        let text = rendered(&app, 80, 24);
        assert!(text.contains("Profile"));
        assert!(text.contains(EMPTY_SCORES_MESSAGE));
        assert!(text.contains("0 Games"));
        assert!(text.contains("0 High score"));
        assert!(!text.contains("(r)clear list"));
    }

    #[test]
    fn test_renders_cards_and_stats() {
        let mut app = test_app();
        let _ = app.scores.add_score(10, Some(2), Some("+".into()), None);
        let _ = app.scores.add_score(5, None, None, Some("timed".into()));

        let text = rendered(&app, 80, 30);
        assert!(text.contains("Game 1"));
        assert!(text.contains("Level: 2"));
        assert!(text.contains("Score: 10 points"));
        assert!(text.contains("Mode: timed"));
        assert!(text.contains("2 Games"));
        assert!(text.contains("10 High score"));
        assert!(text.contains("(r)clear list"));
    }

    #[test]
    fn test_scroll_offset_skips_cards() {
        let mut app = test_app();
        for p in 0..5 {
            let _ = app.scores.add_score(p, None, None, None);
        }
        app.profile.scroll_offset = 3;

        let text = rendered(&app, 80, 24);
        assert!(!text.contains("Game 1"));
        assert!(text.contains("Game 4"));
    }

    #[test]
    fn test_renders_confirmation_dialog() {
        let mut app = test_app();
        let _ = app.scores.add_score(1, None, None, None);
        app.profile.pending = Some(ClearAction::All);

        let text = rendered(&app, 100, 30);
        assert!(text.contains(ClearAction::All.title()));
        assert!(text.contains("Delete all"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let mut app = test_app();
        let _ = app.scores.add_score(1, None, None, None);
        app.profile.pending = Some(ClearAction::Recent);
        for (w, h) in [(1, 1), (10, 5), (20, 3)] {
            let _ = rendered(&app, w, h);
        }
    }
}
