use crate::app::NO_FAVORITES_MESSAGE;
use crate::{App, InputMode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Render the favorites view: quick filter on top, saved recipes below
pub fn render_favorites(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    render_filter_input(frame, app, chunks[0]);
    render_favorites_list(frame, app, chunks[1]);
}

fn render_filter_input(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.input_mode == InputMode::FilteringFavorites;
    let style = if active {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    };

    let text = if app.favorites_filter.is_empty() && !active {
        Span::styled("press / to filter by name", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.favorites_filter.as_str())
    };

    let input = Paragraph::new(Line::from(text)).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Filter")
            .border_style(style),
    );
    frame.render_widget(input, area);
}

fn render_favorites_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let visible = app.visible_favorites();
    let title = format!("♥ My Favorite Recipes ({}/{})", visible.len(), app.favorites.len());

    let items: Vec<ListItem> = if app.favorites.is_empty() {
        vec![
            ListItem::new(Line::from(Span::styled(
                NO_FAVORITES_MESSAGE,
                Style::default().fg(Color::Gray),
            ))),
            ListItem::new(Line::from("")),
            ListItem::new(Line::from(Span::styled(
                "Press 'b' on any recipe to save it here",
                Style::default().fg(Color::Yellow),
            ))),
        ]
    } else if visible.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No favorites match the filter",
            Style::default().fg(Color::Gray),
        )))]
    } else {
        visible
            .iter()
            .enumerate()
            .map(|(idx, summary)| {
                let style = if idx == app.favorites_cursor {
                    Style::default().bg(Color::Rgb(68, 71, 90))
                } else {
                    Style::default()
                };

                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled("♥ ", style.fg(Color::Red)),
                        Span::styled(
                            summary.name.clone(),
                            style.fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", summary.subtitle()),
                        style.fg(Color::Gray),
                    )),
                ])
                .style(style)
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Rgb(249, 226, 175))),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(list, area, &mut app.favorites_state);
}
