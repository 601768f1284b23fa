// UI rendering logic
use crate::{App, InputMode, View};
use compass_core::Recipe;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

const ACCENT: Color = Color::Rgb(249, 115, 22);
const SELECTED_BG: Color = Color::Rgb(68, 71, 90);

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // View body
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.view {
        View::Home => render_home(frame, app, chunks[1]),
        View::Detail => render_detail(frame, app, chunks[1]),
        View::Favorites => crate::favorites_ui::render_favorites(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);

    if matches!(
        app.input_mode,
        InputMode::PickingCategory | InputMode::PickingArea
    ) {
        render_picker_popup(frame, app, frame.area());
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let tab = |label: &'static str, view: View| {
        if app.view == view {
            Span::styled(label, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(label, Style::default().fg(Color::Gray))
        }
    };

    let mut spans = vec![
        Span::styled(
            "🧭 Culinary Compass",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        tab("Home", View::Home),
        Span::raw("  "),
    ];
    // Only a tab while a recipe is open
    if app.view == View::Detail {
        spans.push(tab("Recipe", View::Detail));
        spans.push(Span::raw("  "));
    }
    spans.push(tab("Favorites", View::Favorites));
    spans.push(Span::styled(
        format!(" ({})", app.favorites.len()),
        Style::default().fg(Color::Yellow),
    ));

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_home(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search input
            Constraint::Length(1), // Selected filters
            Constraint::Min(3),    // Results
        ])
        .split(area);

    render_search_input(frame, app, chunks[0]);
    render_filter_line(frame, app, chunks[1]);

    let screen_width = area.width;
    let results_pct = if screen_width < 100 { 50 } else { 40 };
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(results_pct),
            Constraint::Percentage(100 - results_pct),
        ])
        .split(chunks[2]);

    render_results(frame, app, content_chunks[0]);

    let preview = app.selected_recipe().cloned();
    render_preview(frame, app, preview.as_ref(), content_chunks[1]);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let (style, title) = if app.input_mode == InputMode::Searching {
        (Style::default().fg(Color::Yellow), "Search (typing...)")
    } else {
        (Style::default(), "Search (press / to type)")
    };

    let text = if app.search_input.is_empty() && app.input_mode != InputMode::Searching {
        Span::styled(
            "Enter a dish or ingredient, or explore by selecting a filter.",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw(app.search_input.as_str())
    };

    let input = Paragraph::new(Line::from(text)).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(style),
    );

    frame.render_widget(input, area);
}

fn render_filter_line(frame: &mut Frame, app: &App, area: Rect) {
    let value = |v: &Option<String>| match v {
        Some(v) => Span::styled(v.clone(), Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        None => Span::styled("any", Style::default().fg(Color::DarkGray)),
    };

    let line = Line::from(vec![
        Span::styled(" Category: ", Style::default().fg(Color::Gray)),
        value(&app.query.category),
        Span::styled("   Area: ", Style::default().fg(Color::Gray)),
        value(&app.query.area),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.loading {
        "Loading...".to_string()
    } else if app.showing_suggestions {
        "Need some inspiration?".to_string()
    } else {
        format!("Results ({})", app.results.len())
    };

    let items: Vec<ListItem> = if app.results.is_empty() {
        let message = app
            .notice
            .clone()
            .unwrap_or_else(|| "Press / to search or c/a to pick a filter".to_string());
        vec![ListItem::new(Line::from(Span::styled(
            message,
            Style::default().fg(Color::Gray),
        )))]
    } else {
        app.results
            .iter()
            .enumerate()
            .map(|(idx, recipe)| {
                let style = if idx == app.selected_index {
                    Style::default().bg(SELECTED_BG)
                } else {
                    Style::default()
                };
                let marker = if app.is_favorited(&recipe.id) { "♥ " } else { "  " };

                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, style.fg(Color::Red)),
                        Span::styled(
                            recipe.name.clone(),
                            style.fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", recipe.subtitle()),
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
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_preview(frame: &mut Frame, app: &App, recipe: Option<&Recipe>, area: Rect) {
    let lines = match recipe {
        Some(recipe) => {
            let mut lines = recipe_header_lines(app, recipe);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{} ingredients", recipe.ingredients.len()),
                Style::default().fg(Color::Green),
            )));
            for ingredient in recipe.ingredients.iter().take(8) {
                lines.push(Line::from(format!("  • {}", ingredient)));
            }
            if recipe.ingredients.len() > 8 {
                lines.push(Line::from(Span::styled(
                    "  ...",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "ENTER: full recipe",
                Style::default().fg(Color::Yellow),
            )));
            lines
        }
        None => vec![Line::from(Span::styled(
            "Nothing selected",
            Style::default().fg(Color::Gray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Preview"))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn recipe_header_lines(app: &App, recipe: &Recipe) -> Vec<Line<'static>> {
    let mut title = vec![Span::styled(
        recipe.name.clone(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if app.is_favorited(&recipe.id) {
        title.push(Span::styled("  ♥ favorite", Style::default().fg(Color::Red)));
    }

    let mut lines = vec![
        Line::from(title),
        Line::from(Span::styled(recipe.subtitle(), Style::default().fg(Color::Gray))),
    ];
    if !recipe.tags.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Tags: ", Style::default().fg(Color::Gray)),
            Span::styled(recipe.tags.join(", "), Style::default().fg(Color::Magenta)),
        ]));
    }
    lines
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(recipe) = &app.detail else {
        let paragraph = Paragraph::new("Recipe not found.")
            .block(Block::default().borders(Borders::ALL).title("Recipe"));
        frame.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let mut left = recipe_header_lines(app, recipe);
    left.push(Line::from(""));
    left.push(Line::from(Span::styled(
        "Ingredients",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )));
    for ingredient in &recipe.ingredients {
        left.push(Line::from(format!("• {}", ingredient)));
    }
    left.push(Line::from(""));
    if let Some(video) = &recipe.youtube_url {
        left.push(Line::from(vec![
            Span::styled("Video: ", Style::default().fg(Color::Gray)),
            Span::styled(video.clone(), Style::default().fg(Color::Blue)),
        ]));
    }
    if let Some(source) = &recipe.source_url {
        left.push(Line::from(vec![
            Span::styled("Source: ", Style::default().fg(Color::Gray)),
            Span::styled(source.clone(), Style::default().fg(Color::Blue)),
        ]));
    }

    let summary = Paragraph::new(left)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recipe")
                .border_style(Style::default().fg(ACCENT)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(summary, chunks[0]);

    let instructions: Vec<Line> = recipe
        .instructions
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();

    let body = Paragraph::new(instructions)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Instructions (j/k to scroll)"),
        )
        .wrap(Wrap { trim: true })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(body, chunks[1]);
}

fn render_picker_popup(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.input_mode == InputMode::PickingArea {
        "Area"
    } else {
        "Category"
    };
    let selected = if app.input_mode == InputMode::PickingArea {
        app.query.area.as_deref()
    } else {
        app.query.category.as_deref()
    };

    let popup_width = 36.min(area.width);
    let popup_height = 16.min(area.height);
    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let options = app.picker_options();
    let items: Vec<ListItem> = if options.is_empty() {
        vec![ListItem::new(Span::styled(
            "No options loaded",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        // Keep the cursor inside the visible window
        let visible = popup_height.saturating_sub(2) as usize;
        let skip = app.picker_cursor.saturating_sub(visible.saturating_sub(1));

        options
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(idx, option)| {
                let mut style = Style::default();
                if Some(option.as_str()) == selected {
                    style = style.fg(Color::White).bg(ACCENT);
                }
                if idx == app.picker_cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                ListItem::new(Span::styled(format!(" {} ", option), style))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(list, popup_area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error_message {
        Span::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
        match app.input_mode {
            InputMode::Searching => Span::styled(
                "SEARCH MODE | ESC: normal mode | ENTER: search",
                Style::default().fg(Color::Yellow),
            ),
            InputMode::PickingCategory | InputMode::PickingArea => Span::styled(
                "PICK | j/k: navigate | ENTER: select/deselect | ESC: close",
                Style::default().fg(Color::Cyan),
            ),
            InputMode::FilteringFavorites => Span::styled(
                "FILTER | Type to filter favorites | ENTER/ESC: done",
                Style::default().fg(Color::Magenta),
            ),
            InputMode::Normal => match app.view {
                View::Home => Span::raw(
                    "j/k: navigate | /: search | c: category | a: area | x: clear filters | r: surprise me | b: favorite | f: favorites | o: video | q: quit",
                ),
                View::Detail => Span::raw(
                    "j/k: scroll | b: favorite | o: open video/source | ESC: back | q: quit",
                ),
                View::Favorites => Span::raw(
                    "j/k: navigate | /: filter | ENTER: open | b: remove | ESC: back | q: quit",
                ),
            },
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}
