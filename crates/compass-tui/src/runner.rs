// TUI event loop and terminal management
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::{Action, App};
use compass_core::{browse, RecipeCatalog};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, warn};

/// How long to wait for a key before checking for favorites changes
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct TuiOptions {
    pub suggestions: usize,
    pub mouse_enabled: bool,
}

pub async fn run_tui(
    mut app: App,
    catalog: Arc<dyn RecipeCatalog>,
    options: TuiOptions,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if options.mouse_enabled {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, catalog.as_ref(), &options).await;

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    if options.mouse_enabled {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    catalog: &dyn RecipeCatalog,
    options: &TuiOptions,
) -> anyhow::Result<()> {
    // Filter pickers and the first suggestions
    app.loading = true;
    terminal.draw(|f| crate::ui::render(f, app))?;

    match browse::filter_options(catalog).await {
        Ok(filter_options) => app.set_filter_options(filter_options),
        Err(e) => warn!("Failed to fetch filter options: {}", e),
    }
    perform(app, catalog, Action::Suggest, options).await;

    loop {
        app.sync_favorites();
        terminal.draw(|f| crate::ui::render(f, app))?;

        // Poll so favorites toggled elsewhere show up without a key press
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if let Some(action) = app.handle_key(key) {
                // Show the loading state before blocking on the network
                terminal.draw(|f| crate::ui::render(f, app))?;
                perform(app, catalog, action, options).await;
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn perform(app: &mut App, catalog: &dyn RecipeCatalog, action: Action, options: &TuiOptions) {
    debug!("Performing {:?}", action);

    match action {
        Action::Browse => {
            let result = browse::browse(catalog, &app.query).await;
            match result {
                Ok(outcome) => app.set_results(outcome),
                Err(e) => app.set_error(e.user_message()),
            }
        }
        Action::Suggest => match browse::suggestions(catalog, options.suggestions).await {
            Ok(recipes) => app.set_suggestions(recipes),
            Err(e) => {
                // Suggestions are decoration; keep the screen usable
                warn!("Failed to fetch random suggestions: {}", e);
                app.loading = false;
            }
        },
        Action::OpenRecipe(id) => match catalog.find_by_id(&id).await {
            Ok(recipe) => app.show_detail(recipe),
            Err(e) => app.set_error(e.user_message()),
        },
        Action::OpenLink(url) => {
            if let Err(e) = open::that(&url) {
                app.set_error(format!("Failed to open browser: {}", e));
            }
        }
    }
}
