// TUI application state and key handling
use std::sync::Arc;

use compass_core::{
    browse::{BrowseOutcome, BrowseQuery, FilterOptions},
    FavoritesSet, FavoritesStore, Recipe, RecipeSummary,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::ListState;
use tokio::sync::watch;
use tracing::debug;

pub const NO_FAVORITES_MESSAGE: &str = "You haven't saved any favorites yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,      // Search box, filters, results or suggestions
    Detail,    // One full recipe
    Favorites, // Saved recipes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,             // Navigating
    Searching,          // Typing in search box
    PickingCategory,    // Category popup open
    PickingArea,        // Area popup open
    FilteringFavorites, // Typing the favorites quick filter
}

/// Work the runner does on the app's behalf: network calls and the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Browse,
    Suggest,
    OpenRecipe(String),
    OpenLink(String),
}

pub struct App {
    pub should_quit: bool,
    pub view: View,
    pub input_mode: InputMode,
    pub search_input: String,
    pub query: BrowseQuery,
    pub filter_options: FilterOptions,
    pub picker_cursor: usize,
    pub results: Vec<Recipe>,
    pub showing_suggestions: bool,
    pub selected_index: usize,
    pub list_state: ListState,
    pub detail: Option<Recipe>,
    pub detail_scroll: u16,
    // Where Esc goes from the detail view
    back_view: View,
    pub favorites: FavoritesSet,
    pub favorites_filter: String,
    pub favorites_cursor: usize,
    pub favorites_state: ListState,
    pub loading: bool,
    pub notice: Option<String>,
    pub error_message: Option<String>,
    store: Arc<FavoritesStore>,
    updates: watch::Receiver<FavoritesSet>,
}

impl App {
    pub fn new(store: Arc<FavoritesStore>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        let mut favorites_state = ListState::default();
        favorites_state.select(Some(0));

        let mut updates = store.subscribe();
        let favorites = updates.borrow_and_update().clone();

        Self {
            should_quit: false,
            view: View::Home,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            query: BrowseQuery::new(),
            filter_options: FilterOptions::default(),
            picker_cursor: 0,
            results: Vec::new(),
            showing_suggestions: false,
            selected_index: 0,
            list_state,
            detail: None,
            detail_scroll: 0,
            back_view: View::Home,
            favorites,
            favorites_filter: String::new(),
            favorites_cursor: 0,
            favorites_state,
            loading: false,
            notice: None,
            error_message: None,
            store,
            updates,
        }
    }

    /// Pick up favorites changes from any writer. Returns true if the list changed.
    pub fn sync_favorites(&mut self) -> bool {
        if !self.updates.has_changed().unwrap_or(false) {
            return false;
        }
        self.favorites = self.updates.borrow_and_update().clone();

        let visible = self.visible_favorites().len();
        if self.favorites_cursor >= visible {
            self.favorites_cursor = visible.saturating_sub(1);
        }
        self.favorites_state.select(Some(self.favorites_cursor));
        true
    }

    pub fn is_favorited(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn selected_recipe(&self) -> Option<&Recipe> {
        self.results.get(self.selected_index)
    }

    /// Favorites that pass the quick filter, in saved order
    pub fn visible_favorites(&self) -> Vec<&RecipeSummary> {
        self.favorites.matching(&self.favorites_filter)
    }

    pub fn selected_favorite(&self) -> Option<&RecipeSummary> {
        self.visible_favorites().get(self.favorites_cursor).copied()
    }

    /// Options shown by whichever picker is open
    pub fn picker_options(&self) -> &[String] {
        match self.input_mode {
            InputMode::PickingArea => &self.filter_options.areas,
            _ => &self.filter_options.categories,
        }
    }

    pub fn set_filter_options(&mut self, options: FilterOptions) {
        self.filter_options = options;
    }

    pub fn set_results(&mut self, outcome: BrowseOutcome) {
        self.results = outcome.recipes;
        self.notice = outcome.notice.map(String::from);
        if self.results.is_empty() && self.notice.is_none() {
            self.notice = Some("No recipes found.".to_string());
        }
        self.showing_suggestions = false;
        self.loading = false;
        self.reset_selection();
    }

    pub fn set_suggestions(&mut self, recipes: Vec<Recipe>) {
        self.results = recipes;
        self.notice = None;
        self.showing_suggestions = true;
        self.loading = false;
        self.reset_selection();
    }

    pub fn show_detail(&mut self, recipe: Option<Recipe>) {
        self.loading = false;
        match recipe {
            Some(recipe) => {
                self.detail = Some(recipe);
                self.detail_scroll = 0;
                if self.view != View::Detail {
                    self.back_view = self.view;
                }
                self.view = View::Detail;
            }
            None => {
                self.error_message = Some("Recipe not found.".to_string());
            }
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.loading = false;
    }

    fn reset_selection(&mut self) {
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    pub fn next_result(&mut self) {
        if !self.results.is_empty() && self.selected_index < self.results.len() - 1 {
            self.selected_index += 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn previous_result(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn next_favorite(&mut self) {
        let visible = self.visible_favorites().len();
        if visible > 0 && self.favorites_cursor < visible - 1 {
            self.favorites_cursor += 1;
            self.favorites_state.select(Some(self.favorites_cursor));
        }
    }

    fn previous_favorite(&mut self) {
        if self.favorites_cursor > 0 {
            self.favorites_cursor -= 1;
            self.favorites_state.select(Some(self.favorites_cursor));
        }
    }

    fn reset_favorites_cursor(&mut self) {
        self.favorites_cursor = 0;
        self.favorites_state.select(Some(0));
    }

    /// Toggle the recipe under the cursor in the current view
    pub fn toggle_current_favorite(&mut self) {
        let summary: Option<RecipeSummary> = match self.view {
            View::Home => self.selected_recipe().map(RecipeSummary::from),
            View::Detail => self.detail.as_ref().map(RecipeSummary::from),
            View::Favorites => self.selected_favorite().cloned(),
        };
        let Some(summary) = summary else {
            return;
        };

        // The store logs persistence trouble; the in-memory list is what counts here
        let outcome = self.store.toggle(summary);
        if let Some(warning) = outcome.warning {
            debug!("Favorites toggle kept in memory only: {}", warning);
        }
        self.sync_favorites();
    }

    /// Video link if there is one, else the source page
    fn current_link(&self) -> Option<String> {
        let recipe = match self.view {
            View::Home => self.selected_recipe(),
            View::Detail => self.detail.as_ref(),
            View::Favorites => None,
        }?;
        recipe
            .youtube_url
            .clone()
            .or_else(|| recipe.source_url.clone())
    }

    /// Handle one key press. Anything that needs the network comes back as an Action.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        self.error_message = None;

        match self.input_mode {
            InputMode::Searching => self.handle_search_key(key.code),
            InputMode::PickingCategory | InputMode::PickingArea => self.handle_picker_key(key.code),
            InputMode::FilteringFavorites => self.handle_favorites_filter_key(key.code),
            InputMode::Normal => match self.view {
                View::Home => self.handle_home_key(key.code),
                View::Detail => self.handle_detail_key(key.code),
                View::Favorites => self.handle_favorites_key(key.code),
            },
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.query.set_text(self.search_input.as_str());
                if self.query.is_empty() {
                    self.error_message = Some(compass_core::Error::EmptyQuery.to_string());
                    return None;
                }
                self.loading = true;
                Some(Action::Browse)
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                None
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                None
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            _ => None,
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) -> Option<Action> {
        let count = self.picker_options().len();
        match code {
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                if count > 0 && self.picker_cursor < count - 1 {
                    self.picker_cursor += 1;
                }
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker_cursor = self.picker_cursor.saturating_sub(1);
                None
            }
            KeyCode::Enter => {
                let picked = self.picker_options().get(self.picker_cursor).cloned();
                let mode = self.input_mode;
                self.input_mode = InputMode::Normal;

                let picked = picked?;
                if mode == InputMode::PickingArea {
                    self.query.toggle_area(&picked);
                } else {
                    self.query.toggle_category(&picked);
                }
                self.refresh_after_filter_change()
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            _ => None,
        }
    }

    // With no search text, filters alone drive the results
    fn refresh_after_filter_change(&mut self) -> Option<Action> {
        if self.query.text.is_some() {
            return None;
        }
        if self.query.has_filters() {
            self.loading = true;
            Some(Action::Browse)
        } else {
            self.results.clear();
            self.notice = None;
            self.reset_selection();
            None
        }
    }

    fn handle_favorites_filter_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char(c) => {
                self.favorites_filter.push(c);
                self.reset_favorites_cursor();
            }
            KeyCode::Backspace => {
                self.favorites_filter.pop();
                self.reset_favorites_cursor();
            }
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
        None
    }

    fn handle_home_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Searching;
                None
            }
            KeyCode::Char('c') => {
                self.picker_cursor = 0;
                self.input_mode = InputMode::PickingCategory;
                None
            }
            KeyCode::Char('a') => {
                self.picker_cursor = 0;
                self.input_mode = InputMode::PickingArea;
                None
            }
            KeyCode::Char('x') => {
                self.query.clear_filters();
                self.refresh_after_filter_change()
            }
            KeyCode::Char('r') => {
                self.loading = true;
                Some(Action::Suggest)
            }
            KeyCode::Char('f') => {
                self.view = View::Favorites;
                None
            }
            KeyCode::Char('b') => {
                self.toggle_current_favorite();
                None
            }
            KeyCode::Char('o') => self.current_link().map(Action::OpenLink),
            KeyCode::Char('j') | KeyCode::Down => {
                self.next_result();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.previous_result();
                None
            }
            KeyCode::Enter => {
                // Results are already complete records
                let recipe = self.selected_recipe().cloned();
                if recipe.is_some() {
                    self.show_detail(recipe);
                }
                None
            }
            _ => None,
        }
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.view = self.back_view;
                None
            }
            KeyCode::Char('b') => {
                self.toggle_current_favorite();
                None
            }
            KeyCode::Char('o') => self.current_link().map(Action::OpenLink),
            KeyCode::Char('j') | KeyCode::Down => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
                None
            }
            _ => None,
        }
    }

    fn handle_favorites_key(&mut self, code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Esc | KeyCode::Char('f') => {
                self.view = View::Home;
                None
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::FilteringFavorites;
                None
            }
            KeyCode::Char('b') => {
                self.toggle_current_favorite();
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.next_favorite();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.previous_favorite();
                None
            }
            KeyCode::Enter => {
                let id = self.selected_favorite()?.id.clone();
                self.loading = true;
                Some(Action::OpenRecipe(id))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_core::MemoryBackend;
    use crossterm::event::KeyModifiers;

    fn recipe(id: &str, name: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: name.to_string(),
            thumbnail_url: String::new(),
            category: "Chicken".to_string(),
            area: "Japanese".to_string(),
            instructions: String::new(),
            tags: Vec::new(),
            youtube_url: Some("https://www.youtube.com/watch?v=4aZr5hZXP_s".to_string()),
            source_url: None,
            ingredients: Vec::new(),
        }
    }

    fn press(app: &mut App, code: KeyCode) -> Option<Action> {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app_with_store() -> (App, Arc<FavoritesStore>) {
        let (store, _) = FavoritesStore::open(MemoryBackend::new());
        let store = Arc::new(store);
        (App::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_search_submits_browse() {
        let (mut app, _) = app_with_store();

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Searching);
        type_text(&mut app, "teriyaki");

        assert_eq!(press(&mut app, KeyCode::Enter), Some(Action::Browse));
        assert_eq!(app.query.text.as_deref(), Some("teriyaki"));
        assert!(app.loading);
    }

    #[test]
    fn test_empty_search_shows_prompt() {
        let (mut app, _) = app_with_store();

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "  ");

        assert_eq!(press(&mut app, KeyCode::Enter), None);
        assert_eq!(
            app.error_message.as_deref(),
            Some("Please enter a search term or select a filter.")
        );
    }

    #[test]
    fn test_picking_a_filter_without_text_browses() {
        let (mut app, _) = app_with_store();
        app.set_filter_options(FilterOptions {
            categories: vec!["Beef".to_string(), "Chicken".to_string()],
            areas: vec!["Japanese".to_string()],
        });

        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(press(&mut app, KeyCode::Enter), Some(Action::Browse));
        assert_eq!(app.query.category.as_deref(), Some("Chicken"));

        // Picking it again deselects; nothing left to browse
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(press(&mut app, KeyCode::Enter), None);
        assert_eq!(app.query.category, None);
        assert!(app.results.is_empty());
    }

    #[test]
    fn test_toggle_from_home_and_detail_share_the_store() {
        let (mut app, store) = app_with_store();
        app.set_suggestions(vec![recipe("52772", "Teriyaki Chicken Casserole")]);

        press(&mut app, KeyCode::Char('b'));
        assert!(app.is_favorited("52772"));
        assert!(store.is_favorited("52772"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, View::Detail);
        press(&mut app, KeyCode::Char('b'));
        assert!(!app.is_favorited("52772"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_outside_writes_reach_the_app() {
        let (mut app, store) = app_with_store();

        store.toggle(&recipe("1", "Chicken Handi"));
        assert!(!app.is_favorited("1"));

        assert!(app.sync_favorites());
        assert!(app.is_favorited("1"));
        assert!(!app.sync_favorites());
    }

    #[test]
    fn test_favorites_view_filter_and_remove() {
        let (mut app, store) = app_with_store();
        store.toggle(&recipe("1", "Teriyaki Chicken Casserole"));
        store.toggle(&recipe("2", "Baked salmon with fennel"));
        app.sync_favorites();

        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "salmon");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.visible_favorites().len(), 1);
        assert_eq!(
            press(&mut app, KeyCode::Enter),
            Some(Action::OpenRecipe("2".to_string()))
        );

        press(&mut app, KeyCode::Char('b'));
        assert!(app.visible_favorites().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_link_prefers_video() {
        let (mut app, _) = app_with_store();
        app.set_suggestions(vec![recipe("1", "Chicken Handi")]);

        assert_eq!(
            press(&mut app, KeyCode::Char('o')),
            Some(Action::OpenLink(
                "https://www.youtube.com/watch?v=4aZr5hZXP_s".to_string()
            ))
        );
    }

    #[test]
    fn test_missing_recipe_is_reported() {
        let (mut app, _) = app_with_store();
        app.show_detail(None);

        assert_eq!(app.view, View::Home);
        assert_eq!(app.error_message.as_deref(), Some("Recipe not found."));
    }

    #[test]
    fn test_write_failure_stays_quiet_and_toggle_sticks() {
        let backend = MemoryBackend::new();
        let (store, _) = FavoritesStore::open(backend.clone());
        let mut app = App::new(Arc::new(store));
        app.set_suggestions(vec![recipe("1", "Chicken Handi")]);

        backend.set_fail_writes(true);
        press(&mut app, KeyCode::Char('b'));

        assert!(app.is_favorited("1"));
        assert_eq!(app.error_message, None);

        press(&mut app, KeyCode::Char('b'));
        assert!(!app.is_favorited("1"));
        assert_eq!(app.error_message, None);
    }

    #[test]
    fn test_corrupt_saved_list_starts_empty_and_quiet() {
        let (store, warning) = FavoritesStore::open(MemoryBackend::with_value("{not json"));
        assert!(warning.is_some());

        let app = App::new(Arc::new(store));
        assert!(app.favorites.is_empty());
        assert_eq!(app.error_message, None);
    }
}
