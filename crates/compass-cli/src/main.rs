use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Parser, Subcommand};
use compass_cache::CacheManager;
use compass_core::{
    browse::{self, BrowseQuery},
    providers::MealDbProvider,
    CachedCatalog, Config, FavoritesStore, MemoryBackend, Recipe, RecipeCatalog, SharedCache,
    FavoritesSet, SlotBackend,
};
use compass_tui::{App, TuiOptions};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "compass")]
#[command(version, about = "Find recipes and keep your favorites from the terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "COMPASS_CONFIG")]
    config: Option<PathBuf>,

    /// Keep favorites in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search recipes by name, optionally narrowed by category and area
    Search {
        /// Dish or ingredient
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        area: Option<String>,
    },
    /// List recipes by category and/or area
    Browse {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        area: Option<String>,
    },
    /// Show one recipe in full
    Show {
        /// Recipe id, e.g. 52772
        id: String,
    },
    /// A few random recipes for inspiration
    Random {
        #[arg(short = 'n', long, default_value_t = browse::DEFAULT_SUGGESTIONS)]
        count: usize,
    },
    /// List every category
    Categories,
    /// List every area (cuisine)
    Areas,
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
    /// Interactive terminal UI (the default)
    Tui,
}

#[derive(Subcommand)]
enum FavoritesCommand {
    /// Print saved favorites, oldest first
    List {
        /// Fuzzy filter on the recipe name
        #[arg(long)]
        filter: Option<String>,
    },
    /// Add a recipe to favorites, or remove it if already there
    Toggle {
        /// Recipe id
        id: String,
    },
    /// Remove every favorite
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let command = cli.command.unwrap_or(Commands::Tui);
    let tui = matches!(command, Commands::Tui);
    init_logging(&config, tui);

    let cache = open_cache(&config);
    let store = open_favorites(&config, cache.clone(), cli.ephemeral);
    let catalog = build_catalog(&config, cache);

    match command {
        Commands::Search {
            query,
            category,
            area,
        } => {
            let mut query = BrowseQuery::new().with_text(query);
            if let Some(category) = category {
                query = query.with_category(category);
            }
            if let Some(area) = area {
                query = query.with_area(area);
            }
            run_browse(catalog.as_ref(), &store, &query).await?;
        }
        Commands::Browse { category, area } => {
            let mut query = BrowseQuery::new();
            if let Some(category) = category {
                query = query.with_category(category);
            }
            if let Some(area) = area {
                query = query.with_area(area);
            }
            run_browse(catalog.as_ref(), &store, &query).await?;
        }
        Commands::Show { id } => {
            match catalog.find_by_id(&id).await.map_err(user_facing)? {
                Some(recipe) => print_recipe(&recipe, store.is_favorited(&recipe.id)),
                None => println!("Recipe not found."),
            }
        }
        Commands::Random { count } => {
            let recipes = browse::suggestions(catalog.as_ref(), count)
                .await
                .map_err(user_facing)?;
            for recipe in &recipes {
                print_recipe_line(recipe, store.is_favorited(&recipe.id));
            }
        }
        Commands::Categories => {
            for category in catalog.list_categories().await.map_err(user_facing)? {
                println!("{}", category);
            }
        }
        Commands::Areas => {
            for area in catalog.list_areas().await.map_err(user_facing)? {
                println!("{}", area);
            }
        }
        Commands::Favorites { action } => {
            run_favorites(catalog.as_ref(), &store, action).await?;
        }
        Commands::Tui => {
            let app = App::new(Arc::new(store));
            let options = TuiOptions {
                suggestions: config.ui.suggestions,
                mouse_enabled: config.ui.mouse_enabled,
            };
            compass_tui::run_tui(app, catalog, options).await?;
        }
    }

    Ok(())
}

/// Command output goes to stdout, so logs go to stderr. The TUI owns the
/// terminal; its logs go to a file next to the database instead.
fn init_logging(config: &Config, tui: bool) {
    let default_directives = if tui {
        "compass=info,compass_core=info,compass_api=info,compass_tui=info"
    } else {
        "compass=warn,compass_core=warn,compass_api=warn"
    };

    let writer = if tui {
        match log_file(config) {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(std::io::sink),
        }
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(!tui),
        )
        .init();
}

fn log_file(config: &Config) -> Option<std::fs::File> {
    let db_path = config.cache.resolved_db_path().ok()?;
    let dir = db_path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("compass.log"))
        .ok()
}

/// Open the local database. Without it the app still works, it just
/// forgets favorites on exit and always hits the network.
fn open_cache(config: &Config) -> Option<SharedCache> {
    let path = match config.cache.resolved_db_path() {
        Ok(path) => path,
        Err(e) => {
            warn!("No database location: {}", e);
            return None;
        }
    };

    match CacheManager::new(&path) {
        Ok(manager) => {
            info!("Using database at {}", path.display());
            Some(Arc::new(Mutex::new(manager)))
        }
        Err(e) => {
            warn!("Failed to open database at {}: {}", path.display(), e);
            None
        }
    }
}

fn open_favorites(
    config: &Config,
    cache: Option<SharedCache>,
    ephemeral: bool,
) -> FavoritesStore {
    let (store, warning) = match cache {
        Some(cache) if !ephemeral => FavoritesStore::open(SlotBackend::new(
            cache,
            config.favorites.slot_name.clone(),
            config.favorites.slot_policy(),
        )),
        _ => {
            info!("Favorites are kept in memory for this run");
            FavoritesStore::open(MemoryBackend::new())
        }
    };

    // Persistence trouble is logged, never shown
    if let Some(warning) = warning {
        warn!("Starting with empty favorites: {}", warning);
    }
    store
}

fn build_catalog(config: &Config, cache: Option<SharedCache>) -> Arc<dyn RecipeCatalog> {
    let provider = Box::new(MealDbProvider::new(config.catalog.client()));

    match cache {
        Some(cache) if config.cache.enabled => {
            let catalog = CachedCatalog::with_cache(provider, cache, config.cache.ttl());
            catalog.purge_stale();
            Arc::new(catalog)
        }
        _ => Arc::new(CachedCatalog::new(provider)),
    }
}

/// Log the details, show the user the short version
fn user_facing(e: compass_core::Error) -> anyhow::Error {
    error!("{}", e);
    anyhow::anyhow!(e.user_message())
}

async fn run_browse(
    catalog: &dyn RecipeCatalog,
    store: &FavoritesStore,
    query: &BrowseQuery,
) -> anyhow::Result<()> {
    let outcome = browse::browse(catalog, query).await.map_err(user_facing)?;

    if let Some(notice) = outcome.notice {
        println!("{}", notice);
    } else if outcome.recipes.is_empty() {
        println!("No recipes found.");
    }

    for recipe in &outcome.recipes {
        print_recipe_line(recipe, store.is_favorited(&recipe.id));
    }
    Ok(())
}

async fn run_favorites(
    catalog: &dyn RecipeCatalog,
    store: &FavoritesStore,
    action: FavoritesCommand,
) -> anyhow::Result<()> {
    match action {
        FavoritesCommand::List { filter } => {
            for line in favorites_lines(&store.list(), filter.as_deref()) {
                println!("{}", line);
            }
        }
        FavoritesCommand::Toggle { id } => {
            // Look the recipe up so the stored display fields are real
            let Some(recipe) = catalog.find_by_id(&id).await.map_err(user_facing)? else {
                println!("Recipe not found.");
                return Ok(());
            };

            let outcome = store.toggle(&recipe);
            if outcome.favorited {
                println!("Added {} to favorites", recipe.name);
            } else {
                println!("Removed {} from favorites", recipe.name);
            }
            if let Some(warning) = outcome.warning {
                warn!("Favorites change not saved: {}", warning);
            }
        }
        FavoritesCommand::Clear => {
            let count = store.len();
            if let Some(warning) = store.clear() {
                warn!("Favorites change not saved: {}", warning);
            }
            println!("Removed {} favorites", count);
        }
    }
    Ok(())
}

fn favorites_lines(favorites: &FavoritesSet, filter: Option<&str>) -> Vec<String> {
    if favorites.is_empty() {
        return vec!["You haven't saved any favorites yet.".to_string()];
    }

    let matches = favorites.matching(filter.unwrap_or_default());
    if matches.is_empty() {
        return vec!["No favorites match the filter".to_string()];
    }

    matches
        .iter()
        .map(|summary| format!("♥ {:<8} {}  ({})", summary.id, summary.name, summary.subtitle()))
        .collect()
}

fn print_recipe_line(recipe: &Recipe, favorited: bool) {
    let marker = if favorited { "♥" } else { " " };
    println!("{} {:<8} {}  ({})", marker, recipe.id, recipe.name, recipe.subtitle());
}

fn print_recipe(recipe: &Recipe, favorited: bool) {
    println!("{}{}", recipe.name, if favorited { "  ♥" } else { "" });
    println!("{}", recipe.subtitle());
    if !recipe.tags.is_empty() {
        println!("Tags: {}", recipe.tags.join(", "));
    }

    println!();
    println!("Ingredients");
    for ingredient in &recipe.ingredients {
        println!("  • {}", ingredient);
    }

    println!();
    println!("Instructions");
    println!("{}", recipe.instructions.trim());

    if let Some(video) = &recipe.youtube_url {
        println!();
        println!("Video: {}", video);
        if let Some(embed) = recipe.youtube_embed_url() {
            println!("Embed: {}", embed);
        }
    }
    if let Some(source) = &recipe.source_url {
        println!("Source: {}", source);
    }
}
