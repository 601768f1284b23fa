// Terminal UI: home search, recipe details and the favorites list

pub mod app;
pub mod favorites_ui;
pub mod runner;
pub mod ui;

pub use app::{Action, App, InputMode, View};
pub use runner::{run_tui, TuiOptions};
