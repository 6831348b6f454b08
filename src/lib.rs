pub mod app;
pub mod bucket;
pub mod config;
pub mod errors;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod source;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use bucket::bucket;
pub use config::WidgetConfig;
pub use grid::build_grid;
pub use state::AppState;
pub use storage::load_settings;
