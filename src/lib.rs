pub mod app;
pub mod cache;
pub mod config;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod models;
pub mod sources;
pub mod state;
pub mod stats;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use sources::SourceResolver;
pub use state::AppState;
