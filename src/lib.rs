pub mod app;
pub mod auth;
pub mod carousel;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod media;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;
pub mod visits;

pub use app::router;
pub use config::Config;
pub use state::AppState;
