// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod persist;
pub mod profile;
pub mod runtime;
pub mod score;
pub mod session;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::App;
