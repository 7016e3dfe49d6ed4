// src/lib.rs

pub mod api;
pub mod camera;
pub mod config;
pub mod decoder;
pub mod scan;
pub mod state;
pub mod upload;

pub use api::http_router;
pub use state::AppState;
