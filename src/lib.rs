pub mod assistant;
pub mod chat;
pub mod config;
pub mod content;
pub mod error;
pub mod log;
pub mod markup;
pub mod page;
pub mod proxy;
pub mod speech;
pub mod transition;

// Decoupled game loop architecture
pub mod app;
pub mod layout;
pub mod render;
pub mod tea;
pub mod ui;

pub use error::{Error, Result};
