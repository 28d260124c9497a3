//! The Elm Architecture (TEA) implementation for the govdesk TUI.
//!
//! - `Model`: UI state plus the shared page handle
//! - `Message`: inputs to the update function
//! - `Command`: outputs (side effects) from the update function
//! - `update`: transforms state and returns commands

pub mod command;
pub mod message;
pub mod model;
pub mod update;

pub use command::Command;
pub use message::Message;
pub use model::{Focus, LookupField, Model, Notification, NotificationLevel};
pub use update::update;
