//! Chat pane and info lookup.

pub mod controller;
pub mod lookup;
pub mod rules;

pub use controller::{build_prompt, ChatController, SubmitOutcome, SYSTEM_INSTRUCTION};
pub use lookup::{LookupController, LookupOutcome, LookupRequest, DEFAULT_APP, DEFAULT_LANGUAGE, LANGUAGES};
pub use rules::canned_reply;
