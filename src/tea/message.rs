//! Messages for the TEA (The Elm Architecture) pattern.
//!
//! Messages are inputs to the update function: terminal events, and the
//! results that spawned controller tasks report back.

use crossterm::event::KeyEvent;

use crate::chat::{LookupOutcome, SubmitOutcome};
use crate::speech::SpeechError;
use crate::transition::{Outcome, TransitionError};

#[derive(Debug)]
pub enum Message {
    // Keyboard/terminal events
    Key(KeyEvent),
    Resize(u16, u16),

    // Command completion callbacks
    ChatFinished(SubmitOutcome),
    LookupFinished(LookupOutcome),
    DictationFinished(Result<(), SpeechError>),
    TransitionFinished(Result<Outcome, TransitionError>),
}
