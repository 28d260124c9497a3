//! Commands for the TEA (The Elm Architecture) pattern.
//!
//! Commands are outputs from the update function - they represent side effects
//! to be executed by the runtime.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Chat pane
    SubmitChat,
    Dictate,
    NewChat,

    // Lookup panel
    Lookup,
    ClearLookup,

    // Services view: open the card at `index`, or switch to its tab when
    // the tabs are already showing.
    Activate { index: usize },
    Back,
    Resize { width: u16, height: u16 },

    // App lifecycle
    Quit,
}
