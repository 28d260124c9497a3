//! Update function for the TEA (The Elm Architecture) pattern.
//!
//! The update function takes a model and a message, mutates the model,
//! and returns a list of commands to execute. Text typed into the chat input
//! and the lookup form is written straight into the page, which dictation
//! and the controllers read from as well.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::chat::{LookupOutcome, SubmitOutcome, LANGUAGES};
use crate::page::Document;
use crate::transition::Outcome;
use crate::{glog, glog_debug, glog_warn};

use super::command::Command;
use super::message::Message;
use super::model::{Focus, LookupField, Model, Notification, NotificationLevel};

/// Helper to set an error notification and mark model as dirty.
fn set_error(model: &mut Model, message: String) {
    glog_warn!("UI Error: {}", message);
    model.notification = Some(Notification {
        level: NotificationLevel::Error,
        message,
    });
    model.dirty = true;
}

/// Model + Message → Commands
///
/// All I/O happens via the returned commands. The only side effect here is
/// editing text fields that live in the shared page.
pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            model.notification = None; // Clear notification on any key press
            model.dirty = true;
            update_key(model, key, &mut cmds);
        }

        Message::Resize(width, height) => {
            model.dirty = true;
            cmds.push(Command::Resize { width, height });
        }

        Message::ChatFinished(outcome) => {
            glog_debug!("Message::ChatFinished {:?}", outcome);
            if let SubmitOutcome::Failed(err) = outcome {
                glog_warn!("Chat request failed: {}", err);
            }
            model.dirty = true;
        }

        Message::LookupFinished(outcome) => {
            glog_debug!("Message::LookupFinished {:?}", outcome);
            if let LookupOutcome::Failed(err) = outcome {
                glog_warn!("Lookup failed: {}", err);
            }
            model.dirty = true;
        }

        Message::DictationFinished(result) => {
            if let Err(err) = result {
                glog!("Dictation ended without transcript: {}", err);
            }
            model.dirty = true;
        }

        Message::TransitionFinished(result) => {
            match result {
                Ok(Outcome::Completed) => {
                    glog_debug!("Transition completed");
                }
                Ok(outcome) => glog_debug!("Transition ended: {:?}", outcome),
                Err(err) => set_error(model, err.to_string()),
            }
            model.dirty = true;
        }
    }

    cmds
}

fn update_key(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        cmds.push(Command::Quit);
        return;
    }

    // A notice swallows every key until dismissed.
    if model.page.read(|doc| doc.notice.is_some()) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            model.page.with(|doc| doc.notice = None);
        }
        return;
    }

    match key.code {
        KeyCode::Tab => {
            model.focus = model.focus.next();
            return;
        }
        KeyCode::BackTab => {
            model.focus = model.focus.prev();
            return;
        }
        _ => {}
    }

    match model.focus {
        Focus::Services => update_services(model, key, cmds),
        Focus::Chat => update_chat(model, key, ctrl, cmds),
        Focus::Lookup => update_lookup(model, key, cmds),
    }
}

fn update_services(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    let count = model.service_count();
    match key.code {
        KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
            if count > 0 {
                model.selected = (model.selected + 1) % count;
            }
        }

        KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
            if count > 0 {
                model.selected = model.selected.checked_sub(1).unwrap_or(count - 1);
            }
        }

        KeyCode::Enter | KeyCode::Char(' ') => {
            if model.selected < count {
                cmds.push(Command::Activate {
                    index: model.selected,
                });
            }
        }

        KeyCode::Esc | KeyCode::Char('b') => cmds.push(Command::Back),

        KeyCode::Char('q') => cmds.push(Command::Quit),

        KeyCode::Char('?') => {
            model.show_keymap = !model.show_keymap;
        }

        _ => {}
    }
}

fn update_chat(model: &mut Model, key: KeyEvent, ctrl: bool, cmds: &mut Vec<Command>) {
    match key.code {
        KeyCode::Char('n') if ctrl => cmds.push(Command::NewChat),
        KeyCode::Enter => cmds.push(Command::SubmitChat),
        KeyCode::F(2) => cmds.push(Command::Dictate),
        KeyCode::Esc => model.focus = Focus::Services,
        KeyCode::Backspace => edit_chat_input(model, |input| {
            input.pop();
        }),
        KeyCode::Char(c) if !ctrl => edit_chat_input(model, |input| input.push(c)),
        _ => {}
    }
}

fn edit_chat_input(model: &Model, f: impl FnOnce(&mut String)) {
    model.page.with(|doc: &mut Document| {
        if let Some(chat) = doc.chat.as_mut() {
            f(&mut chat.input);
        }
    });
}

fn update_lookup(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    match key.code {
        KeyCode::Down => model.lookup_field = model.lookup_field.next(),
        KeyCode::Up => model.lookup_field = model.lookup_field.prev(),
        KeyCode::Enter => cmds.push(Command::Lookup),
        KeyCode::Esc => cmds.push(Command::ClearLookup),
        KeyCode::Left => cycle_choice(model, false),
        KeyCode::Right => cycle_choice(model, true),
        KeyCode::Backspace if model.lookup_field == LookupField::Problem => {
            model.page.with(|doc| {
                if let Some(lookup) = doc.lookup.as_mut() {
                    lookup.problem.pop();
                }
            });
        }
        KeyCode::Char(c) if model.lookup_field == LookupField::Problem => {
            model.page.with(|doc| {
                if let Some(lookup) = doc.lookup.as_mut() {
                    lookup.problem.push(c);
                }
            });
        }
        _ => {}
    }
}

/// Step the language or app picker forward or backward.
fn cycle_choice(model: &Model, forward: bool) {
    let choices: Vec<String> = match model.lookup_field {
        LookupField::Language => LANGUAGES.iter().map(|l| l.to_string()).collect(),
        LookupField::App => model.catalog.labels(),
        LookupField::Problem => return,
    };
    if choices.is_empty() {
        return;
    }
    let field = model.lookup_field;
    model.page.with(|doc| {
        let Some(lookup) = doc.lookup.as_mut() else {
            return;
        };
        let current = match field {
            LookupField::Language => &mut lookup.language,
            _ => &mut lookup.app,
        };
        let len = choices.len();
        let next = match choices.iter().position(|c| c.eq_ignore_ascii_case(current.as_str())) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        *current = choices[next].clone();
    });
}
