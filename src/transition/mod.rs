//! Grid-to-tabs transition.
//!
//! The services view has two resting layouts: a grid of cards, and a tab bar
//! with a detail panel. Moving between them replaces the layout wholesale, so
//! continuity is faked with FLIP clones (see [`flip`]) choreographed by the
//! [`TransitionController`].

pub mod controller;
pub mod flip;

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

pub use controller::TransitionController;
pub use flip::{Bounds, Easing, FlipPlan, Pairing, Transform, Tween, FLIP_EASING};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("required element missing: {0}")]
    MissingElement(&'static str),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("cannot pair {sources} source elements with {targets} targets")]
    PairingMismatch { sources: usize, targets: usize },
}

/// Which layout is showing, or which way it is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Grid,
    Forward,
    Tabs,
    Backward,
}

impl ViewState {
    pub fn is_animating(&self) -> bool {
        matches!(self, ViewState::Forward | ViewState::Backward)
    }
}

/// How a transition request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Rejected because another transition was in flight or the view was in
    /// the wrong resting state.
    Ignored,
    /// Cancelled mid-flight by [`TransitionController::abort`].
    Aborted,
}

/// Layout measurement: where cards and tabs are (or would be) on screen.
pub trait Layout: Send + Sync {
    fn card_bounds(&self) -> Vec<Bounds>;
    fn tab_bounds(&self) -> Vec<Bounds>;
}

/// Layout with fixed geometry.
#[derive(Debug, Default)]
pub struct FixedLayout {
    cards: Mutex<Vec<Bounds>>,
    tabs: Mutex<Vec<Bounds>>,
}

impl FixedLayout {
    pub fn new(cards: Vec<Bounds>, tabs: Vec<Bounds>) -> Self {
        Self {
            cards: Mutex::new(cards),
            tabs: Mutex::new(tabs),
        }
    }

    /// `n` cards in a row of 20x6 boxes and `n` tabs of 10x3 above them.
    pub fn row(n: usize) -> Self {
        let cards = (0..n)
            .map(|i| Bounds::new(i as f32 * 22.0, 10.0, 20.0, 6.0))
            .collect();
        let tabs = (0..n)
            .map(|i| Bounds::new(i as f32 * 12.0, 0.0, 10.0, 3.0))
            .collect();
        Self::new(cards, tabs)
    }

    pub fn set_tabs(&self, tabs: Vec<Bounds>) {
        *self.tabs.lock().unwrap_or_else(|e| e.into_inner()) = tabs;
    }
}

impl Layout for FixedLayout {
    fn card_bounds(&self) -> Vec<Bounds> {
        self.cards.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn tab_bounds(&self) -> Vec<Bounds> {
        self.tabs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Choreography timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Grid / tab bar opacity fade before removal from layout.
    pub fade: Duration,
    /// Wait before measuring destination geometry.
    pub settle: Duration,
    pub flip_forward: Duration,
    pub flip_backward: Duration,
    /// Delay from flip start to the tab bar fade-in.
    pub tabs_reveal: Duration,
    /// Delay from flip start to clone removal.
    pub clone_lifetime: Duration,
    pub info_settle: Duration,
    pub grid_tick: Duration,
    pub resize_debounce: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fade: Duration::from_millis(260),
            settle: Duration::from_millis(40),
            flip_forward: Duration::from_millis(620),
            flip_backward: Duration::from_millis(640),
            tabs_reveal: Duration::from_millis(320),
            clone_lifetime: Duration::from_millis(700),
            info_settle: Duration::from_millis(20),
            grid_tick: Duration::from_millis(8),
            resize_debounce: Duration::from_millis(180),
        }
    }
}

impl Timing {
    /// Upper bound on how long one transition runs.
    pub fn forward_total(&self) -> Duration {
        self.settle + self.clone_lifetime + self.info_settle
    }

    pub fn backward_total(&self) -> Duration {
        self.settle + self.clone_lifetime + self.grid_tick
    }
}

pub const CARD_RADIUS: f32 = 14.0;
pub const TAB_RADIUS: f32 = 28.0;
