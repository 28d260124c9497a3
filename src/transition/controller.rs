use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::content::ServiceCatalog;
use crate::page::{CloneNode, Document, Page, Part, ServicesView, Style};
use crate::{glog_debug, glog_warn};

use super::flip::{FlipPlan, Pairing, FLIP_EASING};
use super::{
    Bounds, Layout, Outcome, Timing, TransitionError, ViewState, CARD_RADIUS, TAB_RADIUS,
};

/// Transition bookkeeping. Only the controller touches it, always under its
/// lock, and always before the page lock.
#[derive(Debug, Default)]
struct Machine {
    state: ViewState,
    active_service: Option<String>,
    run: Option<CancellationToken>,
    resize_generation: u64,
}

/// Steps of the forward timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForwardCue {
    Measure,
    HideGrid,
    RevealTabs,
    Land,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackwardCue {
    HideTabs,
    Fly,
    Land,
}

/// Owns the services view state machine and plays the FLIP choreography
/// between the card grid and the tab layout.
#[derive(Clone)]
pub struct TransitionController {
    page: Page,
    layout: Arc<dyn Layout>,
    catalog: Arc<ServiceCatalog>,
    timing: Timing,
    machine: Arc<Mutex<Machine>>,
}

impl TransitionController {
    pub fn new(page: Page, layout: Arc<dyn Layout>, catalog: Arc<ServiceCatalog>) -> Self {
        Self {
            page,
            layout,
            catalog,
            timing: Timing::default(),
            machine: Arc::new(Mutex::new(Machine::default())),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> ViewState {
        self.machine().state
    }

    pub fn active_service(&self) -> Option<String> {
        self.machine().active_service.clone()
    }

    pub fn is_animating(&self) -> bool {
        self.state().is_animating()
    }

    /// Apply one choreography step unless the run was cancelled.
    fn step(
        &self,
        token: &CancellationToken,
        f: impl FnOnce(&mut Machine, &mut Document),
    ) -> bool {
        let mut machine = self.machine();
        if token.is_cancelled() {
            return false;
        }
        self.page.with(|doc| f(&mut *machine, doc));
        true
    }

    async fn wait_until(token: &CancellationToken, at: Instant) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = sleep_until(at) => true,
        }
    }

    /// Grid to tabs, landing on the tab for `service_id`.
    pub async fn show_service(&self, service_id: &str) -> Result<Outcome, TransitionError> {
        let t0 = Instant::now();
        let (token, cards) = {
            let mut machine = self.machine();
            if machine.state != ViewState::Grid {
                glog_debug!(
                    "Transition: ignoring show_service({}) in {:?}",
                    service_id,
                    machine.state
                );
                return Ok(Outcome::Ignored);
            }

            let cards = self.layout.card_bounds();
            let tab_count = self.layout.tab_bounds().len();
            self.page.with(|doc| -> Result<(), TransitionError> {
                let view = validated_view(doc)?;
                if !view.cards.iter().any(|c| c.service_id == service_id)
                    || self.catalog.get(service_id).is_none()
                {
                    return Err(TransitionError::UnknownService(service_id.to_string()));
                }
                Pairing::by_position(view.cards.len(), view.tabs.len())?;
                Pairing::by_position(view.cards.len(), cards.len())?;
                Pairing::by_position(view.tabs.len(), tab_count)?;

                let clones = view
                    .cards
                    .iter()
                    .zip(&cards)
                    .map(|(card, bounds)| CloneNode::at(card.label.as_str(), *bounds, CARD_RADIUS))
                    .collect();
                restyle(view, Part::Grid, |s| s.opacity = 0.0);
                restyle(view, Part::TabBar, |s| {
                    s.displayed = true;
                    s.opacity = 0.0;
                    s.offset_y = -6.0;
                    s.interactive = false;
                });
                restyle(view, Part::TopBar, |s| s.interactive = false);
                doc.clones = clones;
                Ok(())
            })?;

            let token = CancellationToken::new();
            machine.state = ViewState::Forward;
            machine.run = Some(token.clone());
            (token, cards)
        };
        glog_debug!("Transition: forward to {}", service_id);

        let t = self.timing;
        let mut cues = vec![
            (t0 + t.settle, ForwardCue::Measure),
            (t0 + t.fade, ForwardCue::HideGrid),
            (t0 + t.settle + t.tabs_reveal, ForwardCue::RevealTabs),
            (t0 + t.settle + t.clone_lifetime, ForwardCue::Land),
        ];
        cues.sort_by_key(|(at, _)| *at);

        for (at, cue) in cues {
            if !Self::wait_until(&token, at).await {
                return Ok(Outcome::Aborted);
            }
            let applied = match cue {
                ForwardCue::Measure => {
                    let tabs = self.layout.tab_bounds();
                    let plan = match FlipPlan::new(&cards, &tabs, t.flip_forward, FLIP_EASING) {
                        Ok(plan) => plan,
                        Err(e) => {
                            glog_warn!("Transition: tab layout changed mid-flight: {}", e);
                            self.abort();
                            return Err(e);
                        }
                    };
                    let tweens = plan.tweens(Instant::now(), (CARD_RADIUS, TAB_RADIUS));
                    self.step(&token, |_, doc| {
                        for (clone, tween) in doc.clones.iter_mut().zip(tweens) {
                            clone.tween = Some(tween);
                        }
                    })
                }
                ForwardCue::HideGrid => self.step(&token, |_, doc| {
                    doc.restyle(Part::Grid, |s| s.displayed = false);
                }),
                ForwardCue::RevealTabs => self.step(&token, |_, doc| {
                    doc.restyle(Part::TabBar, |s| {
                        s.opacity = 1.0;
                        s.offset_y = 0.0;
                    });
                }),
                ForwardCue::Land => self.step(&token, |_, doc| {
                    doc.clones.clear();
                    doc.restyle(Part::TabBar, |s| {
                        s.opacity = 1.0;
                        s.offset_y = 0.0;
                        s.interactive = true;
                    });
                    doc.restyle(Part::TopBar, |s| s.interactive = true);
                    doc.restyle(Part::InfoPanel, |s| {
                        s.displayed = true;
                        s.opacity = 0.0;
                        s.offset_y = 6.0;
                        s.interactive = true;
                    });
                }),
            };
            if !applied {
                return Ok(Outcome::Aborted);
            }
        }

        if !Self::wait_until(&token, Instant::now() + t.info_settle).await {
            return Ok(Outcome::Aborted);
        }
        let content = self.catalog.content_for(service_id).to_string();
        let landed = self.step(&token, |machine, doc| {
            if let Some(view) = doc.services.as_mut() {
                restyle(view, Part::InfoPanel, |s| {
                    s.opacity = 1.0;
                    s.offset_y = 0.0;
                });
                view.info_html = content;
                let index = view.cards.iter().position(|c| c.service_id == service_id);
                view.set_active_tab(index);
                restyle(view, Part::Back, |s| *s = Style::SHOWN);
            }
            machine.state = ViewState::Tabs;
            machine.active_service = Some(service_id.to_string());
            machine.run = None;
        });
        if !landed {
            return Ok(Outcome::Aborted);
        }
        glog_debug!("Transition: forward complete ({})", service_id);
        Ok(Outcome::Completed)
    }

    /// Tabs back to the card grid.
    pub async fn back(&self) -> Result<Outcome, TransitionError> {
        let t0 = Instant::now();
        let (token, plan) = {
            let mut machine = self.machine();
            if machine.state != ViewState::Tabs {
                glog_debug!("Transition: ignoring back in {:?}", machine.state);
                return Ok(Outcome::Ignored);
            }

            let tabs = self.layout.tab_bounds();
            let cards = self.layout.card_bounds();
            let plan = self.page.with(|doc| -> Result<FlipPlan, TransitionError> {
                let view = validated_view(doc)?;
                Pairing::by_position(view.tabs.len(), view.cards.len())?;
                Pairing::by_position(view.tabs.len(), tabs.len())?;
                let plan = FlipPlan::new(&tabs, &cards, self.timing.flip_backward, FLIP_EASING)?;

                let clones = view
                    .tabs
                    .iter()
                    .zip(&tabs)
                    .map(|(tab, bounds)| CloneNode::at(tab.label.as_str(), *bounds, TAB_RADIUS))
                    .collect();
                restyle(view, Part::TabBar, |s| {
                    s.opacity = 0.0;
                    s.interactive = false;
                });
                restyle(view, Part::InfoPanel, |s| {
                    s.opacity = 0.0;
                    s.offset_y = 8.0;
                });
                restyle(view, Part::TopBar, |s| s.interactive = false);
                doc.clones = clones;
                Ok(plan)
            })?;

            let token = CancellationToken::new();
            machine.state = ViewState::Backward;
            machine.run = Some(token.clone());
            (token, plan)
        };
        glog_debug!("Transition: backward");

        let t = self.timing;
        let mut cues = vec![
            (t0 + t.fade, BackwardCue::HideTabs),
            (t0 + t.settle, BackwardCue::Fly),
            (t0 + t.settle + t.clone_lifetime, BackwardCue::Land),
        ];
        cues.sort_by_key(|(at, _)| *at);

        for (at, cue) in cues {
            if !Self::wait_until(&token, at).await {
                return Ok(Outcome::Aborted);
            }
            let applied = match cue {
                BackwardCue::HideTabs => self.step(&token, |_, doc| {
                    doc.restyle(Part::TabBar, |s| s.displayed = false);
                    doc.restyle(Part::InfoPanel, |s| s.displayed = false);
                }),
                BackwardCue::Fly => {
                    let tweens = plan.tweens(Instant::now(), (TAB_RADIUS, CARD_RADIUS));
                    self.step(&token, |_, doc| {
                        for (clone, tween) in doc.clones.iter_mut().zip(tweens) {
                            clone.tween = Some(tween);
                        }
                    })
                }
                BackwardCue::Land => self.step(&token, |_, doc| {
                    doc.clones.clear();
                    doc.restyle(Part::Grid, |s| s.displayed = true);
                }),
            };
            if !applied {
                return Ok(Outcome::Aborted);
            }
        }

        if !Self::wait_until(&token, Instant::now() + t.grid_tick).await {
            return Ok(Outcome::Aborted);
        }
        let landed = self.step(&token, |machine, doc| {
            if let Some(view) = doc.services.as_mut() {
                restyle(view, Part::Grid, |s| *s = Style::SHOWN);
                restyle(view, Part::Back, |s| *s = Style::HIDDEN);
                view.set_active_tab(None);
            }
            machine.state = ViewState::Grid;
            machine.active_service = None;
            machine.run = None;
        });
        if !landed {
            return Ok(Outcome::Aborted);
        }
        glog_debug!("Transition: backward complete");
        Ok(Outcome::Completed)
    }

    /// Switch tabs without animation. Only honoured while resting in tabs.
    pub fn select_tab(&self, index: usize) -> bool {
        let mut machine = self.machine();
        if machine.state != ViewState::Tabs {
            return false;
        }
        let catalog = &self.catalog;
        let selected = self.page.with(|doc| {
            let view = doc.services.as_mut()?;
            let service_id = view.cards.get(index)?.service_id.clone();
            if index >= view.tabs.len() {
                return None;
            }
            view.set_active_tab(Some(index));
            view.info_html = catalog.content_for(&service_id).to_string();
            Some(service_id)
        });
        match selected {
            Some(id) => {
                glog_debug!("Transition: tab {} -> {}", index, id);
                machine.active_service = Some(id);
                true
            }
            None => false,
        }
    }

    /// Cancel any run and force the resting grid layout.
    pub fn abort(&self) {
        let mut machine = self.machine();
        if let Some(run) = machine.run.take() {
            run.cancel();
        }
        if machine.state != ViewState::Grid {
            glog_debug!("Transition: abort from {:?}", machine.state);
        }
        machine.state = ViewState::Grid;
        machine.active_service = None;
        self.page.with(reset_to_grid);
    }

    /// Debounced viewport change. Returns true when this call performed the
    /// reset, false when a newer resize superseded it.
    pub async fn on_resize(&self) -> bool {
        let generation = {
            let mut machine = self.machine();
            machine.resize_generation = machine.resize_generation.wrapping_add(1);
            machine.resize_generation
        };
        tokio::time::sleep(self.timing.resize_debounce).await;
        if self.machine().resize_generation != generation {
            return false;
        }
        self.abort();
        true
    }
}

fn validated_view(doc: &mut Document) -> Result<&mut ServicesView, TransitionError> {
    let view = doc
        .services
        .as_mut()
        .ok_or(TransitionError::MissingElement("services view"))?;
    if let Some(name) = view.missing_element() {
        return Err(TransitionError::MissingElement(name));
    }
    Ok(view)
}

fn restyle(view: &mut ServicesView, part: Part, f: impl FnOnce(&mut Style)) {
    if let Some(style) = view.style_mut(part) {
        f(style);
    }
}

fn reset_to_grid(doc: &mut Document) {
    doc.clones.clear();
    let Some(view) = doc.services.as_mut() else {
        return;
    };
    restyle(view, Part::Grid, |s| *s = Style::SHOWN);
    restyle(view, Part::TabBar, |s| *s = Style::HIDDEN);
    restyle(view, Part::InfoPanel, |s| *s = Style::HIDDEN);
    restyle(view, Part::Back, |s| *s = Style::HIDDEN);
    restyle(view, Part::TopBar, |s| {
        s.displayed = true;
        s.opacity = 1.0;
        s.offset_y = 0.0;
        s.interactive = false;
    });
    view.set_active_tab(None);
    view.info_html.clear();
}

/// Bounds of every clone at `now`, for assertions and drawing.
pub fn clone_bounds(doc: &Document, now: Instant) -> Vec<Bounds> {
    doc.clones.iter().map(|c| c.bounds_at(now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::transition::FixedLayout;

    fn setup() -> (Page, TransitionController) {
        let catalog = Arc::new(ServiceCatalog::builtin());
        let page = Page::new(Document::new(&catalog));
        let layout = Arc::new(FixedLayout::row(catalog.len()));
        let controller = TransitionController::new(page.clone(), layout, catalog);
        (page, controller)
    }

    fn style(page: &Page, part: Part) -> Style {
        page.read(|doc| doc.services_style(part).unwrap())
    }

    fn assert_resting_grid(page: &Page, controller: &TransitionController) {
        assert_eq!(controller.state(), ViewState::Grid);
        assert_eq!(controller.active_service(), None);
        page.read(|doc| {
            assert!(doc.clones.is_empty());
            let view = doc.services.as_ref().unwrap();
            assert_eq!(view.active_tab(), None);
        });
        assert_eq!(style(page, Part::Grid), Style::SHOWN);
        assert!(!style(page, Part::TabBar).displayed);
        assert!(!style(page, Part::InfoPanel).displayed);
        assert!(!style(page, Part::Back).displayed);
        assert!(!style(page, Part::TopBar).interactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_end_state() {
        let (page, controller) = setup();
        let outcome = controller.show_service("DigiLocker").await.unwrap();
        assert_eq!(outcome, Outcome::Completed);

        assert_eq!(controller.state(), ViewState::Tabs);
        assert_eq!(controller.active_service().as_deref(), Some("DigiLocker"));
        page.read(|doc| {
            assert!(doc.clones.is_empty());
            let view = doc.services.as_ref().unwrap();
            assert_eq!(view.active_tab(), Some(1));
            assert_eq!(
                view.info_html,
                ServiceCatalog::builtin().content_for("DigiLocker")
            );
        });
        assert!(!style(&page, Part::Grid).displayed);
        assert_eq!(style(&page, Part::TabBar), Style::SHOWN);
        assert!(style(&page, Part::InfoPanel).is_visible());
        assert!(style(&page, Part::Back).displayed);
        assert!(style(&page, Part::TopBar).interactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_midflight_shape() {
        let (page, controller) = setup();
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.show_service("NVSP").await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.is_animating());
        page.read(|doc| {
            assert_eq!(doc.clones.len(), 10);
            assert!(doc.clones.iter().all(|c| c.tween.is_none()));
        });
        assert_eq!(style(&page, Part::Grid).opacity, 0.0);
        let tab_bar = style(&page, Part::TabBar);
        assert!(tab_bar.displayed && !tab_bar.interactive);
        assert_eq!(tab_bar.offset_y, -6.0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        page.read(|doc| assert!(doc.clones.iter().all(|c| c.tween.is_some())));
        assert!(style(&page, Part::Grid).displayed);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!style(&page, Part::Grid).displayed);
        assert_eq!(style(&page, Part::TabBar).opacity, 0.0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(style(&page, Part::TabBar).opacity, 1.0);
        assert!(!style(&page, Part::TabBar).interactive);

        assert_eq!(task.await.unwrap().unwrap(), Outcome::Completed);
        page.read(|doc| {
            assert_eq!(
                doc.services.as_ref().unwrap().info_html,
                ServiceCatalog::builtin().content_for("NVSP")
            )
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_travel_to_tab_bounds() {
        let (page, controller) = setup();
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.show_service("UMANG").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let finish = Instant::now() + Duration::from_millis(620);
        page.read(|doc| {
            let bounds = clone_bounds(doc, finish);
            assert_eq!(bounds[3], Bounds::new(36.0, 0.0, 10.0, 3.0));
            let radius = doc.clones[3].radius_at(finish);
            assert!((radius - TAB_RADIUS).abs() < 1e-3);
        });
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_ignored_while_animating() {
        let (page, controller) = setup();
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.show_service("IRCTC").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let before = page.snapshot();
        assert!(!before.clones.is_empty());
        assert_eq!(controller.show_service("MyGov").await, Ok(Outcome::Ignored));
        assert_eq!(controller.back().await, Ok(Outcome::Ignored));
        assert_eq!(page.snapshot(), before);
        assert_eq!(controller.state(), ViewState::Forward);
        assert_eq!(task.await.unwrap(), Ok(Outcome::Completed));
        assert_eq!(controller.active_service().as_deref(), Some("IRCTC"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_resting_state_ignored() {
        let (_page, controller) = setup();
        assert_eq!(controller.back().await, Ok(Outcome::Ignored));
        controller.show_service("UMANG").await.unwrap();
        assert_eq!(controller.show_service("UMANG").await, Ok(Outcome::Ignored));
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_returns_to_grid() {
        let (page, controller) = setup();
        controller.show_service("Bhim UPI").await.unwrap();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.back().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.state(), ViewState::Backward);
        page.read(|doc| {
            assert_eq!(doc.clones.len(), 10);
            assert!((doc.clones[0].radius - TAB_RADIUS).abs() < 1e-3);
        });
        let info = style(&page, Part::InfoPanel);
        assert_eq!(info.opacity, 0.0);
        assert_eq!(info.offset_y, 8.0);
        assert!(!style(&page, Part::TabBar).interactive);

        assert_eq!(task.await.unwrap(), Ok(Outcome::Completed));
        assert_resting_grid(&page, &controller);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_aborts_forward() {
        let (page, controller) = setup();
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.show_service("Ayushman").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(controller.on_resize().await);
        assert_eq!(task.await.unwrap(), Ok(Outcome::Aborted));
        assert_resting_grid(&page, &controller);

        // Later timers of the cancelled run never fire.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_resting_grid(&page, &controller);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_aborts_backward() {
        let (page, controller) = setup();
        controller.show_service("mParivahan").await.unwrap();
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.back().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.on_resize().await;

        assert_eq!(task.await.unwrap(), Ok(Outcome::Aborted));
        assert_resting_grid(&page, &controller);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_in_tabs_resets() {
        let (page, controller) = setup();
        controller.show_service("Voter Helpline").await.unwrap();
        assert!(controller.on_resize().await);
        assert_resting_grid(&page, &controller);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_is_debounced() {
        let (_page, controller) = setup();
        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.on_resize().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = controller.on_resize().await;
        assert!(!first.await.unwrap());
        assert!(second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_tab_swaps_content() {
        let (page, controller) = setup();
        assert!(!controller.select_tab(2));
        controller.show_service("DigiLocker").await.unwrap();

        assert!(controller.select_tab(2));
        assert_eq!(controller.active_service().as_deref(), Some("NVSP"));
        page.read(|doc| {
            let view = doc.services.as_ref().unwrap();
            assert_eq!(view.active_tab(), Some(2));
            assert!(view.info_html.contains("NVSP"));
        });
        assert!(!controller.select_tab(99));
        assert_eq!(controller.state(), ViewState::Tabs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_service_is_rejected_without_mutation() {
        let (page, controller) = setup();
        let err = controller.show_service("nope").await.unwrap_err();
        assert_eq!(err, TransitionError::UnknownService("nope".to_string()));
        assert_resting_grid(&page, &controller);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_element_is_reported() {
        let (page, controller) = setup();
        page.with(|doc| doc.services.as_mut().unwrap().tab_bar = None);
        assert_eq!(
            controller.show_service("UMANG").await,
            Err(TransitionError::MissingElement("tab bar"))
        );
        assert_eq!(controller.state(), ViewState::Grid);
        page.read(|doc| assert!(doc.clones.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairing_mismatch_is_reported() {
        let catalog = Arc::new(ServiceCatalog::builtin());
        let page = Page::new(Document::new(&catalog));
        let layout = Arc::new(FixedLayout::row(catalog.len()));
        layout.set_tabs(vec![Bounds::new(0.0, 0.0, 10.0, 3.0); 3]);
        let controller = TransitionController::new(page.clone(), layout, catalog);

        assert_eq!(
            controller.show_service("UMANG").await,
            Err(TransitionError::PairingMismatch {
                sources: 10,
                targets: 3
            })
        );
        assert_eq!(controller.state(), ViewState::Grid);
        page.read(|doc| assert!(doc.clones.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_when_idle_is_harmless() {
        let (page, controller) = setup();
        controller.abort();
        assert_resting_grid(&page, &controller);
        assert_eq!(controller.show_service("MyGov").await, Ok(Outcome::Completed));
    }
}
