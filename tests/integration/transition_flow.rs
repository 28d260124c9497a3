//! Grid/tabs handoff measured with real terminal geometry.

use std::sync::Arc;
use std::time::Duration;

use govdesk::layout::TerminalLayout;
use govdesk::page::Part;
use govdesk::transition::{Outcome, Timing, TransitionController, TransitionError, ViewState};

use crate::fixtures::{catalog, page};

fn controller(width: u16, height: u16) -> (TransitionController, Arc<TerminalLayout>) {
    let catalog = catalog();
    let page = page(&catalog);
    let layout = Arc::new(TerminalLayout::new(width, height, catalog.labels()));
    (
        TransitionController::new(page, layout.clone(), catalog),
        layout,
    )
}

#[tokio::test(start_paused = true)]
async fn test_round_trip_restores_grid() {
    let catalog = catalog();
    let page = page(&catalog);
    let layout = Arc::new(TerminalLayout::new(120, 40, catalog.labels()));
    let transitions = TransitionController::new(page.clone(), layout, catalog.clone());

    assert_eq!(transitions.show_service("IRCTC").await, Ok(Outcome::Completed));
    assert_eq!(transitions.state(), ViewState::Tabs);
    page.read(|doc| {
        let view = doc.services.as_ref().unwrap();
        assert_eq!(view.info_html, catalog.content_for("IRCTC"));
        assert_eq!(view.active_tab(), catalog.index_of("IRCTC"));
        assert!(!view.style(Part::Grid).unwrap().displayed);
        assert!(view.style(Part::Back).unwrap().is_visible());
        assert!(doc.clones.is_empty());
    });

    assert_eq!(transitions.back().await, Ok(Outcome::Completed));
    assert_eq!(transitions.state(), ViewState::Grid);
    page.read(|doc| {
        let view = doc.services.as_ref().unwrap();
        assert!(view.style(Part::Grid).unwrap().is_visible());
        assert!(!view.style(Part::Back).unwrap().displayed);
        assert_eq!(view.active_tab(), None);
        assert!(doc.clones.is_empty());
    });
}

#[tokio::test(start_paused = true)]
async fn test_animating_only_mid_flight() {
    let (transitions, _layout) = controller(120, 40);

    let run = tokio::spawn({
        let transitions = transitions.clone();
        async move { transitions.show_service("DigiLocker").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(transitions.is_animating());
    assert_eq!(transitions.state(), ViewState::Forward);

    assert_eq!(run.await.unwrap(), Ok(Outcome::Completed));
    assert!(!transitions.is_animating());
}

#[tokio::test(start_paused = true)]
async fn test_resize_mid_flight_resets() {
    let (transitions, layout) = controller(120, 40);
    let timing = Timing::default();

    let run = tokio::spawn({
        let transitions = transitions.clone();
        async move { transitions.show_service("NVSP").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    layout.set_size(90, 30);
    let resized = tokio::spawn({
        let transitions = transitions.clone();
        async move { transitions.on_resize().await }
    });
    tokio::time::sleep(timing.resize_debounce + Duration::from_millis(10)).await;

    assert!(resized.await.unwrap());
    assert_eq!(run.await.unwrap(), Ok(Outcome::Aborted));
    assert_eq!(transitions.state(), ViewState::Grid);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_service_leaves_grid_untouched() {
    let (transitions, _layout) = controller(120, 40);
    assert_eq!(
        transitions.show_service("Passport Seva").await,
        Err(TransitionError::UnknownService("Passport Seva".to_string()))
    );
    assert_eq!(transitions.state(), ViewState::Grid);
}
