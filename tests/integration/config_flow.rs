//! Config and catalog files on disk feeding the controllers.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use govdesk::config::Config;
use govdesk::content::ServiceCatalog;
use govdesk::layout::TerminalLayout;
use govdesk::page::{Document, Page};
use govdesk::transition::{Outcome, TransitionController};

#[test]
fn test_config_points_at_custom_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("services.toml");
    fs::write(
        &catalog_path,
        r#"
[[service]]
id = "e-Shram"
content = "<h2>e-Shram</h2><p>Register as an unorganised worker.</p>"

[[service]]
id = "PM-KISAN"
label = "Kisan"
content = "<h2>PM-KISAN</h2>"
"#,
    )
    .unwrap();
    let config_path = dir.path().join("govdesk.toml");
    fs::write(
        &config_path,
        format!(
            "services_file = \"{}\"\nreply_delay_ms = 0\n",
            catalog_path.display()
        ),
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();
    let catalog = ServiceCatalog::load_or_builtin(config.services_path().as_deref()).unwrap();
    assert_eq!(catalog.labels(), vec!["e-Shram", "Kisan"]);

    let document = Document::new(&catalog);
    let view = document.services.as_ref().unwrap();
    assert_eq!(view.cards.len(), 2);
    assert_eq!(view.tabs[1].label, "Kisan");
}

#[tokio::test(start_paused = true)]
async fn test_custom_catalog_drives_transition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("services.toml");
    fs::write(
        &path,
        "[[service]]\nid = \"A\"\ncontent = \"<h2>A</h2>\"\n\n[[service]]\nid = \"B\"\ncontent = \"<h2>B</h2>\"\n",
    )
    .unwrap();

    let catalog = Arc::new(ServiceCatalog::load(&path).unwrap());
    let page = Page::new(Document::new(&catalog));
    let layout = Arc::new(TerminalLayout::new(100, 30, catalog.labels()));
    let transitions = TransitionController::new(page.clone(), layout, catalog);

    assert_eq!(transitions.show_service("B").await, Ok(Outcome::Completed));
    page.read(|doc| {
        assert_eq!(doc.services.as_ref().unwrap().info_html, "<h2>B</h2>");
    });
}

#[test]
fn test_bad_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("govdesk.toml");
    fs::write(&path, "[server]\nport = 0\n").unwrap();
    assert!(Config::load_from(&path).is_err());
}
