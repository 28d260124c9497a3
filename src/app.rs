use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::assistant::{Assistant, ProxyClient};
use crate::chat::{ChatController, LookupController};
use crate::config::Config;
use crate::content::ServiceCatalog;
use crate::layout::TerminalLayout;
use crate::markup::{CmarkRenderer, MarkdownRenderer};
use crate::page::{Document, Page};
use crate::render::RenderState;
use crate::speech::{CommandSpeech, SpeechCapture};
use crate::tea::{update, Command, Message, Model};
use crate::transition::{TransitionController, ViewState};
use crate::{glog, glog_debug, glog_warn, Result};

const MAX_BG_MESSAGES: usize = 50;

/// Everything the command executor drives.
pub struct Controllers {
    pub page: Page,
    pub catalog: Arc<ServiceCatalog>,
    pub layout: Arc<TerminalLayout>,
    pub chat: Arc<ChatController>,
    pub lookup: Arc<LookupController>,
    pub transitions: TransitionController,
}

impl Controllers {
    pub fn new(
        config: &Config,
        catalog: Arc<ServiceCatalog>,
        page: Page,
        layout: Arc<TerminalLayout>,
        assistant: Arc<dyn Assistant>,
        speech: Option<Arc<dyn SpeechCapture>>,
    ) -> Self {
        let renderer: Arc<dyn MarkdownRenderer> = Arc::new(CmarkRenderer);
        let chat = ChatController::new(page.clone(), assistant.clone())
            .with_renderer(renderer.clone())
            .with_speech(speech)
            .with_reply_delay(config.reply_delay());
        let lookup = LookupController::new(page.clone(), assistant).with_renderer(renderer);
        let transitions = TransitionController::new(page.clone(), layout.clone(), catalog.clone());
        Self {
            page,
            catalog,
            layout,
            chat: Arc::new(chat),
            lookup: Arc::new(lookup),
            transitions,
        }
    }

    /// Production wiring: proxy-backed assistant, markdown renderer, and the
    /// configured speech command when it resolves.
    pub fn from_config(config: &Config, width: u16, height: u16) -> Result<Self> {
        let catalog = Arc::new(ServiceCatalog::load_or_builtin(
            config.services_path().as_deref(),
        )?);
        let page = Page::new(Document::new(&catalog));
        let layout = Arc::new(TerminalLayout::new(width, height, catalog.labels()));
        let assistant: Arc<dyn Assistant> = Arc::new(ProxyClient::new(config.effective_endpoint())?);
        let speech = config
            .speech_command
            .as_deref()
            .and_then(CommandSpeech::resolve)
            .map(|s| Arc::new(s) as Arc<dyn SpeechCapture>);
        glog_debug!(
            "Controllers::from_config services={} speech={}",
            catalog.len(),
            speech.is_some()
        );
        Ok(Self::new(config, catalog, page, layout, assistant, speech))
    }
}

pub struct LogicThread;

impl LogicThread {
    pub fn run(config: Config, state_tx: Sender<RenderState>, shutdown: Arc<AtomicBool>) -> Result<()> {
        Runtime::new()?.block_on(Self::run_async(config, state_tx, shutdown))
    }

    async fn run_async(
        config: Config,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        glog_debug!(
            "LogicThread::run_async endpoint={} size={}x{}",
            config.effective_endpoint(),
            width,
            height
        );
        let controllers = Controllers::from_config(&config, width, height)?;
        let mut model = Model::new(
            controllers.page.clone(),
            controllers.catalog.clone(),
            config,
        );

        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();
        let mut last_page_version = model.page.version();
        send_state(&state_tx, &model);

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Terminal input (priority)
            while event::poll(Duration::ZERO)? {
                let msg = match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => Message::Key(key),
                    Event::Resize(w, h) => Message::Resize(w, h),
                    _ => continue,
                };

                for cmd in update(&mut model, msg) {
                    if execute_command(&mut model, &controllers, cmd, &msg_tx) {
                        shutdown.store(true, Ordering::Relaxed);
                        controllers.transitions.abort();
                        return Ok(());
                    }
                }
            }

            // Controller completions (bounded)
            for _ in 0..MAX_BG_MESSAGES {
                let Ok(msg) = msg_rx.try_recv() else { break };
                for cmd in update(&mut model, msg) {
                    if execute_command(&mut model, &controllers, cmd, &msg_tx) {
                        shutdown.store(true, Ordering::Relaxed);
                        controllers.transitions.abort();
                        return Ok(());
                    }
                }
            }

            // Spawned tasks mutate the page directly
            let page_version = model.page.version();
            if page_version != last_page_version {
                last_page_version = page_version;
                model.dirty = true;
            }

            if model.dirty {
                send_state(&state_tx, &model);
                model.dirty = false;
            }

            tokio::time::sleep(Duration::from_micros(500)).await;
        }

        controllers.transitions.abort();
        Ok(())
    }
}

/// Run one command. Returns true when the app should quit.
pub fn execute_command(
    model: &mut Model,
    controllers: &Controllers,
    cmd: Command,
    msg_tx: &mpsc::UnboundedSender<Message>,
) -> bool {
    match cmd {
        Command::SubmitChat => {
            glog_debug!("Command::SubmitChat");
            let chat = controllers.chat.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let outcome = chat.submit_input().await;
                let _ = tx.send(Message::ChatFinished(outcome));
            });
        }

        Command::Dictate => {
            glog_debug!("Command::Dictate");
            let chat = controllers.chat.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = chat.dictate().await;
                let _ = tx.send(Message::DictationFinished(result));
            });
        }

        Command::NewChat => {
            glog!("Command::NewChat");
            controllers.chat.new_session();
            model.dirty = true;
        }

        Command::Lookup => {
            glog_debug!("Command::Lookup");
            let lookup = controllers.lookup.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let outcome = lookup.show_from_panel().await;
                let _ = tx.send(Message::LookupFinished(outcome));
            });
        }

        Command::ClearLookup => {
            glog_debug!("Command::ClearLookup");
            controllers.lookup.clear();
            model.dirty = true;
        }

        Command::Activate { index } => {
            glog_debug!("Command::Activate index={}", index);
            if controllers.transitions.state() == ViewState::Tabs {
                controllers.transitions.select_tab(index);
                model.dirty = true;
                return false;
            }
            let Some(service) = controllers.catalog.at(index) else {
                glog_warn!("Activate: no service at index {}", index);
                return false;
            };
            let id = service.id.clone();
            let transitions = controllers.transitions.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = transitions.show_service(&id).await;
                let _ = tx.send(Message::TransitionFinished(result));
            });
        }

        Command::Back => {
            glog_debug!("Command::Back");
            let transitions = controllers.transitions.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let result = transitions.back().await;
                let _ = tx.send(Message::TransitionFinished(result));
            });
        }

        Command::Resize { width, height } => {
            glog_debug!("Command::Resize {}x{}", width, height);
            controllers.layout.set_size(width, height);
            let transitions = controllers.transitions.clone();
            tokio::spawn(async move {
                transitions.on_resize().await;
            });
        }

        Command::Quit => {
            glog_debug!("Command::Quit");
            return true;
        }
    }

    false
}

fn send_state(state_tx: &Sender<RenderState>, model: &Model) {
    let _ = state_tx.try_send(model.snapshot());
}
