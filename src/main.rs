use std::io::{self, stdout, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;

use govdesk::app::LogicThread;
use govdesk::assistant::{Assistant, ProxyClient};
use govdesk::chat::{
    ChatController, LookupController, LookupOutcome, LookupRequest, SubmitOutcome, DEFAULT_APP,
    DEFAULT_LANGUAGE,
};
use govdesk::config::Config;
use govdesk::content::ServiceCatalog;
use govdesk::markup::{text_lines, CmarkRenderer};
use govdesk::page::{Document, LookupOutput, Page};
use govdesk::render::RenderState;
use govdesk::{glog, proxy, ui, Error, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps

/// govdesk - government e-services help desk in the terminal
#[derive(Parser, Debug)]
#[command(name = "govdesk")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    GOVDESK_DEBUG=1     Enable debug logging (alternative to --debug)\n    GEMINI_API_KEY      Upstream key for `govdesk serve`")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.govdesk/govdesk.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Assistant endpoint (overrides `endpoint` in govdesk.toml)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the language-model proxy server
    Serve {
        /// Port to listen on (overrides [server].port)
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Ask the assistant one question and print the answer
    Ask {
        /// The question
        text: String,
    },

    /// Print an overview of a service app, or help with a problem in it
    Lookup {
        /// App name, e.g. UMANG or DigiLocker
        #[arg(long, default_value = DEFAULT_APP)]
        app: String,

        /// Answer language
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Problem to get help with
        #[arg(long)]
        problem: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.endpoint = Some(endpoint);
    }

    match cli.command {
        Some(Command::Serve { port }) => {
            govdesk::log::init_for_server(cli.debug);
            if let Some(port) = port {
                config.server.port = port;
            }
            return Runtime::new()?.block_on(proxy::serve(&config.server));
        }
        Some(Command::Ask { text }) => {
            govdesk::log::init_with_debug(cli.debug);
            return run_ask(&config, &text);
        }
        Some(Command::Lookup {
            app,
            language,
            problem,
        }) => {
            govdesk::log::init_with_debug(cli.debug);
            return run_lookup(&config, &language, &app, problem.as_deref());
        }
        None => {
            govdesk::log::init_with_debug(cli.debug);
        }
    }

    if cli.debug {
        glog!("govdesk starting (debug mode enabled)");
    } else {
        glog!("govdesk starting");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let shutdown_clone = shutdown.clone();
    let logic_handle =
        thread::spawn(move || LogicThread::run(config, state_tx, shutdown_clone));

    let mut terminal = setup_terminal()?;
    let result = render_loop(&mut terminal, state_rx, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let logic_result = logic_handle
        .join()
        .map_err(|_| Error::TaskJoin("logic thread panicked".to_string()));
    restore_terminal(&mut terminal)?;
    result?;
    logic_result?
}

fn headless_page(config: &Config) -> Result<Page> {
    let catalog = ServiceCatalog::load_or_builtin(config.services_path().as_deref())?;
    Ok(Page::new(Document::new(&catalog)))
}

/// One question through the chat controller, canned rules included.
fn run_ask(config: &Config, text: &str) -> Result<()> {
    let page = headless_page(config)?;
    let assistant: Arc<dyn Assistant> = Arc::new(ProxyClient::new(config.effective_endpoint())?);
    let chat = ChatController::new(page.clone(), assistant).with_reply_delay(Duration::ZERO);

    let outcome = Runtime::new()?.block_on(chat.submit(text));
    glog!("ask finished: {:?}", outcome);
    match outcome {
        SubmitOutcome::Canned | SubmitOutcome::Replied => {
            let answer = page.read(|doc| {
                doc.chat
                    .as_ref()
                    .and_then(|c| c.transcript.last())
                    .map(|node| node.message.content.clone())
            });
            println!("{}", answer.unwrap_or_default());
            Ok(())
        }
        SubmitOutcome::Failed(err) => Err(err.into()),
        SubmitOutcome::Ignored | SubmitOutcome::Discarded => {
            Err(Error::Validation("nothing to ask".to_string()))
        }
    }
}

fn run_lookup(config: &Config, language: &str, app: &str, problem: Option<&str>) -> Result<()> {
    let page = headless_page(config)?;
    let assistant: Arc<dyn Assistant> = Arc::new(ProxyClient::new(config.effective_endpoint())?);
    let lookup = LookupController::new(page.clone(), assistant).with_renderer(Arc::new(CmarkRenderer));

    let request = LookupRequest::new(language, app, problem);
    let outcome = Runtime::new()?.block_on(lookup.show(request));
    glog!("lookup finished: {:?}", outcome);
    match outcome {
        LookupOutcome::Shown => {
            let html = page.read(|doc| match doc.lookup.as_ref().map(|l| &l.output) {
                Some(LookupOutput::Ready(html)) => html.clone(),
                _ => String::new(),
            });
            for line in text_lines(&html) {
                println!("{}", line.text);
            }
            Ok(())
        }
        LookupOutcome::Failed(err) => Err(err.into()),
        LookupOutcome::Ignored | LookupOutcome::Discarded => {
            Err(Error::Validation("lookup did not run".to_string()))
        }
    }
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || s.version != last_version;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty || state.is_moving() {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}
