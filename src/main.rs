use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use typetest::{
    app_dirs::AppDirs,
    bests::{FileBestsStore, PersonalBestsStore},
    config::{Config, ConfigStore, FileConfigStore},
    controller::ModeController,
    corpus::Corpus,
    engine::key_to_event,
    history::SessionLog,
    mode::Mode,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    stats::ErrorCounting,
};

/// timed typing test with live stats and per-mode personal bests
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed typing test: type the passage before the clock runs out. Tracks net WPM, accuracy and errors live, and keeps a personal best for each of the 30s, 60s and 120s modes."
)]
pub struct Cli {
    /// test duration in seconds (30, 60 or 120)
    #[clap(short = 'm', long)]
    mode: Option<u64>,

    /// custom passage to type instead of the built-in corpus
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// JSON file of passages: {"name": "...", "passages": ["...", ...]}
    #[clap(long)]
    corpus: Option<PathBuf>,

    /// whether corrected mistakes still count as errors
    #[clap(long, value_enum)]
    error_counting: Option<ErrorCounting>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Applies command line overrides on top of the stored config
    fn merge_into(&self, mut config: Config) -> Result<Config, typetest::error::TypingError> {
        if let Some(secs) = self.mode {
            config.mode = Mode::try_from(secs)?;
        }
        if let Some(counting) = self.error_counting {
            config.error_counting = counting;
        }
        if let Some(corpus) = &self.corpus {
            config.corpus = Some(corpus.clone());
        }
        Ok(config)
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    controller: ModeController,
    config: Config,
    config_store: Box<dyn ConfigStore>,
}

impl App {
    fn new(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        Self::with_stores(
            cli,
            Box::new(FileBestsStore::open_default()),
            SessionLog::open_default(),
        )
    }

    fn with_stores(
        cli: &Cli,
        bests: Box<dyn PersonalBestsStore>,
        history: Option<SessionLog>,
    ) -> Result<Self, Box<dyn Error>> {
        let config_store = cli.config_store();
        let config = cli.merge_into(config_store.load())?;

        let corpus = match (&cli.prompt, &config.corpus) {
            (Some(prompt), _) => Corpus::single(prompt.clone())?,
            (None, Some(path)) => Corpus::from_file(path)?,
            (None, None) => Corpus::builtin()?,
        };
        tracing::info!("using corpus '{}' ({} passages)", corpus.name, corpus.len());

        let mut controller = ModeController::new(Box::new(corpus), bests, config.mode)?
            .with_error_counting(config.error_counting);
        if let Some(log) = history {
            controller = controller.with_history(log);
        }

        let app = Self {
            controller,
            config,
            config_store: Box::new(config_store),
        };
        app.persist_config();
        Ok(app)
    }

    fn persist_config(&self) {
        if let Err(err) = self.config_store.save(&self.config) {
            tracing::warn!("failed to save config: {}", err);
        }
    }

    fn switch_mode(&mut self, mode: Mode) -> Result<(), Box<dyn Error>> {
        self.controller.switch_mode(mode)?;
        self.config.mode = mode;
        self.persist_config();
        Ok(())
    }

    /// Steady typing can keep `Tick` from ever arriving, so the clock is
    /// polled on every event
    fn on_event(&mut self, event: AppEvent) -> Result<Flow, Box<dyn Error>> {
        self.controller.poll_timer();
        match event {
            AppEvent::Tick | AppEvent::Resize => Ok(Flow::Continue),
            AppEvent::Key(key) => self.on_key(key),
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<Flow, Box<dyn Error>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Flow::Quit);
        }

        match key.code {
            KeyCode::Esc => return Ok(Flow::Quit),
            KeyCode::Left => self.controller.restart()?,
            KeyCode::Right => self.controller.load_new_text()?,
            KeyCode::Tab => self.switch_mode(self.controller.mode().next())?,
            KeyCode::BackTab => self.switch_mode(self.controller.mode().previous())?,
            KeyCode::Char('r') if self.controller.is_complete() => self.controller.restart()?,
            KeyCode::Char('n') if self.controller.is_complete() => {
                self.controller.load_new_text()?
            }
            _ => {
                if let Some(event) = key_to_event(&key) {
                    self.controller.handle_event(event);
                }
            }
        }
        Ok(Flow::Continue)
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    // stdout belongs to the TUI, so logs go to a file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("TYPETEST_LOG")
                .unwrap_or_else(|_| "typetest=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let mut app = match App::new(&cli) {
        Ok(app) => app,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err).exit();
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| f.render_widget(&app.controller, f.area()))?;

        if app.on_event(runner.step())? == Flow::Quit {
            break;
        }
    }

    Ok(())
}
