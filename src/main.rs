pub mod ui;

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn, LevelFilter};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use reflex::{
    analytics::CsvAnalytics,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    leaderboard::{LeaderboardClient, MemoryLeaderboard, SqliteLeaderboard},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    spawner::{Area, TargetSpawner},
};
use std::{
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

const TICK_RATE_MS: u64 = 20;
const MAX_NAME_LEN: usize = 24;

/// click the moving target before it vanishes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal reflex game: click the target with your mouse before it vanishes. Targets appear faster as the 60 second clock runs down. Your best score is kept on a local leaderboard."
)]
pub struct Cli {
    /// name to prefill on the login screen
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// number of leaderboard entries to show
    #[clap(short = 't', long)]
    top: Option<usize>,

    /// where scores are kept
    #[clap(long, value_enum, default_value_t = StoreKind::Sqlite)]
    store: StoreKind,

    /// leaderboard database file (defaults to ~/.local/state/reflex/leaderboard.db)
    #[clap(long)]
    db: Option<PathBuf>,

    /// seed target placement for reproducible runs
    #[clap(long)]
    seed: Option<u64>,

    /// don't record game_finished events
    #[clap(long)]
    no_analytics: bool,

    /// print the leaderboard and exit
    #[clap(long)]
    show_leaderboard: bool,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum, strum_macros::Display)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl Cli {
    fn open_leaderboard(&self) -> anyhow::Result<Box<dyn LeaderboardClient>> {
        match self.store {
            StoreKind::Memory => Ok(Box::new(MemoryLeaderboard::new())),
            StoreKind::Sqlite => {
                let path = self
                    .db
                    .clone()
                    .or_else(AppDirs::db_path)
                    .unwrap_or_else(|| PathBuf::from("reflex_leaderboard.db"));
                let db = SqliteLeaderboard::open(&path)
                    .with_context(|| format!("opening leaderboard at {}", path.display()))?;
                Ok(Box::new(db))
            }
        }
    }

    fn leaderboard_size(&self, config: &Config) -> usize {
        self.top.unwrap_or(config.leaderboard_size)
    }

    fn analytics_enabled(&self, config: &Config) -> bool {
        !self.no_analytics && config.analytics
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Login,
    Playing,
    Leaderboard,
}

pub struct App {
    pub game: Game,
    pub state: AppState,
    pub username_input: String,
    pub alert: Option<String>,
    /// absolute terminal rect of the play area, used to map clicks
    pub play_area: Rect,
    pub config: Config,
    config_store: Option<FileConfigStore>,
}

impl App {
    pub fn new(game: Game, username: String) -> Self {
        Self {
            game,
            state: AppState::Login,
            username_input: username,
            alert: None,
            play_area: Rect::default(),
            config: Config::default(),
            config_store: None,
        }
    }

    pub fn with_config(mut self, config: Config, store: FileConfigStore) -> Self {
        self.config = config;
        self.config_store = Some(store);
        self
    }

    /// Recompute the play area for a terminal of `width` x `height`
    pub fn fit(&mut self, width: u16, height: u16) {
        self.play_area = ui::play_area(Rect::new(0, 0, width, height));
        self.game
            .resize(Area::new(self.play_area.width, self.play_area.height));
    }

    pub fn type_char(&mut self, c: char) {
        if self.username_input.chars().count() < MAX_NAME_LEN && !c.is_control() {
            self.username_input.push(c);
            self.alert = None;
        }
    }

    pub fn backspace(&mut self) {
        self.username_input.pop();
    }

    /// Login -> Playing, unless the name is blank
    pub fn submit_username(&mut self) {
        match self.game.start(&self.username_input) {
            Ok(()) => {
                self.alert = None;
                self.state = AppState::Playing;
                self.remember_username();
            }
            Err(e) => {
                self.alert = Some(e.to_string());
            }
        }
    }

    pub fn on_click(&mut self, column: u16, row: u16) {
        if self.state != AppState::Playing {
            return;
        }
        let area = self.play_area;
        if column < area.x || row < area.y {
            return;
        }
        self.game.click(column - area.x, row - area.y);
    }

    pub fn on_tick(&mut self, elapsed_ms: u64) {
        if self.state != AppState::Playing {
            return;
        }
        self.game.advance(elapsed_ms);
        if self.game.has_finished() {
            self.state = AppState::Leaderboard;
        }
    }

    /// Discard the session and go back to the login screen
    pub fn restart(&mut self) {
        self.game.reset();
        self.state = AppState::Login;
        self.alert = None;
    }

    fn remember_username(&mut self) {
        let Some(session) = self.game.session() else {
            return;
        };
        self.username_input = session.username.clone();
        self.config.username = Some(session.username.clone());
        if let Some(store) = &self.config_store {
            if let Err(e) = store.save(&self.config) {
                warn!("could not save config to {}: {}", store.path().display(), e);
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().append(true).create(true).open(&path) else {
        return;
    };

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = simplelog::WriteLogger::init(level, simplelog::Config::default(), file) {
        eprintln!("logging disabled: {}", e);
    }
}

fn print_leaderboard(board: &dyn LeaderboardClient, n: usize) -> anyhow::Result<()> {
    let entries = board.fetch_top(n)?;
    if entries.is_empty() {
        println!("No scores yet.");
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{}", ui::rank_line(i + 1, entry));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    let leaderboard = cli.open_leaderboard()?;

    if cli.show_leaderboard {
        return print_leaderboard(leaderboard.as_ref(), cli.leaderboard_size(&config));
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut game = Game::new(leaderboard).with_leaderboard_size(cli.leaderboard_size(&config));
    if let Some(seed) = cli.seed {
        game = game.with_spawner(TargetSpawner::with_seed(seed));
    }
    if cli.analytics_enabled(&config) {
        if let Some(path) = AppDirs::events_path() {
            game = game.with_analytics(Box::new(CsvAnalytics::new(path)));
        }
    }

    let username = cli
        .name
        .clone()
        .or_else(|| config.username.clone())
        .unwrap_or_default();
    let mut app = App::new(game, username).with_config(config, config_store);
    info!("reflex starting with {} store", cli.store);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug, PartialEq)]
enum KeyAction {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    match app.state {
        AppState::Login => match key.code {
            KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Enter => app.submit_username(),
            KeyCode::Backspace => app.backspace(),
            KeyCode::Char(c) => app.type_char(c),
            _ => {}
        },
        AppState::Playing => {
            if key.code == KeyCode::Esc {
                app.restart();
            }
        }
        AppState::Leaderboard => match key.code {
            KeyCode::Char('r') | KeyCode::Enter => app.restart(),
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            _ => {}
        },
    }

    KeyAction::Continue
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let size = terminal.size()?;
    app.fit(size.width, size.height);
    terminal.draw(|f| ui::draw(app, f))?;

    let mut last = Instant::now();

    loop {
        let event = runner.step();

        // Keep the game clock current before reacting to input
        let elapsed = last.elapsed().as_millis() as u64;
        last += Duration::from_millis(elapsed);
        app.on_tick(elapsed);

        match event {
            GameEvent::Tick => {}
            GameEvent::Resize => {
                let size = terminal.size()?;
                app.fit(size.width, size.height);
            }
            GameEvent::Click { column, row } => app.on_click(column, row),
            GameEvent::Key(key) => {
                if handle_key(app, key) == KeyAction::Quit {
                    break;
                }
            }
        }

        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
