use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mathoff::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    profile::{present_card, ClearAction, ProfileOutcome},
    runtime::{EventQueue, Runner},
    score::ScoreEntry,
    storage::{KeyValueStore, MemoryStorage, SqliteStorage},
    App,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin, BufRead, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TICK_RATE_MS: u64 = 250;

/// math practice scores and profile
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Keeps the MathOff score history on this device and shows the profile screen with your score cards and statistics."
)]
struct Cli {
    /// database file to use instead of the configured one
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// keep everything in memory; nothing is saved
    #[clap(long, global = true)]
    ephemeral: bool,

    /// config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// open the interactive profile screen (default)
    Profile,
    /// store a session token
    Login { token: String },
    /// forget the session token
    Logout,
    /// show whether a session is active
    Whoami,
    /// record the result of a finished round
    Record {
        #[clap(allow_negative_numbers = true)]
        points: i64,
        #[clap(long)]
        level: Option<i64>,
        #[clap(long)]
        operation: Option<String>,
        #[clap(long)]
        mode: Option<String>,
    },
    /// list score cards
    Scores {
        /// list the full history instead of the visible cards
        #[clap(long)]
        history: bool,
    },
    /// show games played and high score
    Stats,
    /// show the config file, optionally changing it
    Config {
        /// database file to use from now on
        #[clap(long)]
        set_db: Option<PathBuf>,
        /// default log filter when RUST_LOG is unset
        #[clap(long)]
        log_filter: Option<String>,
    },
    /// clear the visible cards, or everything
    Clear {
        /// only clear the visible cards; statistics are kept
        #[clap(long)]
        recent: bool,
        /// skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
}

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Never log to the terminal; it would corrupt the TUI
    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(&path).ok()
    });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
    }
}

fn open_storage(cli: &Cli, config: &Config) -> Result<Arc<dyn KeyValueStore>, Box<dyn Error>> {
    if cli.ephemeral {
        tracing::info!("using in-memory storage");
        return Ok(Arc::new(MemoryStorage::new()));
    }
    let path = cli
        .db
        .clone()
        .unwrap_or_else(|| config.resolved_database_path());
    Ok(Arc::new(SqliteStorage::open(path)?))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let mut config = config_store.load();
    init_tracing(&config);

    let command = cli.command.clone().unwrap_or(Command::Profile);
    if let Command::Config { set_db, log_filter } = &command {
        if set_db.is_some() || log_filter.is_some() {
            if let Some(path) = set_db {
                config.database_path = Some(path.clone());
            }
            if let Some(filter) = log_filter {
                config.log_filter = filter.clone();
            }
            config_store.save(&config)?;
        }
        println!("Config: {}", config_store.path().display());
        println!("Database: {}", config.resolved_database_path().display());
        println!("Log filter: {}", config.log_filter);
        return Ok(());
    }
    if matches!(command, Command::Profile) && !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let storage = open_storage(&cli, &config)?;
    let mut app = App::new(storage);

    match command {
        Command::Profile => run_profile(&mut app)?,
        Command::Login { token } => {
            app.session.set_token(&token)?;
            println!("Logged in.");
        }
        Command::Logout => {
            app.session.clear_token()?;
            println!("Logged out.");
        }
        Command::Whoami => match app.session.get_token()? {
            Some(_) => println!("Logged in to MathOff."),
            None => println!("Not logged in."),
        },
        Command::Record {
            points,
            level,
            operation,
            mode,
        } => {
            let durability = app.scores.add_score(points, level, operation, mode).wait();
            if durability.is_durable() {
                println!("Recorded {points}.");
            } else {
                eprintln!("Recorded {points}, but it could not be saved.");
            }
        }
        Command::Scores { history } => {
            let entries = if history {
                app.scores.history()
            } else {
                app.scores.visible()
            };
            print_cards(entries);
            print_stats(&app);
        }
        Command::Stats => print_stats(&app),
        Command::Config { .. } => {}
        Command::Clear { recent, yes } => {
            let action = if recent {
                ClearAction::Recent
            } else {
                ClearAction::All
            };
            if yes || confirm(action)? {
                if action.apply(&mut app.scores).wait().is_durable() {
                    println!("Done.");
                } else {
                    eprintln!("Cleared for this session, but the change could not be saved.");
                }
            } else {
                println!("Cancelled.");
            }
        }
    }

    Ok(())
}

fn print_cards(entries: &[ScoreEntry]) {
    if entries.is_empty() {
        println!("{}", mathoff::profile::EMPTY_SCORES_MESSAGE);
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        let card = present_card(index, entry);
        println!("{}\n  {}\n  {}\n  {}", card.title, card.detail, card.operation, card.score);
    }
}

fn print_stats(app: &App) {
    let stats = app.stats();
    println!("Games: {}", stats.total_games);
    println!("High score: {}", stats.high_score);
}

fn confirm(action: ClearAction) -> io::Result<bool> {
    print!("{} {} [y/N] ", action.title(), action.message());
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn run_profile(app: &mut App) -> Result<(), Box<dyn Error>> {
    if !app.session.has_session()? {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::InvalidValue,
            "not logged in; run `mathoff login <token>` first",
        )
        .exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if outcome? == ProfileOutcome::Logout {
        println!("Logged out. Run `mathoff login <token>` to sign in again.");
    }
    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<ProfileOutcome, Box<dyn Error>> {
    let runner = Runner::new(
        EventQueue::terminal(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let step = runner.step(app);
        if step.outcome != ProfileOutcome::Continue {
            return Ok(step.outcome);
        }
        if step.redraw {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }
}
