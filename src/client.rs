use crate::ui;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use gacha_sim::{
    clock::{
        Clock,
        SystemClock,
    },
    engine::{
        RandomReels,
        Reels,
        SpinGrid,
        WinLine,
    },
    error::GachaError,
    format::{
        format_currency,
        render_grid,
    },
    session::{
        Session,
        SpinOutcome,
        StatusOutcome,
    },
    state::MAX_ATTEMPTS,
    store::{
        JsonFileStore,
        MemoryStore,
        StateStore,
    },
};
use itertools::Itertools;
use rand::rngs::StdRng;
use std::{
    error::Error,
    fs,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use tracing::{
    error,
    warn,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

const LOG_FILE: &str = "gacha.log";
const MESSAGE_HISTORY: usize = 50;
const REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageMode {
    File(PathBuf),
    Ephemeral,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageMode,
    pub seed: Option<u64>,
}

pub type GameSession = Session<Box<dyn StateStore>, SystemClock, RandomReels<StdRng>>;

impl AppConfig {
    pub fn save_location(&self) -> String {
        match &self.storage {
            StorageMode::File(path) => path.display().to_string(),
            StorageMode::Ephemeral => String::from("in-memory"),
        }
    }

    pub fn open_session(&self) -> GameSession {
        let store: Box<dyn StateStore> = match &self.storage {
            StorageMode::File(path) => Box::new(JsonFileStore::new(path)),
            StorageMode::Ephemeral => Box::new(MemoryStore::new()),
        };
        let reels = match self.seed {
            Some(seed) => RandomReels::seeded(seed),
            None => RandomReels::from_entropy(),
        };
        Session::new(store, SystemClock, reels)
    }
}

pub enum Command {
    Spin,
    Buy { quantity: String },
    Status,
    Reset { confirmed: bool },
}

/// Logs go to a file so they never interleave with the terminal UI.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::never(log_dir, LOG_FILE));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub is_error: bool,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub status: Option<StatusOutcome>,
    pub last_grid: Option<SpinGrid>,
    pub winning_lines: Vec<WinLine>,
    pub messages: Vec<LogEntry>,
    pub save_location: String,
}

pub struct AppController<S, C, R> {
    session: Session<S, C, R>,
    status: Option<StatusOutcome>,
    last_grid: Option<SpinGrid>,
    winning_lines: Vec<WinLine>,
    messages: Vec<LogEntry>,
    save_location: String,
}

impl<S: StateStore, C: Clock, R: Reels> AppController<S, C, R> {
    pub fn new(session: Session<S, C, R>, save_location: impl Into<String>) -> Self {
        Self {
            session,
            status: None,
            last_grid: None,
            winning_lines: Vec::new(),
            messages: Vec::new(),
            save_location: save_location.into(),
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            status: self.status.clone(),
            last_grid: self.last_grid,
            winning_lines: self.winning_lines.clone(),
            messages: self.messages.clone(),
            save_location: self.save_location.clone(),
        }
    }

    pub fn refresh(&mut self) {
        match self.session.status() {
            Ok(status) => {
                if status.reset_applied {
                    self.push_message("⏰ Attempts refilled!");
                }
                self.status = Some(status);
            }
            Err(e) => self.push_failure(&e),
        }
    }

    pub fn spin(&mut self) {
        match self.session.spin() {
            Ok(outcome) => {
                if let SpinOutcome::Spun(report) = &outcome {
                    self.last_grid = Some(report.grid);
                    self.winning_lines = report.winning_lines.clone();
                }
                let icon = if outcome.success() { "🎉" } else { "❌" };
                self.push_message(format!("{icon} {}", outcome.message()));
                if let Some(timer) = outcome.timer_label() {
                    self.push_message(format!("⏰ {timer}"));
                }
            }
            Err(e) => self.push_failure(&e),
        }
        self.refresh();
    }

    pub fn buy(&mut self, quantity: u64) {
        match self.session.purchase_input(&quantity.to_string()) {
            Ok(outcome) => self.push_message(format!("✅ {}", outcome.message())),
            Err(GachaError::InvalidPurchaseQuantity { .. }) => {
                self.push_error("Quantity must be at least 1 pack")
            }
            Err(e) => self.push_failure(&e),
        }
        self.refresh();
    }

    pub fn reset(&mut self) {
        match self.session.reset() {
            Ok(outcome) => {
                self.last_grid = None;
                self.winning_lines.clear();
                self.push_message(format!("✅ {}", outcome.message()));
            }
            Err(e) => self.push_failure(&e),
        }
        self.refresh();
    }

    fn push_message(&mut self, text: impl Into<String>) {
        self.push(LogEntry {
            text: text.into(),
            is_error: false,
        });
    }

    fn push_failure(&mut self, err: &(dyn Error + 'static)) {
        self.push_error(error_chain(err));
    }

    fn push_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!("{}", text);
        self.push(LogEntry {
            text,
            is_error: true,
        });
    }

    fn push(&mut self, entry: LogEntry) {
        self.messages.push(entry);
        if self.messages.len() > MESSAGE_HISTORY {
            let drain = self.messages.len() - MESSAGE_HISTORY;
            self.messages.drain(0..drain);
        }
    }
}

/// The error followed by each of its causes.
fn error_chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |&e| e.source()).join(": ")
}

pub fn run_app(config: AppConfig) -> Result<()> {
    let mut controller = AppController::new(config.open_session(), config.save_location());
    let mut ui_state = ui::UiState::default();

    tracing::info!(save = %config.save_location(), "starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state);
    ui::terminal_exit()?;
    res
}

fn run_loop<S: StateStore, C: Clock, R: Reels>(
    controller: &mut AppController<S, C, R>,
    ui_state: &mut ui::UiState,
) -> Result<()> {
    controller.refresh();
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        match ui::next_event(ui_state, REFRESH_INTERVAL)? {
            ui::UserEvent::Quit => break,
            ui::UserEvent::Spin => controller.spin(),
            ui::UserEvent::Buy(quantity) => controller.buy(quantity),
            ui::UserEvent::Reset => controller.reset(),
            ui::UserEvent::Refresh | ui::UserEvent::Tick => controller.refresh(),
            ui::UserEvent::Redraw => {}
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}

/// Runs one action and prints its outcome as plain text.
pub fn run_command(config: AppConfig, command: Command) -> Result<()> {
    let mut session = config.open_session();
    match command {
        Command::Spin => {
            let outcome = session.spin().wrap_err("Spin failed")?;
            if let SpinOutcome::Spun(report) = &outcome {
                for line in render_grid(&report.grid) {
                    println!("{line}");
                }
            }
            println!("{}", outcome.message());
            if let SpinOutcome::Spun(report) = &outcome {
                println!("💰 Balance: {} coins", format_currency(report.balance));
            }
            println!("⚡ Attempts left: {}/{}", outcome.attempts_left(), MAX_ATTEMPTS);
            if let Some(timer) = outcome.timer_label() {
                println!("⏰ {timer}");
            }
        }
        Command::Buy { quantity } => {
            let outcome = match session.purchase_input(&quantity) {
                Err(e @ GachaError::InvalidPurchaseQuantity { .. }) => {
                    warn!(%quantity, "invalid pack quantity");
                    return Err(eyre!(e)).wrap_err("Quantity must be at least 1 pack");
                }
                other => other.wrap_err("Purchase failed")?,
            };
            println!("{}", outcome.message());
            println!("💰 Balance: {} coins", format_currency(outcome.balance));
            println!("🎟️  Tokens: {}", outcome.tokens);
        }
        Command::Status => {
            let status = session.status().wrap_err("Status failed")?;
            println!("💰 Balance: {} coins", format_currency(status.balance));
            println!("🎟️  Tokens: {}", status.tokens);
            println!("⚡ Attempts: {}/{}", status.attempts_left, MAX_ATTEMPTS);
            println!("🎉 Total wins: {}", status.total_wins);
            println!("😢 Total losses: {}", status.total_losses);
            if let Some(rate) = status.win_rate() {
                println!("📈 Win rate: {rate:.1}%");
            }
            println!("⏰ Reset in: {}", status.next_reset_label());
        }
        Command::Reset { confirmed } => {
            if !confirmed {
                return Err(eyre!("Reset cancelled; pass --yes to confirm"));
            }
            let outcome = session.reset().wrap_err("Reset failed")?;
            println!("{}", outcome.message());
        }
    }
    Ok(())
}
