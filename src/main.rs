use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::Result;
use gacha_sim::store::DEFAULT_SAVE_FILE;
use std::path::PathBuf;

mod client;
mod ui;

#[derive(Parser)]
#[command(name = "gacha", version, about = "Mini gacha slot game with time-rationed attempts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Player record location
    #[arg(long, global = true, env = "GACHA_SAVE_FILE", default_value = DEFAULT_SAVE_FILE)]
    save_file: String,
    /// Directory for the log file
    #[arg(long, global = true, env = "GACHA_LOG_DIR", default_value = ".logs")]
    log_dir: String,
    /// Seed the reels for a reproducible session
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Keep state in memory only; nothing is written
    #[arg(long, global = true, default_value_t = false)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Spend one attempt on a spin
    Spin,
    /// Buy gacha packs (5 tokens each)
    Buy { quantity: String },
    /// Show balance, tokens, attempts and the reset timer
    Status,
    /// Wipe all player data
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = client::init_tracing(&expand_path(&cli.log_dir))?;

    let storage = if cli.ephemeral {
        client::StorageMode::Ephemeral
    } else {
        client::StorageMode::File(expand_path(&cli.save_file))
    };
    let config = client::AppConfig {
        storage,
        seed: cli.seed,
    };

    match cli.command {
        None => client::run_app(config),
        Some(Commands::Spin) => client::run_command(config, client::Command::Spin),
        Some(Commands::Buy { quantity }) => {
            client::run_command(config, client::Command::Buy { quantity })
        }
        Some(Commands::Status) => client::run_command(config, client::Command::Status),
        Some(Commands::Reset { yes }) => {
            client::run_command(config, client::Command::Reset { confirmed: yes })
        }
    }
}
