//! Developer CLI for MedalKit. Loads the catalog for an application and lets
//! you list medals and boards, trigger unlocks and post or query scores
//! against the live gateway.

use clap::{Parser, Subcommand};
use medalkit_core::{AppConfig, CipherStrategy, MedalKit, ScoreQuery};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "medalkit", version, about)]
struct Cli {
    /// Application id issued by the gateway.
    #[arg(long, env = "MEDALKIT_APP_ID")]
    app_id: String,

    /// Pre-shared AES key, base64-encoded. Omit for plaintext calls.
    #[arg(long, env = "MEDALKIT_CIPHER_KEY")]
    cipher_key: Option<String>,

    /// Use the legacy fixed-IV cipher format instead of random IVs.
    #[arg(long, requires = "cipher_key")]
    fixed_iv: bool,

    /// Debug mode: every call blocks and logs its response.
    #[arg(long)]
    debug: bool,

    /// Host page URL to recover the player session from.
    #[arg(long)]
    session_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the medal catalog.
    Medals,
    /// List the scoreboards.
    Boards,
    /// Unlock the medal at the given catalog index.
    Unlock {
        /// Medal index.
        index: usize,
    },
    /// Post a score to the board at the given catalog index.
    PostScore {
        /// Board index.
        board: usize,
        /// Score value.
        value: i64,
    },
    /// Fetch a page of scores from the board at the given catalog index.
    Scores {
        /// Board index.
        board: usize,
        /// Entries to skip.
        #[arg(long, default_value_t = 0)]
        skip: u32,
        /// Maximum entries to return.
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Restrict to a specific user, by id or name.
        #[arg(long)]
        user: Option<String>,
    },
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::new(&cli.app_id).with_debug(cli.debug);
    if let Some(key) = &cli.cipher_key {
        let strategy = if cli.fixed_iv {
            CipherStrategy::FixedIv
        } else {
            CipherStrategy::RandomIv
        };
        config = config.with_cipher(key, strategy);
    }
    if let Some(url) = &cli.session_url {
        config = config.with_session_from_url(url);
    }

    let mut kit = MedalKit::new(config)?;

    match cli.command {
        Command::Medals => {
            for (index, medal) in kit.medals().iter().enumerate() {
                let state = if medal.unlocked { "unlocked" } else { "locked" };
                println!("{index:3}  [{state:8}]  {}", kit.medal_display_text(medal));
            }
        }
        Command::Boards => {
            for (index, board) in kit.scoreboards().iter().enumerate() {
                println!("{index:3}  {}", board.name);
            }
        }
        Command::Unlock { index } => {
            kit.unlock_medal(index);
            match kit.medals().get(index) {
                Some(medal) => println!("unlock sent for \"{}\"", medal.name),
                None => println!("no medal at index {index}"),
            }
        }
        Command::PostScore { board, value } => {
            kit.post_score(board, value);
            match kit.scoreboards().get(board) {
                Some(board) => println!("score {value} posted to \"{}\"", board.name),
                None => println!("no board at index {board}"),
            }
        }
        Command::Scores {
            board,
            skip,
            limit,
            user,
        } => {
            let query = ScoreQuery {
                user,
                skip,
                limit,
                ..ScoreQuery::default()
            };
            match kit.get_scores(board, &query)? {
                Some(response) => println!(
                    "{}",
                    serde_json::to_string_pretty(response.data().unwrap_or(&Value::Null))?
                ),
                None => println!("no board at index {board}"),
            }
        }
    }

    Ok(())
}
