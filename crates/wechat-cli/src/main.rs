//! wechat: command-line tooling for WeChat callbacks and platform APIs.
//!
//! Offline helpers (`sign`, `encrypt`, `decrypt`, `verify-url`) for
//! debugging callback endpoints, plus thin wrappers for the token, message
//! and menu APIs.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use wechat_core::Platform;

/// wechat: WeChat callback and API tooling
#[derive(Parser)]
#[command(name = "wechat", version, about = "WeChat callback and API tooling")]
struct Cli {
    /// Config file path [default: ~/.wechat/config.toml]
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Account platform: official or work
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// App id (official) or corp id (work)
    #[arg(long, global = true)]
    id: Option<String>,

    /// App secret or corp secret
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Callback token
    #[arg(long, global = true)]
    token: Option<String>,

    /// EncodingAESKey (43 characters)
    #[arg(long = "key", global = true)]
    key: Option<String>,

    /// Agent id (work accounts)
    #[arg(long, global = true)]
    agent_id: Option<i64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the signature over a set of strings
    Sign {
        /// Parts to sign (token, timestamp, nonce[, ciphertext])
        parts: Vec<String>,
    },

    /// Encrypt a message (reads stdin when omitted)
    Encrypt {
        message: Option<String>,

        /// Emit a signed response envelope instead of the bare ciphertext
        #[arg(long)]
        reply: bool,

        /// Fixed envelope timestamp (with --reply)
        #[arg(long, requires = "reply")]
        timestamp: Option<u64>,

        /// Fixed envelope nonce (with --reply)
        #[arg(long, requires = "reply")]
        nonce: Option<String>,
    },

    /// Decrypt a ciphertext or encrypted callback body (reads stdin when omitted)
    Decrypt {
        input: Option<String>,

        /// Print only the probed message kind
        #[arg(long)]
        probe: bool,
    },

    /// Answer a URL verification handshake
    VerifyUrl {
        #[arg(long)]
        signature: Option<String>,
        #[arg(long)]
        msg_signature: Option<String>,
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        nonce: String,
        #[arg(long)]
        echostr: String,
    },

    /// Fetch an access token
    Token,

    /// Send a text message
    Send {
        /// Recipient open id (official) or user ids joined by `|` (work)
        #[arg(long)]
        to: String,
        text: String,
        /// Use this access token instead of fetching one
        #[arg(long)]
        access_token: Option<String>,
    },

    /// Create the custom menu from a JSON file
    Menu {
        file: PathBuf,
        /// Use this access token instead of fetching one
        #[arg(long)]
        access_token: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("wechat=debug,wechat_cli=debug,wechat_client=debug")
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("wechat=warn,wechat_cli=warn,wechat_client=warn")
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    // Load config file.
    let config_path = cli.config.clone().unwrap_or_else(|| {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(".wechat").join("config.toml").to_string_lossy().to_string()
    });
    let cfg = match config::Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("wechat: {e:#}");
            std::process::exit(1);
        }
    };

    // CLI flags override the config file.
    let account = config::Account {
        platform: cli.platform,
        id: cli.id,
        secret: cli.secret,
        token: cli.token,
        encoding_aes_key: cli.key,
        agent_id: cli.agent_id,
    }
    .or(cfg.account);

    let result = match cli.command {
        Command::Sign { parts } => commands::sign::run(&parts),
        Command::Encrypt {
            message,
            reply,
            timestamp,
            nonce,
        } => commands::encrypt::run(
            &account,
            message.as_deref(),
            reply,
            timestamp,
            nonce.as_deref(),
        ),
        Command::Decrypt { input, probe } => {
            commands::decrypt::run(&account, input.as_deref(), probe)
        }
        Command::VerifyUrl {
            signature,
            msg_signature,
            timestamp,
            nonce,
            echostr,
        } => commands::verify_url::run(
            &account,
            commands::verify_url::Params {
                signature,
                msg_signature,
                timestamp,
                nonce,
                echostr,
            },
        ),
        Command::Token => commands::token::run(&account).await,
        Command::Send {
            to,
            text,
            access_token,
        } => commands::send::run(&account, &to, &text, access_token.as_deref()).await,
        Command::Menu { file, access_token } => {
            commands::menu::run(&account, &file, access_token.as_deref()).await
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("wechat: {e:#}");
        std::process::exit(1);
    }
}
