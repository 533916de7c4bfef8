// Svalbard server and operator tooling

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use svalbard_core::{RequestId, Token, TokenMessage};
use svalbard_server::ServerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "svalbard")]
#[command(about = "Svalbard - token-gated custody of secret shares", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Config file path (TOML); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the bind address, e.g. 0.0.0.0:8080
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Encode a token message as sent over the secondary channel
    Encode {
        /// Request id the token answers
        #[arg(short, long)]
        request_id: String,

        /// Token value
        #[arg(short, long)]
        token: String,
    },

    /// Decode a token message received over the secondary channel
    Decode {
        /// Message text, e.g. SVBD:req-1:0f3a...
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut config = match config {
                Some(path) => ServerConfig::load_from_file(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            svalbard_server::serve(config).await?;
        }
        Commands::Encode { request_id, token } => {
            let message = TokenMessage::new(RequestId::new(request_id), Token::new(token));
            println!("{}", message.encode()?);
        }
        Commands::Decode { message } => {
            let decoded: TokenMessage = message.parse()?;
            println!("request_id: {}", decoded.request_id);
            println!("token: {}", decoded.token.expose());
        }
    }

    Ok(())
}
