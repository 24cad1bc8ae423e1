use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod serve;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Run the API server and chat UI
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Start a chat session in the terminal
    Chat {
        /// Model to use, defaults to CHATBOT_MODEL
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature between 0.0 and 2.0
        #[arg(long)]
        temperature: Option<f64>,

        /// Response length: brief, normal, detailed or very-detailed
        #[arg(long)]
        length: Option<String>,

        /// System prompt defining the assistant's persona
        #[arg(long)]
        system_prompt: Option<String>,

        /// Wait for the whole reply instead of streaming it
        #[arg(long, action, default_value = "false")]
        no_stream: bool,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Values in a local .env file take precedence over the environment
    dotenvy::dotenv_override().ok();
    let config = AppConfig::from_env()?;

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::Chat {
            model,
            temperature,
            length,
            system_prompt,
            no_stream,
        }) => {
            let options = chat::ChatOptions {
                model,
                temperature,
                length,
                system_prompt,
                no_stream,
            };
            chat::run(config, options).await?;
        }
        None => {}
    }

    Ok(())
}
