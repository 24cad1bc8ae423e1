use std::io::{self, Write};

use anyhow::{Result, anyhow, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use uuid::Uuid;

use crate::ai::chat::{
    ChatMessage, Delivery, GenerationConfig, LengthPreference, Session, next_turn,
};
use crate::core::{AppConfig, logging};
use crate::openai::OpenAiBackend;

const GREETING: &str = "Hi! Ask me anything.";

const HELP: &str = "Commands:
  /reset              Clear the conversation
  /history            Show the conversation so far
  /settings           Show the current settings
  /model <name>       Switch models
  /temperature <t>    Set the temperature (0.0 to 2.0)
  /length <pref>      brief, normal, detailed or very-detailed
  /system <prompt>    Replace the system prompt
  /help               Show this message";

/// Settings passed on the command line. Anything left out uses the
/// defaults from `AppConfig`.
#[derive(Default, Debug)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub length: Option<String>,
    pub system_prompt: Option<String>,
    pub no_stream: bool,
}

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Say(String),
    Reset,
    History,
    Settings,
    Help,
    Model(String),
    Temperature(f64),
    Length(LengthPreference),
    System(String),
}

/// Parses a line of input. Returns `None` for blank lines.
fn parse_line(line: &str) -> Result<Option<ReplCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Ok(Some(ReplCommand::Say(line.to_string())));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let command = match name {
        "reset" => ReplCommand::Reset,
        "history" => ReplCommand::History,
        "settings" => ReplCommand::Settings,
        "help" => ReplCommand::Help,
        "temperature" => ReplCommand::Temperature(
            arg.parse()
                .map_err(|_| anyhow!("Usage: /temperature <0.0 to 2.0>"))?,
        ),
        "model" | "length" | "system" if arg.is_empty() => bail!("Usage: /{} <value>", name),
        "model" => ReplCommand::Model(arg.to_string()),
        "length" => ReplCommand::Length(LengthPreference::from(arg)),
        "system" => ReplCommand::System(arg.to_string()),
        _ => bail!("Unknown command /{}. Type /help to see the commands", name),
    };

    Ok(Some(command))
}

/// Builds the settings for the first turn from the command line
/// options and the config defaults.
fn initial_settings(config: &AppConfig, options: &ChatOptions) -> Result<GenerationConfig> {
    let defaults = config.default_generation_config()?;
    let length = options
        .length
        .as_deref()
        .map(LengthPreference::from)
        .unwrap_or(defaults.length);

    let settings = GenerationConfig::new(
        options.model.as_deref().unwrap_or(&defaults.model),
        options.temperature.unwrap_or(defaults.temperature),
        length,
        options
            .system_prompt
            .as_deref()
            .unwrap_or(&defaults.system_prompt),
    )?;
    settings.validate_model(&config.models)?;

    Ok(settings)
}

/// Applies a settings command, returning the new settings. The
/// current settings are left alone if the change isn't valid.
fn apply_setting(
    current: &GenerationConfig,
    catalog: &[String],
    command: ReplCommand,
) -> Result<GenerationConfig> {
    let mut next = current.clone();
    match command {
        ReplCommand::Model(model) => next.model = model,
        ReplCommand::Temperature(temperature) => next.temperature = temperature,
        ReplCommand::Length(length) => next.length = length,
        ReplCommand::System(prompt) => next.system_prompt = prompt,
        _ => return Ok(next),
    }

    let next = GenerationConfig::new(
        &next.model,
        next.temperature,
        next.length,
        &next.system_prompt,
    )?;
    next.validate_model(catalog)?;

    Ok(next)
}

fn print_settings(settings: &GenerationConfig) {
    println!("Model: {}", settings.model);
    println!("Temperature: {}", settings.temperature);
    println!("Response length: {}", settings.length.label());
    println!("System prompt: {}", settings.system_prompt);
}

fn print_history(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("{}", GREETING);
        return;
    }
    for msg in messages {
        println!("[{}] {}", msg.role(), msg.content());
    }
}

pub async fn run(config: AppConfig, options: ChatOptions) -> Result<()> {
    // Keep the terminal quiet unless RUST_LOG says otherwise
    logging::init("warn");

    let mut rl = DefaultEditor::new()?;
    let backend = OpenAiBackend::from_config(&config);
    let mut settings = initial_settings(&config, &options)?;
    let delivery = if options.no_stream {
        Delivery::Whole
    } else {
        Delivery::Streaming
    };

    let mut session = Session::new(&Uuid::new_v4().to_string());
    tracing::debug!("Started chat session {}", session.id());
    println!("{}", GREETING);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };

                match command {
                    ReplCommand::Say(text) => {
                        let result = next_turn(
                            session.history_mut(),
                            &backend,
                            &settings,
                            &text,
                            delivery,
                            |increment| {
                                print!("{}", increment);
                                let _ = io::stdout().flush();
                            },
                        )
                        .await;

                        println!();
                        if let Err(e) = result {
                            tracing::error!("Chat turn failed: {:?}", e);
                            println!("Error: {}", e);
                            println!("Try again, or check the model settings with /settings.");
                        }
                    }
                    ReplCommand::Reset => {
                        session.reset();
                        println!("{}", GREETING);
                    }
                    ReplCommand::History => print_history(session.messages()),
                    ReplCommand::Settings => print_settings(&settings),
                    ReplCommand::Help => println!("{}", HELP),
                    other => match apply_setting(&settings, &config.models, other) {
                        Ok(updated) => {
                            settings = updated;
                            print_settings(&settings);
                        }
                        Err(e) => println!("{}", e),
                    },
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
