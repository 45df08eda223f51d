use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use menuchat_core::ai::openai::CHAT_COMPLETIONS_URL;
use menuchat_core::config::{env_api_key, resolve_api_key};
use menuchat_core::{
    build_prompt, can_send, ChatModel, CompletionClient, JsonFileStore, Persona, PreferenceStore,
    Preferences, PromptInputs, PromptMode,
};

mod app;
mod clipboard;
mod handler;
mod tui;
mod ui;

#[cfg(test)]
mod testing;

use app::App;

/// Environment variable holding the tracing filter (e.g. `debug`, `menuchat_core=trace`)
const LOG_ENV: &str = "MENUCHAT_LOG";

#[derive(Parser)]
#[command(name = "menuchat", version)]
#[command(about = "Ask ChatGPT, reword text, or draft replies from the terminal")]
struct Cli {
    /// Response style: plain, or professor (concise, formal, content only)
    #[arg(long, global = true, default_value = "plain", value_parser = parse_persona)]
    persona: Persona,

    /// Chat-completions endpoint
    #[arg(long, global = true, env = "MENUCHAT_ENDPOINT", default_value = CHAT_COMPLETIONS_URL)]
    endpoint: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a free-form question
    Ask {
        /// The question
        text: String,
    },
    /// Reword a piece of text
    Reword {
        /// Text to reword
        text: String,
    },
    /// Draft a reply to some content
    Reply {
        /// Content to reply to
        #[arg(long)]
        to: String,
        /// Your main idea for the reply
        #[arg(long)]
        idea: String,
    },
    /// List the selectable models
    Models,
    /// Show or change saved preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the preferences file location, model, and whether a key is set
    Show,
    /// Save the OpenAI API key
    SetKey { key: String },
    /// Save the model identifier (see `menuchat models`)
    SetModel { model: String },
}

fn parse_persona(s: &str) -> Result<Persona, String> {
    Persona::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = Persona::all().iter().map(|p| p.as_str()).collect();
        format!("unknown persona '{}', expected one of: {}", s, names.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            init_logging(true)?;
            run_tui(cli.persona, cli.endpoint).await
        }
        Some(command) => {
            init_logging(false)?;
            run_command(command, cli.persona, &cli.endpoint).await
        }
    }
}

/// The TUI owns the terminal, so it logs to a file; one-shot commands log to stderr
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    if to_file {
        let log_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
            .join("menuchat");
        fs::create_dir_all(&log_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("menuchat.log"))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn open_preferences() -> Result<Preferences<Box<dyn PreferenceStore>>> {
    let path = JsonFileStore::default_path()?;
    let store = JsonFileStore::open(&path).unwrap_or_else(|err| {
        warn!(error = %err, path = %path.display(), "unreadable preferences file, starting empty");
        JsonFileStore::empty(&path)
    });
    Ok(Preferences::new(Box::new(store)))
}

async fn run_tui(persona: Persona, endpoint: String) -> Result<()> {
    let prefs = open_preferences()?;
    let client = CompletionClient::new().with_endpoint(endpoint);
    let mut app = App::new(prefs, client, persona);
    info!(persona = persona.as_str(), model = app.model.as_str(), "starting menuchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn run_command(command: Commands, persona: Persona, endpoint: &str) -> Result<()> {
    match command {
        Commands::Ask { text } => {
            send_once(PromptMode::Quick, PromptInputs::quick(text), persona, endpoint).await
        }
        Commands::Reword { text } => {
            send_once(PromptMode::Reword, PromptInputs::reword(text), persona, endpoint).await
        }
        Commands::Reply { to, idea } => {
            send_once(PromptMode::Reply, PromptInputs::reply(to, idea), persona, endpoint).await
        }
        Commands::Models => {
            let current = open_preferences()?.model();
            for model in ChatModel::all() {
                let marker = if model == current { "*" } else { " " };
                println!("{} {:<12} {}", marker, model.as_str(), model.display_name());
            }
            Ok(())
        }
        Commands::Config { action } => run_config(action),
    }
}

async fn send_once(
    mode: PromptMode,
    inputs: PromptInputs,
    persona: Persona,
    endpoint: &str,
) -> Result<()> {
    if !can_send(mode, &inputs) {
        bail!("Nothing to send: {} needs non-empty text", mode.as_str());
    }

    let prefs = open_preferences()?;
    let api_key = resolve_api_key(&prefs);
    let model = prefs.model();
    let client = CompletionClient::new().with_endpoint(endpoint);

    let prompt = build_prompt(mode, &inputs);
    let response = client
        .complete(&prompt, &api_key, model.as_str(), persona.system_instruction())
        .await?;

    println!("{}", response);
    Ok(())
}

fn run_config(action: ConfigAction) -> Result<()> {
    let mut prefs = open_preferences()?;

    match action {
        ConfigAction::Show => {
            println!("file:  {}", JsonFileStore::default_path()?.display());
            println!("model: {}", prefs.model().as_str());
            let key_source = if env_api_key().is_some() {
                "set (env)"
            } else if !prefs.api_key().is_empty() {
                "set (config)"
            } else {
                "not set"
            };
            println!("key:   {}", key_source);
        }
        ConfigAction::SetKey { key } => {
            prefs.set_api_key(key.trim())?;
            println!("API key saved");
        }
        ConfigAction::SetModel { model } => {
            let parsed = ChatModel::from_str(&model).ok_or_else(|| {
                let ids: Vec<&str> = ChatModel::all().iter().map(|m| m.as_str()).collect();
                anyhow!("unknown model '{}', expected one of: {}", model, ids.join(", "))
            })?;
            prefs.set_model(parsed)?;
            println!("Model set to {}", parsed.display_name());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_reply_with_persona() {
        let cli = Cli::try_parse_from([
            "menuchat", "--persona", "professor", "reply", "--to", "A", "--idea", "B",
        ])
        .unwrap();

        assert_eq!(cli.persona, Persona::Professor);
        match cli.command {
            Some(Commands::Reply { to, idea }) => {
                assert_eq!(to, "A");
                assert_eq!(idea, "B");
            }
            _ => panic!("expected reply command"),
        }
    }

    #[test]
    fn test_cli_defaults_to_tui() {
        let cli = Cli::try_parse_from(["menuchat"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.persona, Persona::Plain);
    }

    #[test]
    fn test_cli_rejects_unknown_persona() {
        assert!(Cli::try_parse_from(["menuchat", "--persona", "pirate", "ask", "hi"]).is_err());
    }
}
