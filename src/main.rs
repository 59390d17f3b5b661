use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gptcomplete::commands::{self, file};
use gptcomplete::config::Config;
use gptcomplete::document::{LineBuffer, SelectionSpan};
use gptcomplete::keystore::{Credentials, FileKeyStore, KeyStore, API_KEY, ORGANIZATION_KEY};
use gptcomplete::llm::ChatClient;

#[derive(Parser)]
#[command(
    name = "gptcomplete",
    about = "Send selections or ///GPT instructions to a completion API and splice the reply back."
)]
struct Cli {
    /// Print the edited document instead of rewriting the file
    #[arg(long, global = true)]
    stdout: bool,

    /// Print a line diff of the edit
    #[arg(long, global = true)]
    diff: bool,

    /// Model to use (overrides config)
    #[arg(long, global = true)]
    model: Option<String>,

    /// API base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite each selection in place with the model's reply
    Replace {
        file: PathBuf,
        /// Selection as `line:col-line:col` (0-based, columns in characters)
        #[arg(short, long = "selection", required = true)]
        selections: Vec<SelectionSpan>,
        /// What to do with the code (defaults to a general cleanup)
        #[arg(short, long)]
        instruction: Option<String>,
    },
    /// Generate code from the selected request, inserted below it
    Create {
        file: PathBuf,
        #[arg(short, long)]
        selection: SelectionSpan,
    },
    /// Generate code for every `///GPT` instruction block
    Instruct { file: PathBuf },
    /// Manage stored credentials
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Inspect or initialise the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    SetApiKey { key: String },
    SetOrganization { organization: String },
    Show,
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

struct Output {
    stdout: bool,
    diff: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let output = Output {
        stdout: cli.stdout,
        diff: cli.diff,
    };

    match cli.command {
        Command::Replace {
            file,
            selections,
            instruction,
        } => {
            let client = completion_client(&config)?;
            let (mut doc, original) = read_document(&file)?;
            commands::replace_selection(&mut doc, &selections, &client, &config.language, instruction)
                .await?;
            finish(&file, &original, &doc, &output)
        }
        Command::Create { file, selection } => {
            let client = completion_client(&config)?;
            let (mut doc, original) = read_document(&file)?;
            commands::create_from_selection(&mut doc, &selection, &client, &config.language).await?;
            finish(&file, &original, &doc, &output)
        }
        Command::Instruct { file } => {
            let client = completion_client(&config)?;
            let (mut doc, original) = read_document(&file)?;
            let http = reqwest::Client::new();
            commands::create_from_instructions(&mut doc, &client, &http, &config.language).await?;
            finish(&file, &original, &doc, &output)
        }
        Command::Key { action } => run_key(&config, action),
        Command::Config { action } => run_config(&config, action),
    }
}

/// `RUST_LOG` when it parses, otherwise `gptcomplete=info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("gptcomplete=info"))
}

fn completion_client(config: &Config) -> Result<ChatClient> {
    let store = FileKeyStore::for_group(&config.key_group)?;
    let credentials = Credentials::load(&store, |key| std::env::var(key).ok())?;
    Ok(ChatClient::from_config(config, &credentials)?)
}

fn read_document(path: &Path) -> Result<(LineBuffer, String)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((LineBuffer::from_text(&text), text))
}

fn finish(path: &Path, original: &str, doc: &LineBuffer, output: &Output) -> Result<()> {
    let edited = doc.to_text();
    if output.diff {
        print!("{}", file::line_diff(original, &edited));
    }
    if output.stdout {
        print!("{edited}");
    } else if edited != original {
        file::write_atomically(path, &edited)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("updated {}", path.display());
    } else {
        info!("no changes to {}", path.display());
    }
    Ok(())
}

fn run_key(config: &Config, action: KeyAction) -> Result<()> {
    let mut store = FileKeyStore::for_group(&config.key_group)?;
    match action {
        KeyAction::SetApiKey { key } => {
            store.set(API_KEY, key.trim())?;
            println!("API key saved to {}", store.path().display());
        }
        KeyAction::SetOrganization { organization } => {
            store.set(ORGANIZATION_KEY, organization.trim())?;
            println!("Organization saved to {}", store.path().display());
        }
        KeyAction::Show => {
            let credentials = Credentials::load(&store, |key| std::env::var(key).ok())?;
            let api_key = credentials
                .masked_api_key()
                .unwrap_or_else(|| "(not set)".into());
            let organization = credentials
                .organization
                .unwrap_or_else(|| "(not set)".into());
            println!("group:        {}", config.key_group);
            println!("api key:      {api_key}");
            println!("organization: {organization}");
        }
    }
    Ok(())
}

fn run_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => print!("{}", serde_yaml::to_string(config)?),
        ConfigAction::Init => {
            let path = config.save().map_err(anyhow::Error::msg)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
