//! smartsum CLI - AI document summarisation from the terminal
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use smartsum::app::{Action, App};
use smartsum::summary::SummaryMode;
use smartsum::{logging, ui, ApiClient, Config, Document};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smartsum")]
#[command(author, version, about = "TUI client for AI document summarisation", long_about = None)]
struct Cli {
    /// Summarisation service URL (overrides smartsum.toml and SMARTSUM_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive TUI (default)
    Tui {
        /// Document to summarise on startup
        file: Option<PathBuf>,
    },
    /// Summarise a document
    Summarize {
        /// PDF, TXT or DOCX file
        file: PathBuf,
        /// Verbosity of the summary
        #[arg(short, long, value_enum)]
        mode: Option<SummaryMode>,
        /// Length hint forwarded to the service
        #[arg(long)]
        max_length: Option<u32>,
        /// Also write the summary to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarise text given as an argument, on stdin, or in $EDITOR
    Text {
        text: Option<String>,
        #[arg(short, long, value_enum)]
        mode: Option<SummaryMode>,
        #[arg(long)]
        max_length: Option<u32>,
    },
    /// Upload a document and report the extracted text
    Upload {
        file: PathBuf,
        /// Print the extracted text
        #[arg(long)]
        show_text: bool,
    },
    /// Summarise a document, then answer follow-up questions
    Ask {
        file: PathBuf,
        #[arg(short, long, value_enum)]
        mode: Option<SummaryMode>,
    },
    /// Check that the summarisation service is reachable
    Health,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.override_api_url(cli.api_url);
    let client = ApiClient::new(&config.api.base_url)
        .with_context(|| format!("bad service URL {:?}", config.api.base_url))?;

    match cli.command {
        None | Some(Commands::Tui { file: None }) => {
            logging::init_file(&config)?;
            ui::run(App::from_config(&config), client, None).await?;
        }
        Some(Commands::Tui { file: Some(path) }) => {
            logging::init_file(&config)?;
            let document = Document::open(&path)?;
            ui::run(App::from_config(&config), client, Some(document)).await?;
        }
        Some(Commands::Summarize {
            file,
            mode,
            max_length,
            output,
        }) => {
            logging::init_stderr(&config);
            let document = Document::open(&file)?;
            let mode = mode.unwrap_or(config.summary.mode);
            let max_length = max_length.or(config.summary.max_length);

            println!("Summarising {} ({})...\n", document.name, mode);
            let response = client
                .summarize_document(&document, mode, max_length)
                .await
                .context("summarisation failed")?;

            println!("{}\n", format!("=== {} ===", document.name).bold());
            println!("{}\n", response.summary);
            println!("📊 {}", response.metrics_line().dimmed());

            if let Some(path) = output {
                std::fs::write(&path, format!("{}\n", response.summary))
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("💾 Saved to {}", path.display());
            }
        }
        Some(Commands::Text {
            text,
            mode,
            max_length,
        }) => {
            logging::init_stderr(&config);
            let text = match text {
                Some(text) => text,
                None if !atty::is(atty::Stream::Stdin) => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
                None => edit::edit("")?,
            };
            if text.trim().is_empty() {
                bail!("no text to summarise");
            }

            let mode = mode.unwrap_or(config.summary.mode);
            let response = client
                .summarize_text(&text, mode, max_length.or(config.summary.max_length))
                .await
                .context("summarisation failed")?;

            println!("{}\n", response.summary);
            println!("📊 {}", response.metrics_line().dimmed());
        }
        Some(Commands::Upload { file, show_text }) => {
            logging::init_stderr(&config);
            let document = Document::open(&file)?;
            let response = client
                .upload_document(&document)
                .await
                .context("upload failed")?;

            println!("✅ {}", response.message.green());
            println!("   File:      {}", response.filename);
            println!("   Size:      {} bytes", response.file_size);
            println!("   Extracted: {} characters", response.text_length);
            if show_text {
                println!("\n{}", response.extracted_text);
            }
        }
        Some(Commands::Ask { file, mode }) => {
            logging::init_stderr(&config);
            let document = Document::open(&file)?;
            let mut app = App::from_config(&config);
            if let Some(mode) = mode {
                app.update(Action::ChangeMode(mode));
            }
            ask(&mut app, &client, document).await?;
        }
        Some(Commands::Health) => {
            logging::init_stderr(&config);
            match client.health_check().await {
                Ok(status) if status.is_healthy() => {
                    println!("● {} at {}", status.service.green(), client.base_url());
                }
                Ok(status) => bail!("{} reports status {:?}", status.service, status.status),
                Err(e) => bail!("{} ({})", e, client.base_url()),
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "smartsum", &mut io::stdout());
        }
    }

    Ok(())
}

/// Summarise `document`, then answer questions until an empty line.
async fn ask(app: &mut App, client: &ApiClient, document: Document) -> anyhow::Result<()> {
    println!("Summarising {} ({})...\n", document.name, app.mode());
    app.settle(client, Action::SelectFile(document)).await;

    let summary = app.summary().unwrap_or_default();
    if summary.starts_with("Error:") {
        bail!("{}", summary.trim_start_matches("Error:").trim());
    }
    println!("{}\n", summary);

    loop {
        let question: String = Input::new()
            .with_prompt("Question (empty to quit)")
            .allow_empty(true)
            .interact_text()?;
        if question.trim().is_empty() {
            break;
        }

        let before = app.summary().map(str::len).unwrap_or_default();
        app.settle(client, Action::SubmitQuery(question)).await;

        if let Some(alert) = app.alert() {
            eprintln!("{}", alert.red());
            app.update(Action::DismissAlert);
            continue;
        }
        if let Some(summary) = app.summary() {
            println!("{}\n", summary[before..].trim_start());
        }
    }

    Ok(())
}
