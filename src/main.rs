use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lesson_slides::app::App;
use lesson_slides::models::Config;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "lesson-slides")]
#[command(about = "Convert lesson text into slide-deck JSON stored in object storage")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a slide deck from lesson text and store it.
    Convert {
        /// Title of the deck; the object is stored as `<folder>/<title>.json`.
        #[arg(short, long)]
        title: String,

        /// File containing the lesson text. Reads stdin when omitted or `-`.
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
    },
    /// Print a stored slide deck.
    Show {
        /// Title the deck was stored under.
        title: String,
    },
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lesson text from {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read lesson text from stdin")?;
            Ok(text)
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env()?;
    let app = App::new(&config).await?;

    match command {
        Command::Convert { title, input } => {
            let text = read_input(input.as_deref())?;
            let descriptor = app.convert_text_to_slides(&text, &title).await?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Command::Show { title } => {
            let document = app.fetch_slides(&title).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lesson_slides=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!("Starting lesson-slides");

    match run(args.command).await {
        Ok(()) => {
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
