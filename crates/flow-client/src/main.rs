//! `flowctl`: command-line access to the flow backend.
//!
//! ```text
//! flowctl pull --out flow.json
//! flowctl push flow.json
//! flowctl steps flow.json
//! flowctl tutorials
//! flowctl image 12
//! ```

use clap::{Parser, Subcommand};
use flow_client::{API_BASE_ENV, DEFAULT_API_BASE, FlowGateway, GatewayConfig, GatewayError};
use flow_core::config::EditorConfig;
use flow_core::persist::{FlowDocument, restore};
use flow_core::tutorial::compile_steps;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Flow editor backend client", long_about = None)]
struct Cli {
    /// Server root, e.g. http://127.0.0.1:8000
    #[arg(long, global = true, env = API_BASE_ENV, default_value = DEFAULT_API_BASE)]
    base_url: String,

    /// Tutorial page the flow belongs to
    #[arg(long, global = true, default_value = "3")]
    document: String,

    /// Editor configuration JSON (zoom limits, layout, ...)
    #[arg(long, global = true)]
    editor_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the stored flow (normalized) and print or write it
    Pull {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upload a flow document
    Push { file: PathBuf },
    /// Compile a flow document (or the stored one) into tutorial steps
    Steps { file: Option<PathBuf> },
    /// List published tutorials
    Tutorials,
    /// Resolve an image id to its download URL
    Image { id: u64 },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Document(#[from] flow_core::persist::PersistError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &PathBuf) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let editor = match &cli.editor_config {
        Some(path) => EditorConfig::from_json(&read(path)?)?,
        None => EditorConfig::default(),
    };
    let gateway = FlowGateway::new(GatewayConfig::new(cli.base_url, cli.document))?;

    match cli.command {
        Command::Pull { out } => {
            let (graph, viewport, source) = gateway.load(&editor).await?;
            log::info!("pulled flow {} ({source:?})", gateway.config().document_id);
            let json = FlowDocument::capture(&graph, &viewport).to_json()?;
            match out {
                Some(path) => std::fs::write(&path, json).map_err(|source| CliError::Io { path, source })?,
                None => println!("{json}"),
            }
        }
        Command::Push { file } => {
            let document = FlowDocument::from_json(&read(&file)?)?;
            let receipt = gateway.save(&document).await?;
            println!("{}", receipt.user_message());
            if let Some(message) = receipt.server_message {
                log::info!("server: {message}");
            }
        }
        Command::Steps { file } => {
            let graph = match file {
                Some(path) => restore(Some(&read(&path)?), &editor).0,
                None => gateway.load(&editor).await?.0,
            };
            let steps = compile_steps(&graph);
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }
        Command::Tutorials => {
            let tutorials = gateway.tutorials().await?;
            if tutorials.is_empty() {
                println!("No Tutorials Found");
            }
            for t in tutorials {
                println!("{:>5}  {}  ({} steps)", t.id, t.title, t.steps.len());
            }
        }
        Command::Image { id } => {
            let meta = gateway.image_meta(id).await?;
            println!("{}\t{}", meta.title, meta.url);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Gateway(err)) => {
            log::error!("{err}");
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
