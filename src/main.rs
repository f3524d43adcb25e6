//! rag-mcp CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use rag_mcp::cli::commands::{ingest, query, reset, serve};
use rag_mcp::cli::output::progress::create_spinner;
use rag_mcp::cli::{Cli, Commands};
use rag_mcp::infrastructure::config::ConfigLoader;
use rag_mcp::infrastructure::logging::{LogConfig, LoggerImpl};
use rag_mcp::infrastructure::setup::build_rag_service;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("{}", Cli::command().render_help());
        return ExitCode::from(2);
    };

    let json = cli.json;
    if let Err(err) = run(command, cli.db_path, cli.config, json).await {
        rag_mcp::cli::handle_error(err, json);
    }
    ExitCode::SUCCESS
}

async fn run(
    command: Commands,
    db_path: Option<std::path::PathBuf>,
    config_file: Option<std::path::PathBuf>,
    json: bool,
) -> Result<()> {
    let mut config = ConfigLoader::load(config_file.as_deref())?;
    if let Some(path) = db_path {
        config.database.path = path.display().to_string();
    }

    // Held until exit so buffered file logs are flushed.
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    let interactive = !json && !matches!(command, Commands::Serve);
    let spinner = create_spinner("Loading embedding model...", interactive);
    let service = build_rag_service(&config).await;
    spinner.finish_and_clear();
    let service = Arc::new(service?);

    let overlap = config.chunking.chunk_overlap;
    match command {
        Commands::IngestFile(args) => {
            ingest::handle_ingest_file(&service, args, overlap, json).await
        }
        Commands::IngestText(args) => {
            ingest::handle_ingest_text(&service, args, overlap, json).await
        }
        Commands::Query(args) => query::handle_query(&service, args, json).await,
        Commands::Reset => reset::handle_reset(&service, json).await,
        Commands::Serve => serve::handle_serve(service).await,
    }
}
