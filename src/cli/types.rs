//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::services::DEFAULT_NUM_RESULTS;

#[derive(Parser)]
#[command(name = "rag-mcp")]
#[command(about = "Ingest plain text and retrieve similar chunks, from the shell or over MCP", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Vector store directory (overrides `database.path`)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Configuration file (default: ./rag-mcp.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest .txt files given as paths or glob patterns
    IngestFile(IngestFileArgs),

    /// Ingest a text string
    IngestText(IngestTextArgs),

    /// Retrieve the chunks most similar to a query
    Query(QueryArgs),

    /// Delete every stored chunk
    Reset,

    /// Run the MCP tool server on stdin/stdout
    Serve,
}

/// Chunking options shared by both ingest commands.
#[derive(Args, Debug, Clone)]
pub struct ChunkingArgs {
    /// Maximum tokens per chunk (defaults to, and is capped at, the model limit)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Tokens shared between consecutive chunks (default: `chunking.chunk_overlap`)
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Tags stored with every chunk
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub tags: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct IngestFileArgs {
    /// File paths or glob patterns
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Source recorded on each chunk; only honoured for a single plain path
    #[arg(long)]
    pub source_name: Option<String>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IngestTextArgs {
    /// The text to ingest
    pub text: String,

    /// Source recorded on each chunk (default: "string_input")
    #[arg(long)]
    pub source_name: Option<String>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// The query text
    pub text: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_RESULTS)]
    pub num_results: usize,
}
