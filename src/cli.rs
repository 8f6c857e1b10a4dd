//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "drive-rag")]
#[command(about = "Ask questions about the Nova Scotia Driver's Handbook")]
pub struct Cli {
    /// Run the sample queries through basic RAG and save results
    #[arg(long, conflicts_with = "assignment3")]
    pub batch: bool,

    /// Run the secure RAG test scenarios and save results
    #[arg(long)]
    pub assignment3: bool,

    /// Force rebuild of the vector store
    #[arg(long)]
    pub rebuild: bool,

    /// Route interactive questions through the guarded pipeline
    #[arg(long)]
    pub guarded: bool,

    /// Directory containing the handbook PDFs
    #[arg(long, env = "RAG_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Vector store persistence directory
    #[arg(long, env = "RAG_PERSIST_DIR", default_value = "vector_db")]
    pub persist_dir: PathBuf,

    /// Directory for results.txt
    #[arg(long, env = "RAG_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Number of retrieved chunks
    #[arg(long, env = "RAG_TOP_K", default_value_t = 3)]
    pub k: usize,

    /// Chunk size in characters
    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks
    #[arg(long, default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Chat model
    #[arg(long, env = "LLM_MODEL", default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f32,

    /// Minimum top similarity before the model is asked
    #[arg(long, default_value_t = 0.3)]
    pub retrieval_threshold: f32,

    /// Generation timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub llm_timeout_secs: u64,

    /// Word cap for answers
    #[arg(long, default_value_t = 500)]
    pub max_response_words: usize,

    /// Character cap for questions
    #[arg(long, default_value_t = 500)]
    pub max_query_chars: usize,
}
