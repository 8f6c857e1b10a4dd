//! End-to-end wiring: services, vector store, and the three run modes.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use ai_llm_service::config::default_config::{config_gemini_chat, config_jina_embedding};
use anyhow::{Context, Result};
use colored::Colorize;
use contextor::{
    AskOptions, IndicatifProgress, NoopProgress, Progress, ResultLog, RunTally, SecureQa,
};
use rag_store::{JinaEmbedder, RagStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::settings::Settings;

pub struct RagPipeline {
    settings: Settings,
    svc: Arc<LlmServiceProfiles>,
    store: Arc<RagStore>,
}

impl RagPipeline {
    /// Builds the services and loads (or builds) the vector store.
    pub async fn setup(settings: Settings, rebuild: bool) -> Result<Self> {
        let chat = config_gemini_chat(
            &settings.model,
            settings.temperature,
            settings.llm_timeout.as_secs(),
        )?;
        let embedding = config_jina_embedding()?;
        let embed_model = embedding.model.clone();
        let svc = Arc::new(LlmServiceProfiles::new(chat, embedding)?);

        let embedder = Arc::new(JinaEmbedder::new(svc.clone()));
        let store =
            RagStore::open_or_build(settings.rag_config(), embedder, &embed_model, rebuild).await?;
        info!(chunks = store.len(), model = %settings.model, "pipeline ready");

        Ok(Self {
            settings,
            svc,
            store: Arc::new(store),
        })
    }

    fn ask_options(&self) -> AskOptions {
        AskOptions {
            top_k: self.settings.k,
            max_ctx_chars: 0,
        }
    }

    /// Basic RAG query (no guardrails) with formatted sources.
    pub async fn query(&self, question: &str, prog: &dyn Progress) -> Result<String> {
        let qa = contextor::ask(
            question,
            self.store.as_ref(),
            self.svc.as_ref(),
            self.ask_options(),
            prog,
        )
        .await?;
        Ok(qa.render())
    }

    pub fn secure(&self) -> SecureQa {
        SecureQa::new(
            self.store.clone(),
            self.svc.clone(),
            self.settings.secure_config(),
        )
    }

    /// Runs `queries` through basic RAG and writes `Question/Answer/Sources`
    /// blocks to `output`.
    pub async fn run_batch(&self, queries: &[&str], output: &Path) -> Result<()> {
        if let Some(dir) = output.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::File::create(output)
            .with_context(|| format!("cannot create {}", output.display()))?;

        for q in queries {
            let response = self.query(q, &NoopProgress).await?;
            writeln!(file, "{response}\n{}", "=".repeat(50))?;
            println!("{response}");
            println!("{}", "-".repeat(30));
        }
        Ok(())
    }

    /// Runs `queries` through the guarded pipeline, logging one block per
    /// query plus the run summary.
    pub async fn run_scenarios(&self, queries: &[&str]) -> Result<RunTally> {
        let qa = self.secure();
        let mut log = ResultLog::create(&self.settings.output_dir)?;
        let mut tally = RunTally::default();

        for (i, q) in queries.iter().enumerate() {
            println!("{}", format!("\n--- Test {}/{} ---", i + 1, queries.len()).cyan());
            let record = qa.ask_tallied(q, &mut tally).await;
            log.append(&record)?;
            println!("{}", record.render_block());
        }

        log.write_summary(&tally)?;
        println!("{}", tally.render_summary());
        Ok(tally)
    }

    /// Question loop on stdin until `exit`/`quit` or end of input.
    pub async fn interactive(&self, guarded: bool) -> Result<()> {
        let qa = guarded.then(|| self.secure());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!(
            "\n{}",
            "RAG System Initialized (Type 'exit' to quit, 'help' for instructions): ".bold()
        );
        loop {
            print!("\nEnter your question: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim_end_matches(['\r', '\n']);
            match question.trim().to_lowercase().as_str() {
                "exit" | "quit" => break,
                "help" | "?" => {
                    print_help();
                    continue;
                }
                _ => {}
            }

            match &qa {
                Some(qa) => {
                    let record = qa.ask(question).await;
                    println!("\n{}", record.answer);
                    if let Some(code) = record.error_code {
                        println!("{}", format!("[{code}]").yellow());
                    }
                }
                None => {
                    let prog = IndicatifProgress::spinner();
                    match self.query(question, &prog).await {
                        Ok(response) => println!("\n{response}"),
                        Err(e) => {
                            prog.finish();
                            println!("{} {e:#}", "Error:".red());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

pub fn print_help() {
    println!("\n{}", "How to use:".bold());
    println!("- Type your question and press Enter.");
    println!("- Type 'help' to show these instructions again.");
    println!("- Type 'exit' or 'quit' to close the app.");
    println!("- Use '--batch' to run sample queries and save results.");
    println!("- Use '--assignment3' to run secure RAG tests.");
    println!("- Use '--guarded' to answer interactive questions through the guardrails.");
    println!("\n{}", "Tips:".bold());
    println!("- Specific queries yield better answers.");
}
