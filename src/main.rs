mod cli;
mod pipeline;
mod scenarios;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::{Level, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::Cli;
use crate::pipeline::{RagPipeline, print_help};
use crate::scenarios::{SAMPLE_QUERIES, SECURE_TEST_QUERIES};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file when present.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(ai_llm_service::telemetry::env_filter_with_level("info", Level::INFO))
        .with(ai_llm_service::telemetry::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from(&cli);

    let errors = settings.validate();
    if !errors.is_empty() {
        println!("{}", "Configuration errors:".red().bold());
        for err in &errors {
            println!("  - {err}");
        }
        println!("\nPlease set the required environment variables (e.g., in a .env file).");
        return ExitCode::FAILURE;
    }

    let results_path = settings.results_path();
    let pipeline = match RagPipeline::setup(settings, cli.rebuild).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "initialization failed");
            println!("{} {e:#}", "Initialization error:".red());
            return ExitCode::FAILURE;
        }
    };

    let run = if cli.assignment3 {
        pipeline.run_scenarios(SECURE_TEST_QUERIES).await.map(|_| true)
    } else if cli.batch {
        println!("\nRunning batch queries...");
        pipeline
            .run_batch(SAMPLE_QUERIES, &results_path)
            .await
            .map(|_| true)
    } else {
        print_help();
        pipeline.interactive(cli.guarded).await.map(|_| false)
    };

    match run {
        Ok(saved) => {
            if saved {
                println!(
                    "\n{} {}",
                    "Results saved to".green(),
                    results_path.display()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            println!("{} {e:#}", "Error:".red());
            ExitCode::FAILURE
        }
    }
}
